use std::{env, str::FromStr};

use anyhow::{Context, Result};
use crates::domain::value_objects::lifecycle::DEFAULT_GRACE_PERIOD_DAYS;

use super::{
    config_model::{Admin, BackendServer, Database, DotEnvyConfig, Membership},
    stage::Stage,
};

const DEFAULT_MEMBER_ID_SUGGESTION_COUNT: usize = 5;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?,
        body_limit: required("SERVER_BODY_LIMIT")?,
        timeout: required("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
    };

    let membership = Membership {
        grace_period_days: optional("MEMBERSHIP_GRACE_PERIOD_DAYS")?
            .unwrap_or(DEFAULT_GRACE_PERIOD_DAYS),
        member_id_suggestion_count: optional("MEMBER_ID_SUGGESTION_COUNT")?
            .unwrap_or(DEFAULT_MEMBER_ID_SUGGESTION_COUNT),
    };

    let admin = Admin {
        api_token: env::var("ADMIN_API_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        membership,
        admin,
        stage: get_stage(),
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = env::var("STAGE").unwrap_or_default();
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn required<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .with_context(|| format!("{key} is invalid"))?
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} is invalid"))
}

fn optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} is invalid")),
        _ => Ok(None),
    }
}
