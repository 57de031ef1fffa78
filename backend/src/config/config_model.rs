use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub membership: Membership,
    pub admin: Admin,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Membership {
    pub grace_period_days: i64,
    pub member_id_suggestion_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Admin {
    /// Admin lifecycle endpoints are disabled while unset.
    pub api_token: Option<String>,
}
