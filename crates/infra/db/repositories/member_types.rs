use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::member_types::MemberTypeEntity,
        repositories::member_types::MemberTypeRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::member_types},
};

pub struct MemberTypePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MemberTypePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MemberTypeRepository for MemberTypePostgres {
    async fn find_by_id(&self, member_type_id: Uuid) -> Result<Option<MemberTypeEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<MemberTypeEntity>> {
            let mut conn = db_pool.get()?;

            let result = member_types::table
                .find(member_type_id)
                .select(MemberTypeEntity::as_select())
                .first::<MemberTypeEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await?
    }

    async fn list_active_member_types(&self) -> Result<Vec<MemberTypeEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<MemberTypeEntity>> {
            let mut conn = db_pool.get()?;

            let result = member_types::table
                .filter(member_types::is_active.eq(true))
                .select(MemberTypeEntity::as_select())
                .order(member_types::name.asc())
                .load::<MemberTypeEntity>(&mut conn)?;

            Ok(result)
        })
        .await?
    }
}
