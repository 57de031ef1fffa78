use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_methods::PaymentMethodEntity,
        repositories::payment_methods::PaymentMethodRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_methods},
};

pub struct PaymentMethodPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentMethodPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentMethodRepository for PaymentMethodPostgres {
    async fn find_by_id(&self, payment_method_id: Uuid) -> Result<Option<PaymentMethodEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<PaymentMethodEntity>> {
            let mut conn = db_pool.get()?;

            let result = payment_methods::table
                .find(payment_method_id)
                .select(PaymentMethodEntity::as_select())
                .first::<PaymentMethodEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await?
    }

    async fn list_active_payment_methods(&self) -> Result<Vec<PaymentMethodEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<PaymentMethodEntity>> {
            let mut conn = db_pool.get()?;

            let result = payment_methods::table
                .filter(payment_methods::is_active.eq(true))
                .select(PaymentMethodEntity::as_select())
                .order(payment_methods::name.asc())
                .load::<PaymentMethodEntity>(&mut conn)?;

            Ok(result)
        })
        .await?
    }
}
