use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{dsl::count_star, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::payments::{InsertPaymentEntity, PaymentEntity},
        repositories::{errors::MemberChanged, payments::PaymentRepository},
        value_objects::{
            enums::member_statuses::MemberStatus,
            payments::{MemberPaymentUpdate, PaymentHistoryFilter},
        },
    },
    infra::db::postgres::{
        conflicts::map_member_id_conflict,
        postgres_connection::PgPoolSquad,
        schema::{members, payments},
    },
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn record_payment(
        &self,
        payment: InsertPaymentEntity,
        member_update: MemberPaymentUpdate,
    ) -> Result<Uuid> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Uuid> {
            let mut conn = db_pool.get()?;
            let now = Utc::now();

            conn.transaction::<Uuid, anyhow::Error, _>(|tx| {
                let payment_id = insert_into(payments::table)
                    .values(&payment)
                    .returning(payments::id)
                    .get_result::<Uuid>(tx)?;

                // Matches only the row the renewal was computed from.
                let target = members::table
                    .filter(members::member_uuid.eq(member_update.member_uuid))
                    .filter(members::expiration_date.eq(member_update.previous_expiration));

                let updated = match member_update.reactivate_with_member_id {
                    Some(member_id) => update(
                        target.filter(members::status.eq(MemberStatus::Inactive.as_str())),
                    )
                    .set((
                        members::status.eq(MemberStatus::Active.as_str()),
                        members::member_id.eq(Some(member_id)),
                        members::preferred_member_id.eq(Some(member_id)),
                        members::date_inactivated.eq(None::<chrono::NaiveDate>),
                        members::expiration_date.eq(member_update.new_expiration),
                        members::updated_at.eq(now),
                    ))
                    .execute(tx)
                    .map_err(|err| map_member_id_conflict(err, Some(member_id)))?,
                    None => update(
                        target.filter(members::status.eq(MemberStatus::Active.as_str())),
                    )
                    .set((
                        members::expiration_date.eq(member_update.new_expiration),
                        members::updated_at.eq(now),
                    ))
                    .execute(tx)?,
                };

                if updated == 0 {
                    return Err(MemberChanged {
                        member_uuid: member_update.member_uuid,
                    }
                    .into());
                }

                Ok(payment_id)
            })
        })
        .await?
    }

    async fn list_member_payments(
        &self,
        member_uuid: Uuid,
        filter: PaymentHistoryFilter,
    ) -> Result<(Vec<PaymentEntity>, i64)> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<(Vec<PaymentEntity>, i64)> {
            let mut conn = db_pool.get()?;

            let mut count_query = payments::table
                .filter(payments::member_uuid.eq(member_uuid))
                .select(count_star())
                .into_boxed();
            let mut page_query = payments::table
                .filter(payments::member_uuid.eq(member_uuid))
                .select(PaymentEntity::as_select())
                .into_boxed();

            if let Some(start_date) = filter.start_date {
                count_query = count_query.filter(payments::date.ge(start_date));
                page_query = page_query.filter(payments::date.ge(start_date));
            }
            if let Some(end_date) = filter.end_date {
                count_query = count_query.filter(payments::date.le(end_date));
                page_query = page_query.filter(payments::date.le(end_date));
            }

            let total = count_query.first::<i64>(&mut conn)?;
            let page = page_query
                .order((payments::date.desc(), payments::created_at.desc()))
                .limit(filter.page_size())
                .offset(filter.offset())
                .load::<PaymentEntity>(&mut conn)?;

            Ok((page, total))
        })
        .await?
    }
}
