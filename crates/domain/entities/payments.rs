use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payments;

/// Payments reference the permanent `member_uuid`, never the recyclable member ID.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub member_uuid: Uuid,
    pub payment_method_id: Uuid,
    pub amount_minor: i32,
    pub date: NaiveDate,
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub member_uuid: Uuid,
    pub payment_method_id: Uuid,
    pub amount_minor: i32,
    pub date: NaiveDate,
    pub receipt_number: String,
}
