use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::member_statuses::MemberStatus,
    infra::db::postgres::schema::members,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = members, primary_key(member_uuid))]
pub struct MemberEntity {
    pub member_uuid: Uuid,
    pub member_id: Option<i32>,
    pub preferred_member_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub member_type_id: Uuid,
    pub status: String,
    pub expiration_date: NaiveDate,
    pub milestone_date: Option<NaiveDate>,
    pub date_joined: NaiveDate,
    pub date_inactivated: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub home_city: Option<String>,
    pub home_state: Option<String>,
    pub home_zip: Option<String>,
    pub home_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberEntity {
    /// Unknown stored values are treated as inactive so they never hold an ID.
    pub fn status(&self) -> MemberStatus {
        MemberStatus::from_str(&self.status).unwrap_or(MemberStatus::Inactive)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = members)]
pub struct InsertMemberEntity {
    pub member_uuid: Uuid,
    pub member_id: Option<i32>,
    pub preferred_member_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub member_type_id: Uuid,
    pub status: String,
    pub expiration_date: NaiveDate,
    pub milestone_date: Option<NaiveDate>,
    pub date_joined: NaiveDate,
    pub home_address: Option<String>,
    pub home_city: Option<String>,
    pub home_state: Option<String>,
    pub home_zip: Option<String>,
    pub home_phone: Option<String>,
}

/// Editable member fields. `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = members)]
pub struct UpdateMemberEntity {
    pub member_id: Option<Option<i32>>,
    pub preferred_member_id: Option<Option<i32>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Option<String>>,
    pub member_type_id: Option<Uuid>,
    pub expiration_date: Option<NaiveDate>,
    pub milestone_date: Option<Option<NaiveDate>>,
    pub home_address: Option<Option<String>>,
    pub home_city: Option<Option<String>>,
    pub home_state: Option<Option<String>>,
    pub home_zip: Option<Option<String>>,
    pub home_phone: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}
