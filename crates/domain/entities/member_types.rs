use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::member_types;

/// Name of the lifetime tier, which never takes dues payments.
pub const LIFE_MEMBER_TYPE: &str = "Life";

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = member_types)]
pub struct MemberTypeEntity {
    pub id: Uuid,
    pub name: String,
    pub dues_minor: i32,
    pub coverage_months: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl MemberTypeEntity {
    pub fn is_life(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case(LIFE_MEMBER_TYPE)
    }
}
