use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::members::MemberEntity,
    value_objects::{
        enums::{letter_ranges::LetterRange, member_statuses::MemberStatus},
        member_id_pool::MemberIdPoolStatus,
    },
};

/// Initial payment taken while signing up a new member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialPaymentModel {
    pub payment_method_id: Uuid,
    pub amount: String,
    pub receipt_number: String,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMemberModel {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub member_type_id: Uuid,
    /// Explicit recyclable ID; the lowest free one is assigned when absent.
    pub member_id: Option<i32>,
    pub milestone_date: Option<NaiveDate>,
    pub date_joined: Option<NaiveDate>,
    /// Month the membership starts counting from; defaults to today.
    pub start_date: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub home_city: Option<String>,
    pub home_state: Option<String>,
    pub home_zip: Option<String>,
    pub home_phone: Option<String>,
    pub initial_payment: Option<InitialPaymentModel>,
    pub expiration_override: Option<NaiveDate>,
}

/// Full replacement of the editable fields of an active member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateMemberModel {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub member_type_id: Uuid,
    pub member_id: i32,
    pub milestone_date: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub home_city: Option<String>,
    pub home_state: Option<String>,
    pub home_zip: Option<String>,
    pub home_phone: Option<String>,
    pub expiration_override: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemberSearchFilter {
    pub query: Option<String>,
    pub status: Option<MemberStatus>,
    pub browse: Option<LetterRange>,
    #[serde(default)]
    pub exclude_deceased: bool,
}

impl MemberSearchFilter {
    /// A numeric query searches by recyclable member ID instead of by name.
    pub fn member_id_query(&self) -> Option<i32> {
        self.query
            .as_deref()
            .and_then(|query| query.trim().parse::<i32>().ok())
    }

    pub fn name_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty() && query.parse::<i32>().is_err())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MemberDto {
    pub member_uuid: Uuid,
    pub member_id: Option<i32>,
    pub preferred_member_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: Option<String>,
    pub member_type_id: Uuid,
    pub status: MemberStatus,
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

impl From<MemberEntity> for MemberDto {
    fn from(value: MemberEntity) -> Self {
        let status = value.status();
        let full_name = value.full_name();

        Self {
            member_uuid: value.member_uuid,
            member_id: value.member_id,
            preferred_member_id: value.preferred_member_id,
            first_name: value.first_name,
            last_name: value.last_name,
            full_name,
            email: value.email,
            member_type_id: value.member_type_id,
            status,
            expiration_date: value.expiration_date,
            milestone_date: value.milestone_date,
            date_joined: value.date_joined,
            date_inactivated: value.date_inactivated,
            home_address: value.home_address,
            home_city: value.home_city,
            home_state: value.home_state,
            home_zip: value.home_zip,
            home_phone: value.home_phone,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreatedMemberDto {
    pub member: MemberDto,
    pub initial_payment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SuggestedMemberIdsDto {
    pub next_member_id: Option<i32>,
    pub suggested_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MemberIdAvailabilityDto {
    pub member_id: i32,
    pub available: bool,
}

pub type MemberIdPoolStatusDto = MemberIdPoolStatus;

/// Members picked by staff for a batch lifecycle action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemberSelectionModel {
    pub member_uuids: Vec<Uuid>,
}

/// Active member past the grace period with no payment after expiration.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiredMemberModel {
    pub member: MemberEntity,
    pub last_payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeactivationCandidateDto {
    pub member: MemberDto,
    pub days_expired: i64,
    pub last_payment_date: Option<NaiveDate>,
}

/// Result of one member inside a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberOutcome {
    pub member_uuid: Uuid,
    pub member_name: Option<String>,
    pub succeeded: bool,
    /// Recyclable ID released (deactivation) or granted (reinstatement).
    pub member_id: Option<i32>,
    pub message: String,
}

impl MemberOutcome {
    pub fn succeeded(
        member_uuid: Uuid,
        member_name: String,
        member_id: Option<i32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            member_uuid,
            member_name: Some(member_name),
            succeeded: true,
            member_id,
            message: message.into(),
        }
    }

    pub fn failed(member_uuid: Uuid, member_name: Option<String>, message: impl Into<String>) -> Self {
        Self {
            member_uuid,
            member_name,
            succeeded: false,
            member_id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeactivationReport {
    pub cutoff_date: NaiveDate,
    pub grace_period_days: i64,
    pub dry_run: bool,
    pub candidates: usize,
    pub deactivated: usize,
    pub failed: usize,
    pub recycled_ids: Vec<i32>,
    pub outcomes: Vec<MemberOutcome>,
    pub pool_status: MemberIdPoolStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReinstatementDto {
    pub member_uuid: Uuid,
    pub member_name: String,
    pub member_id: i32,
    pub preferred_member_id: Option<i32>,
    pub restored_preferred: bool,
    pub dry_run: bool,
}
