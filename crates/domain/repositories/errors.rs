//! Storage conflicts that use cases react to. They travel inside
//! `anyhow::Error` and are recovered with `downcast_ref`.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::enums::member_statuses::MemberStatus;

/// The partial unique index on active member IDs rejected the write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("member id {member_id:?} is already held by an active member")]
pub struct MemberIdTaken {
    pub member_id: Option<i32>,
}

/// The member changed status between read and write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("member {member_uuid} is no longer {expected}")]
pub struct MemberStatusConflict {
    pub member_uuid: Uuid,
    pub expected: MemberStatus,
}

/// The member row no longer matches the values a write was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("member {member_uuid} changed since it was read")]
pub struct MemberChanged {
    pub member_uuid: Uuid,
}

pub fn is_member_id_taken(err: &anyhow::Error) -> bool {
    err.downcast_ref::<MemberIdTaken>().is_some()
}
