use chrono::{Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::domain::value_objects::{
    enums::member_statuses::MemberStatus, member_id_pool::MemberIdPool,
};

pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 90;

/// Members whose expiration falls strictly before this date are past the grace period.
pub fn deactivation_cutoff(today: NaiveDate, grace_period_days: i64) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(grace_period_days.max(0)))
        .unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeactivationIneligibility {
    #[error("member is {0}; only active members can be deactivated")]
    NotActive(MemberStatus),
    #[error("member is not expired {grace_period_days}+ days (expiration {expiration_date})")]
    NotExpiredLongEnough {
        expiration_date: NaiveDate,
        grace_period_days: i64,
    },
    #[error("member has a payment after expiration (paid {payment_date})")]
    PaidAfterExpiration { payment_date: NaiveDate },
}

/// A member may be deactivated only while active, past the grace period, and
/// without any payment dated after their expiration.
pub fn check_deactivation_eligibility(
    status: MemberStatus,
    expiration_date: NaiveDate,
    last_payment_after_expiration: Option<NaiveDate>,
    today: NaiveDate,
    grace_period_days: i64,
) -> Result<(), DeactivationIneligibility> {
    if status != MemberStatus::Active {
        return Err(DeactivationIneligibility::NotActive(status));
    }

    if expiration_date >= deactivation_cutoff(today, grace_period_days) {
        return Err(DeactivationIneligibility::NotExpiredLongEnough {
            expiration_date,
            grace_period_days,
        });
    }

    match last_payment_after_expiration {
        Some(payment_date) if payment_date > expiration_date => {
            Err(DeactivationIneligibility::PaidAfterExpiration { payment_date })
        }
        _ => Ok(()),
    }
}

/// Recyclable ID bookkeeping when a member stops being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRelease {
    pub released_member_id: Option<i32>,
    pub preferred_member_id: Option<i32>,
}

pub fn release_member_id(member_id: Option<i32>, preferred_member_id: Option<i32>) -> IdRelease {
    match member_id {
        Some(released) => IdRelease {
            released_member_id: Some(released),
            preferred_member_id: Some(released),
        },
        None => IdRelease {
            released_member_id: None,
            preferred_member_id,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactivationGrant {
    pub member_id: i32,
    pub restored_preferred: bool,
}

/// Offers the member's preferred ID back when nobody active holds it,
/// otherwise the lowest free ID. `None` means the pool is exhausted.
pub fn grant_reactivation_id(
    preferred_member_id: Option<i32>,
    pool: &MemberIdPool,
) -> Option<ReactivationGrant> {
    if let Some(preferred) = preferred_member_id.filter(|id| pool.is_available(*id)) {
        return Some(ReactivationGrant {
            member_id: preferred,
            restored_preferred: true,
        });
    }

    pool.next_available_id().map(|member_id| ReactivationGrant {
        member_id,
        restored_preferred: false,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTransition {
    pub from: MemberStatus,
    pub to: MemberStatus,
}
