use std::sync::Arc;

use anyhow::Result as AnyResult;
use crates::domain::{
    repositories::members::MemberRepository,
    value_objects::{
        member_id_pool::{MAX_MEMBER_ID, MIN_MEMBER_ID, MemberIdPool, is_in_range},
        members::{MemberIdAvailabilityDto, MemberIdPoolStatusDto, SuggestedMemberIdsDto},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum MemberIdError {
    #[error("member ID {0} is outside {min}..={max}", min = MIN_MEMBER_ID, max = MAX_MEMBER_ID)]
    OutOfRange(i32),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MemberIdError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MemberIdError::OutOfRange(_) => StatusCode::BAD_REQUEST,
            MemberIdError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, MemberIdError>;

/// Granted IDs are re-suggested this many times when a concurrent write
/// takes the same ID.
pub const MAX_MEMBER_ID_ATTEMPTS: usize = 3;

/// Snapshot of the IDs held by active members right now.
pub async fn load_member_id_pool<M>(member_repository: &M) -> AnyResult<MemberIdPool>
where
    M: MemberRepository + Send + Sync,
{
    let active_ids = member_repository.list_active_member_ids().await.map_err(|err| {
        error!(db_error = ?err, "member_ids: failed to load active member ids");
        err
    })?;
    Ok(MemberIdPool::from_active_ids(active_ids))
}

pub struct MemberIdUseCase<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    member_repository: Arc<M>,
    suggestion_count: usize,
}

impl<M> MemberIdUseCase<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    pub fn new(member_repository: Arc<M>, suggestion_count: usize) -> Self {
        Self {
            member_repository,
            suggestion_count,
        }
    }

    pub async fn suggest_member_ids(&self) -> UseCaseResult<SuggestedMemberIdsDto> {
        let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
        let suggested_ids = pool.suggested_ids(self.suggestion_count);

        if suggested_ids.is_empty() {
            warn!("member_ids: no member ids available");
        }

        Ok(SuggestedMemberIdsDto {
            next_member_id: suggested_ids.first().copied(),
            suggested_ids,
        })
    }

    pub async fn check_availability(&self, member_id: i32) -> UseCaseResult<MemberIdAvailabilityDto> {
        if !is_in_range(member_id) {
            return Err(MemberIdError::OutOfRange(member_id));
        }

        let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
        Ok(MemberIdAvailabilityDto {
            member_id,
            available: pool.is_available(member_id),
        })
    }

    pub async fn pool_status(&self) -> UseCaseResult<MemberIdPoolStatusDto> {
        let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
        let status = pool.status();

        if status.low_pool_warning {
            warn!(
                available_ids = status.available_ids,
                active_members = status.active_members,
                "member_ids: member id pool is running low"
            );
        } else {
            info!(
                available_ids = status.available_ids,
                "member_ids: member id pool status computed"
            );
        }

        Ok(status)
    }
}
