use std::sync::Arc;

use chrono::NaiveDate;
use crates::domain::{
    entities::members::MemberEntity,
    repositories::{
        errors::{MemberStatusConflict, is_member_id_taken},
        members::MemberRepository,
    },
    value_objects::{
        enums::member_statuses::MemberStatus,
        lifecycle::{deactivation_cutoff, grant_reactivation_id},
        members::{
            DeactivationCandidateDto, DeactivationReport, MemberDto, MemberOutcome, ReinstatementDto,
        },
        membership_dates::days_expired,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::member_ids::{MAX_MEMBER_ID_ATTEMPTS, load_member_id_pool};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Validation(String),
    #[error("member not found")]
    MemberNotFound,
    #[error("member is {actual}; expected {expected}")]
    WrongStatus {
        expected: MemberStatus,
        actual: MemberStatus,
    },
    #[error("{0}")]
    NotEligible(String),
    #[error("no member IDs available")]
    NoMemberIdsAvailable,
    #[error("member changed concurrently, please retry")]
    Conflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LifecycleError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LifecycleError::Validation(_) => StatusCode::BAD_REQUEST,
            LifecycleError::MemberNotFound => StatusCode::NOT_FOUND,
            LifecycleError::WrongStatus { .. }
            | LifecycleError::NotEligible(_)
            | LifecycleError::NoMemberIdsAvailable
            | LifecycleError::Conflict => StatusCode::CONFLICT,
            LifecycleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, LifecycleError>;

pub struct LifecycleUseCase<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    member_repository: Arc<M>,
}

impl<M> LifecycleUseCase<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    pub fn new(member_repository: Arc<M>) -> Self {
        Self { member_repository }
    }

    /// Active members past the grace period with no payment after expiration,
    /// most expired first.
    pub async fn list_deactivation_candidates(
        &self,
        today: NaiveDate,
        grace_period_days: i64,
    ) -> UseCaseResult<Vec<DeactivationCandidateDto>> {
        let cutoff = deactivation_cutoff(today, grace_period_days);
        let expired = self
            .member_repository
            .list_expired_without_payment(cutoff)
            .await
            .map_err(|err| {
                error!(%cutoff, db_error = ?err, "lifecycle: failed to list expired members");
                err
            })?;

        let mut candidates: Vec<DeactivationCandidateDto> = expired
            .into_iter()
            .map(|expired| DeactivationCandidateDto {
                days_expired: days_expired(expired.member.expiration_date, today),
                last_payment_date: expired.last_payment_date,
                member: MemberDto::from(expired.member),
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.days_expired
                .cmp(&a.days_expired)
                .then_with(|| a.member.last_name.cmp(&b.member.last_name))
        });

        Ok(candidates)
    }

    pub async fn deactivate_expired_members(
        &self,
        today: NaiveDate,
        grace_period_days: i64,
        dry_run: bool,
    ) -> UseCaseResult<DeactivationReport> {
        let candidates = self
            .list_deactivation_candidates(today, grace_period_days)
            .await?;
        let candidate_count = candidates.len();

        info!(
            candidates = candidate_count,
            grace_period_days,
            dry_run,
            "lifecycle: deactivating expired members"
        );

        let outcomes = if dry_run {
            candidates
                .into_iter()
                .map(|candidate| {
                    let message = match candidate.member.member_id {
                        Some(member_id) => format!(
                            "Would deactivate ({} days expired); member ID {member_id} would be released",
                            candidate.days_expired
                        ),
                        None => format!("Would deactivate ({} days expired)", candidate.days_expired),
                    };
                    MemberOutcome::succeeded(
                        candidate.member.member_uuid,
                        candidate.member.full_name,
                        candidate.member.member_id,
                        message,
                    )
                })
                .collect::<Vec<_>>()
        } else if candidates.is_empty() {
            Vec::new()
        } else {
            let member_uuids = candidates
                .iter()
                .map(|candidate| candidate.member.member_uuid)
                .collect();
            self.member_repository
                .deactivate_members(member_uuids, today, grace_period_days)
                .await?
        };

        let recycled_ids: Vec<i32> = outcomes
            .iter()
            .filter(|outcome| outcome.succeeded)
            .filter_map(|outcome| outcome.member_id)
            .collect();
        let succeeded = outcomes.iter().filter(|outcome| outcome.succeeded).count();
        let failed = outcomes.len() - succeeded;
        let pool_status = load_member_id_pool(self.member_repository.as_ref())
            .await?
            .status();

        if failed > 0 {
            warn!(failed, "lifecycle: some members could not be deactivated");
        }
        info!(
            deactivated = if dry_run { 0 } else { succeeded },
            failed,
            recycled = recycled_ids.len(),
            available_ids = pool_status.available_ids,
            dry_run,
            "lifecycle: expired member deactivation finished"
        );

        Ok(DeactivationReport {
            cutoff_date: deactivation_cutoff(today, grace_period_days),
            grace_period_days,
            dry_run,
            candidates: candidate_count,
            deactivated: if dry_run { 0 } else { succeeded },
            failed,
            recycled_ids,
            outcomes,
            pool_status,
        })
    }

    /// Deactivates an explicit selection; eligibility is re-checked per member.
    pub async fn deactivate_selected(
        &self,
        member_uuids: Vec<Uuid>,
        today: NaiveDate,
        grace_period_days: i64,
    ) -> UseCaseResult<Vec<MemberOutcome>> {
        if member_uuids.is_empty() {
            return Err(LifecycleError::Validation("No members selected".to_string()));
        }

        let outcomes = self
            .member_repository
            .deactivate_members(member_uuids, today, grace_period_days)
            .await?;

        info!(
            requested = outcomes.len(),
            deactivated = outcomes.iter().filter(|outcome| outcome.succeeded).count(),
            "lifecycle: selected members processed"
        );
        Ok(outcomes)
    }

    pub async fn deactivate_member(
        &self,
        member_uuid: Uuid,
        today: NaiveDate,
        grace_period_days: i64,
    ) -> UseCaseResult<MemberOutcome> {
        let member = self.find_member(member_uuid).await?;
        let status = member.status();
        if status != MemberStatus::Active {
            return Err(LifecycleError::WrongStatus {
                expected: MemberStatus::Active,
                actual: status,
            });
        }

        let outcome = self
            .member_repository
            .deactivate_members(vec![member_uuid], today, grace_period_days)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("deactivation returned no outcome for {member_uuid}"))?;

        if !outcome.succeeded {
            return Err(LifecycleError::NotEligible(outcome.message));
        }

        info!(%member_uuid, released_member_id = ?outcome.member_id, "lifecycle: member deactivated");
        Ok(outcome)
    }

    /// Returns an inactive member to active, restoring the preferred ID when free.
    pub async fn reactivate_member(
        &self,
        member_uuid: Uuid,
        dry_run: bool,
    ) -> UseCaseResult<ReinstatementDto> {
        let member = self.find_member(member_uuid).await?;
        let status = member.status();
        if status != MemberStatus::Inactive {
            return Err(LifecycleError::WrongStatus {
                expected: MemberStatus::Inactive,
                actual: status,
            });
        }

        for attempt in 1..=MAX_MEMBER_ID_ATTEMPTS {
            let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
            let grant = grant_reactivation_id(member.preferred_member_id, &pool).ok_or_else(|| {
                warn!(%member_uuid, "lifecycle: no member id available for reinstatement");
                LifecycleError::NoMemberIdsAvailable
            })?;

            let reinstatement = ReinstatementDto {
                member_uuid,
                member_name: member.full_name(),
                member_id: grant.member_id,
                preferred_member_id: member.preferred_member_id,
                restored_preferred: grant.restored_preferred,
                dry_run,
            };
            if dry_run {
                return Ok(reinstatement);
            }

            match self
                .member_repository
                .reactivate_member(member_uuid, grant.member_id)
                .await
            {
                Ok(_) => {
                    info!(
                        %member_uuid,
                        member_id = grant.member_id,
                        restored_preferred = grant.restored_preferred,
                        "lifecycle: member reinstated"
                    );
                    return Ok(reinstatement);
                }
                Err(err) if is_member_id_taken(&err) => {
                    warn!(
                        %member_uuid,
                        member_id = grant.member_id,
                        attempt,
                        "lifecycle: granted member id taken concurrently, retrying"
                    );
                }
                Err(err) if err.downcast_ref::<MemberStatusConflict>().is_some() => {
                    warn!(%member_uuid, error = %err, "lifecycle: reinstatement lost a race");
                    return Err(LifecycleError::Conflict);
                }
                Err(err) => {
                    error!(%member_uuid, db_error = ?err, "lifecycle: failed to reinstate member");
                    return Err(LifecycleError::Internal(err));
                }
            }
        }

        Err(LifecycleError::Conflict)
    }

    pub async fn mark_deceased(
        &self,
        member_uuids: Vec<Uuid>,
        today: NaiveDate,
    ) -> UseCaseResult<Vec<MemberOutcome>> {
        if member_uuids.is_empty() {
            return Err(LifecycleError::Validation("No members selected".to_string()));
        }

        let outcomes = self.member_repository.mark_deceased(member_uuids, today).await?;

        info!(
            requested = outcomes.len(),
            marked = outcomes.iter().filter(|outcome| outcome.succeeded).count(),
            "lifecycle: members marked deceased"
        );
        Ok(outcomes)
    }

    async fn find_member(&self, member_uuid: Uuid) -> UseCaseResult<MemberEntity> {
        self.member_repository
            .find_by_uuid(member_uuid)
            .await?
            .ok_or(LifecycleError::MemberNotFound)
    }
}
