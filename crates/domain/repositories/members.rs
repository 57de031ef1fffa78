use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        members::{InsertMemberEntity, MemberEntity, UpdateMemberEntity},
        payments::InsertPaymentEntity,
    },
    value_objects::{
        duplicates::DuplicateCandidate,
        members::{ExpiredMemberModel, MemberOutcome, MemberSearchFilter},
    },
};

#[async_trait]
#[automock]
pub trait MemberRepository {
    async fn find_by_uuid(&self, member_uuid: Uuid) -> Result<Option<MemberEntity>>;

    /// Recyclable IDs currently held by active members.
    async fn list_active_member_ids(&self) -> Result<Vec<i32>>;

    /// Inserts the member (and its initial payment, if any) in one transaction
    /// and returns the stored member with the initial payment id.
    /// Fails with `MemberIdTaken` when another active member holds the ID.
    async fn create_member(
        &self,
        member: InsertMemberEntity,
        initial_payment: Option<InsertPaymentEntity>,
    ) -> Result<(MemberEntity, Option<Uuid>)>;

    /// Updates an active member. Fails with `MemberStatusConflict` when the
    /// member is no longer active and `MemberIdTaken` on an ID collision.
    async fn update_active_member(
        &self,
        member_uuid: Uuid,
        changes: UpdateMemberEntity,
    ) -> Result<MemberEntity>;

    /// Moves an inactive member back to active holding `member_id`.
    async fn reactivate_member(&self, member_uuid: Uuid, member_id: i32) -> Result<MemberEntity>;

    /// Active members expired before `cutoff` with no payment dated after their
    /// expiration, computed in a single query.
    async fn list_expired_without_payment(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<ExpiredMemberModel>>;

    /// Re-verifies eligibility of every member at write time and deactivates
    /// the eligible ones inside one transaction. Per-member failures are
    /// reported in the outcomes and never roll back the rest.
    async fn deactivate_members(
        &self,
        member_uuids: Vec<Uuid>,
        today: NaiveDate,
        grace_period_days: i64,
    ) -> Result<Vec<MemberOutcome>>;

    /// Marks members deceased, releasing any recyclable ID they hold.
    async fn mark_deceased(
        &self,
        member_uuids: Vec<Uuid>,
        today: NaiveDate,
    ) -> Result<Vec<MemberOutcome>>;

    /// Superset of possible duplicates of `candidate` across all statuses.
    async fn find_duplicate_candidates(
        &self,
        candidate: DuplicateCandidate,
    ) -> Result<Vec<MemberEntity>>;

    async fn search_members(&self, filter: MemberSearchFilter) -> Result<Vec<MemberEntity>>;
}
