use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::payments::{InsertPaymentEntity, PaymentEntity},
    value_objects::payments::{MemberPaymentUpdate, PaymentHistoryFilter},
};

#[async_trait]
#[automock]
pub trait PaymentRepository {
    /// Inserts the payment and applies the member update in one transaction.
    /// A reactivation that collides on the recyclable ID fails with `MemberIdTaken`.
    async fn record_payment(
        &self,
        payment: InsertPaymentEntity,
        member_update: MemberPaymentUpdate,
    ) -> Result<Uuid>;

    /// Newest first, paginated; returns the page and the total row count.
    async fn list_member_payments(
        &self,
        member_uuid: Uuid,
        filter: PaymentHistoryFilter,
    ) -> Result<(Vec<PaymentEntity>, i64)>;
}
