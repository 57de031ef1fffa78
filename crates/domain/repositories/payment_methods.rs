use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payment_methods::PaymentMethodEntity;

#[async_trait]
#[automock]
pub trait PaymentMethodRepository {
    async fn find_by_id(&self, payment_method_id: Uuid) -> Result<Option<PaymentMethodEntity>>;
    async fn list_active_payment_methods(&self) -> Result<Vec<PaymentMethodEntity>>;
}
