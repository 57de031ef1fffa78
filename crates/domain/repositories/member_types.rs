use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::member_types::MemberTypeEntity;

#[async_trait]
#[automock]
pub trait MemberTypeRepository {
    async fn find_by_id(&self, member_type_id: Uuid) -> Result<Option<MemberTypeEntity>>;
    async fn list_active_member_types(&self) -> Result<Vec<MemberTypeEntity>>;
}
