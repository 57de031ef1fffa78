use std::sync::Arc;

use anyhow::Result;
use crates::domain::{
    repositories::{member_types::MemberTypeRepository, payment_methods::PaymentMethodRepository},
    value_objects::reference_data::{MemberTypeDto, PaymentMethodDto},
};

pub struct ReferenceDataUseCase<T, P>
where
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    member_type_repository: Arc<T>,
    payment_method_repository: Arc<P>,
}

impl<T, P> ReferenceDataUseCase<T, P>
where
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    pub fn new(member_type_repository: Arc<T>, payment_method_repository: Arc<P>) -> Self {
        Self {
            member_type_repository,
            payment_method_repository,
        }
    }

    pub async fn list_member_types(&self) -> Result<Vec<MemberTypeDto>> {
        let member_types = self.member_type_repository.list_active_member_types().await?;
        Ok(member_types.into_iter().map(MemberTypeDto::from).collect())
    }

    pub async fn list_payment_methods(&self) -> Result<Vec<PaymentMethodDto>> {
        let methods = self
            .payment_method_repository
            .list_active_payment_methods()
            .await?;
        Ok(methods.into_iter().map(PaymentMethodDto::from).collect())
    }
}
