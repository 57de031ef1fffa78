use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::{member_types::MemberTypeEntity, payment_methods::PaymentMethodEntity},
    value_objects::{expiration::suggested_initial_payment, money::format_minor},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MemberTypeDto {
    pub id: Uuid,
    pub name: String,
    pub dues: String,
    pub dues_minor: i32,
    pub coverage_months: i32,
    pub suggested_initial_payment: String,
    pub takes_payments: bool,
}

impl From<MemberTypeEntity> for MemberTypeDto {
    fn from(value: MemberTypeEntity) -> Self {
        let takes_payments = !value.is_life();
        Self {
            id: value.id,
            dues: format_minor(value.dues_minor),
            dues_minor: value.dues_minor,
            coverage_months: value.coverage_months,
            suggested_initial_payment: format_minor(suggested_initial_payment(value.dues_minor)),
            takes_payments,
            name: value.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentMethodDto {
    pub id: Uuid,
    pub name: String,
    pub is_credit_card: bool,
}

impl From<PaymentMethodEntity> for PaymentMethodDto {
    fn from(value: PaymentMethodEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            is_credit_card: value.is_credit_card,
        }
    }
}
