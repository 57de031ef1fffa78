use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::{lifecycle::StatusTransition, money::format_minor},
};

pub const DEFAULT_PAYMENT_PAGE_SIZE: i64 = 20;
pub const MAX_PAYMENT_PAGE_SIZE: i64 = 200;
/// Far past any real history; keeps `offset` inside `i64`.
pub const MAX_PAYMENT_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPaymentModel {
    pub member_uuid: Uuid,
    pub payment_method_id: Uuid,
    pub amount: String,
    pub payment_date: Option<NaiveDate>,
    pub receipt_number: String,
    pub override_expiration: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpirationPreviewModel {
    pub amount: String,
    pub override_expiration: Option<NaiveDate>,
}

/// Preview for a member that does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMemberExpirationPreviewModel {
    pub member_type_id: Uuid,
    pub amount: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub override_expiration: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExpirationPreviewDto {
    pub current_expiration: Option<NaiveDate>,
    pub new_expiration: NaiveDate,
    pub months_purchased: u32,
    pub suggested_amount: String,
}

/// Expiration change written together with a renewal payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberPaymentUpdate {
    pub member_uuid: Uuid,
    /// Expiration the renewal was computed from; the write is skipped if it moved.
    pub previous_expiration: NaiveDate,
    pub new_expiration: NaiveDate,
    /// Set when the payment brings an inactive member back; the granted recyclable ID.
    pub reactivate_with_member_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentHistoryFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaymentHistoryFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAYMENT_PAGE)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAYMENT_PAGE_SIZE)
            .clamp(1, MAX_PAYMENT_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentDto {
    pub id: Uuid,
    pub member_uuid: Uuid,
    pub payment_method_id: Uuid,
    pub amount: String,
    pub amount_minor: i32,
    pub date: NaiveDate,
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for PaymentDto {
    fn from(value: PaymentEntity) -> Self {
        Self {
            id: value.id,
            member_uuid: value.member_uuid,
            payment_method_id: value.payment_method_id,
            amount: format_minor(value.amount_minor),
            amount_minor: value.amount_minor,
            date: value.date,
            receipt_number: value.receipt_number,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentHistoryDto {
    pub member_uuid: Uuid,
    pub payments: Vec<PaymentDto>,
    pub total_payments: i64,
    pub page: i64,
    pub page_size: i64,
}

/// What happened when a renewal payment was recorded.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentOutcome {
    pub payment_id: Uuid,
    pub member_uuid: Uuid,
    pub amount: String,
    pub previous_expiration: NaiveDate,
    pub new_expiration: NaiveDate,
    pub status_transition: Option<StatusTransition>,
    pub member_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_pagination_defaults_and_clamps() {
        let filter = PaymentHistoryFilter::default();
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.page_size(), DEFAULT_PAYMENT_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);

        let filter = PaymentHistoryFilter {
            page: Some(3),
            page_size: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.page_size(), MAX_PAYMENT_PAGE_SIZE);
        assert_eq!(filter.offset(), 2 * MAX_PAYMENT_PAGE_SIZE);

        let filter = PaymentHistoryFilter {
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.page(), 1);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let filter = PaymentHistoryFilter {
            page: Some(i64::MAX),
            page_size: Some(MAX_PAYMENT_PAGE_SIZE),
            ..Default::default()
        };
        assert_eq!(filter.page(), MAX_PAYMENT_PAGE);
        assert_eq!(filter.offset(), (MAX_PAYMENT_PAGE - 1) * MAX_PAYMENT_PAGE_SIZE);
        assert!(filter.offset() >= 0);

        let filter = PaymentHistoryFilter {
            page: Some(i64::MIN),
            page_size: Some(i64::MIN),
            ..Default::default()
        };
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.page_size(), 1);
        assert_eq!(filter.offset(), 0);
    }
}
