use std::sync::Arc;

use chrono::NaiveDate;
use crates::domain::{
    entities::{members::MemberEntity, member_types::MemberTypeEntity, payments::InsertPaymentEntity},
    repositories::{
        errors::{MemberChanged, MemberStatusConflict, is_member_id_taken},
        member_types::MemberTypeRepository,
        members::MemberRepository,
        payment_methods::PaymentMethodRepository,
        payments::PaymentRepository,
    },
    value_objects::{
        contact::normalize_optional,
        enums::member_statuses::MemberStatus,
        expiration::{months_purchased, renewal_expiration},
        lifecycle::{StatusTransition, grant_reactivation_id},
        money::{format_minor, parse_amount_minor},
        payments::{
            ExpirationPreviewDto, ExpirationPreviewModel, MemberPaymentUpdate, NewPaymentModel,
            PaymentDto, PaymentHistoryDto, PaymentHistoryFilter, PaymentOutcome,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::member_ids::load_member_id_pool;

/// A payment is recomputed from a fresh read this many times when the member
/// changes between the read and the write.
const MAX_PAYMENT_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),
    #[error("member not found")]
    MemberNotFound,
    #[error("member type not found")]
    MemberTypeNotFound,
    #[error("payment method not found or inactive")]
    PaymentMethodNotFound,
    #[error("payments cannot be recorded for deceased members")]
    MemberDeceased,
    #[error("Life members do not pay dues")]
    LifeMemberNoDues,
    #[error("no member IDs available to reactivate this member")]
    NoMemberIdsAvailable,
    #[error("member changed while the payment was being recorded, please retry")]
    Conflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::Validation(_)
            | PaymentError::MemberTypeNotFound
            | PaymentError::PaymentMethodNotFound => StatusCode::BAD_REQUEST,
            PaymentError::MemberNotFound => StatusCode::NOT_FOUND,
            PaymentError::MemberDeceased
            | PaymentError::LifeMemberNoDues
            | PaymentError::NoMemberIdsAvailable
            | PaymentError::Conflict => StatusCode::CONFLICT,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

fn invalid(err: impl ToString) -> PaymentError {
    PaymentError::Validation(err.to_string())
}

pub struct PaymentUseCase<M, T, P, Pay>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    member_repository: Arc<M>,
    member_type_repository: Arc<T>,
    payment_method_repository: Arc<P>,
    payment_repository: Arc<Pay>,
}

impl<M, T, P, Pay> PaymentUseCase<M, T, P, Pay>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(
        member_repository: Arc<M>,
        member_type_repository: Arc<T>,
        payment_method_repository: Arc<P>,
        payment_repository: Arc<Pay>,
    ) -> Self {
        Self {
            member_repository,
            member_type_repository,
            payment_method_repository,
            payment_repository,
        }
    }

    /// What a renewal of `amount` would do to the member's expiration, without writing.
    pub async fn preview_expiration(
        &self,
        member_uuid: Uuid,
        model: ExpirationPreviewModel,
    ) -> UseCaseResult<ExpirationPreviewDto> {
        let member = self.find_member(member_uuid).await?;
        let member_type = self.member_type(member.member_type_id).await?;
        let amount_minor = parse_amount_minor(&model.amount).map_err(invalid)?;

        Ok(ExpirationPreviewDto {
            current_expiration: Some(member.expiration_date),
            new_expiration: renewal_expiration(
                member.expiration_date,
                i64::from(amount_minor),
                i64::from(member_type.dues_minor),
                model.override_expiration,
            ),
            months_purchased: months_purchased(
                i64::from(amount_minor),
                i64::from(member_type.dues_minor),
            ),
            suggested_amount: format_minor(member_type.dues_minor.max(0)),
        })
    }

    pub async fn record_payment(
        &self,
        model: NewPaymentModel,
        today: NaiveDate,
    ) -> UseCaseResult<PaymentOutcome> {
        for attempt in 1..=MAX_PAYMENT_ATTEMPTS {
            match self.try_record_payment(&model, today).await {
                Err(PaymentError::Conflict) => {
                    warn!(
                        member_uuid = %model.member_uuid,
                        attempt,
                        "payments: member changed concurrently, retrying"
                    );
                }
                result => return result,
            }
        }

        Err(PaymentError::Conflict)
    }

    async fn try_record_payment(
        &self,
        model: &NewPaymentModel,
        today: NaiveDate,
    ) -> UseCaseResult<PaymentOutcome> {
        let member = self.find_member(model.member_uuid).await?;
        let status = member.status();
        if status == MemberStatus::Deceased {
            warn!(member_uuid = %member.member_uuid, "payments: payment attempted for deceased member");
            return Err(PaymentError::MemberDeceased);
        }

        let member_type = self.member_type(member.member_type_id).await?;
        if member_type.is_life() {
            return Err(PaymentError::LifeMemberNoDues);
        }

        let amount_minor = parse_amount_minor(&model.amount).map_err(invalid)?;
        if amount_minor <= 0 {
            return Err(invalid("Amount must be greater than zero"));
        }
        let receipt_number = normalize_optional(Some(model.receipt_number.clone()))
            .ok_or_else(|| invalid("Receipt number is required"))?;
        self.ensure_payment_method(model.payment_method_id).await?;

        let new_expiration = renewal_expiration(
            member.expiration_date,
            i64::from(amount_minor),
            i64::from(member_type.dues_minor),
            model.override_expiration,
        );

        // An active member must hold an ID, so reactivation needs one before anything is written.
        let reactivation = if status == MemberStatus::Inactive {
            let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
            let grant = grant_reactivation_id(member.preferred_member_id, &pool).ok_or_else(|| {
                warn!(member_uuid = %member.member_uuid, "payments: no member id available for reactivation");
                PaymentError::NoMemberIdsAvailable
            })?;
            Some(grant)
        } else {
            None
        };

        let payment = InsertPaymentEntity {
            member_uuid: member.member_uuid,
            payment_method_id: model.payment_method_id,
            amount_minor,
            date: model.payment_date.unwrap_or(today),
            receipt_number,
        };
        let member_update = MemberPaymentUpdate {
            member_uuid: member.member_uuid,
            previous_expiration: member.expiration_date,
            new_expiration,
            reactivate_with_member_id: reactivation.map(|grant| grant.member_id),
        };

        let payment_id = self
            .payment_repository
            .record_payment(payment, member_update)
            .await
            .map_err(|err| {
                if is_member_id_taken(&err)
                    || err.downcast_ref::<MemberChanged>().is_some()
                    || err.downcast_ref::<MemberStatusConflict>().is_some()
                {
                    PaymentError::Conflict
                } else {
                    error!(member_uuid = %member.member_uuid, db_error = ?err, "payments: failed to record payment");
                    PaymentError::Internal(err)
                }
            })?;

        let status_transition = reactivation.map(|_| StatusTransition {
            from: MemberStatus::Inactive,
            to: MemberStatus::Active,
        });

        if let Some(grant) = reactivation {
            info!(
                member_uuid = %member.member_uuid,
                member_id = grant.member_id,
                restored_preferred = grant.restored_preferred,
                "payments: member reactivated by payment"
            );
        }
        info!(
            %payment_id,
            member_uuid = %member.member_uuid,
            amount_minor,
            previous_expiration = %member.expiration_date,
            %new_expiration,
            "payments: payment recorded"
        );

        Ok(PaymentOutcome {
            payment_id,
            member_uuid: member.member_uuid,
            amount: format_minor(amount_minor),
            previous_expiration: member.expiration_date,
            new_expiration,
            status_transition,
            member_id: reactivation.map(|grant| grant.member_id).or(member.member_id),
        })
    }

    pub async fn payment_history(
        &self,
        member_uuid: Uuid,
        filter: PaymentHistoryFilter,
    ) -> UseCaseResult<PaymentHistoryDto> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(invalid("start_date must not be after end_date"));
            }
        }

        self.find_member(member_uuid).await?;

        let (payments, total_payments) = self
            .payment_repository
            .list_member_payments(member_uuid, filter)
            .await?;

        Ok(PaymentHistoryDto {
            member_uuid,
            payments: payments.into_iter().map(PaymentDto::from).collect(),
            total_payments,
            page: filter.page(),
            page_size: filter.page_size(),
        })
    }

    async fn find_member(&self, member_uuid: Uuid) -> UseCaseResult<MemberEntity> {
        self.member_repository
            .find_by_uuid(member_uuid)
            .await?
            .ok_or(PaymentError::MemberNotFound)
    }

    async fn member_type(&self, member_type_id: Uuid) -> UseCaseResult<MemberTypeEntity> {
        self.member_type_repository
            .find_by_id(member_type_id)
            .await?
            .ok_or(PaymentError::MemberTypeNotFound)
    }

    async fn ensure_payment_method(&self, payment_method_id: Uuid) -> UseCaseResult<()> {
        self.payment_method_repository
            .find_by_id(payment_method_id)
            .await?
            .filter(|method| method.is_active)
            .map(|_| ())
            .ok_or(PaymentError::PaymentMethodNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::{payment_methods::PaymentMethodEntity, payments::PaymentEntity},
        repositories::{
            errors::MemberIdTaken, member_types::MockMemberTypeRepository,
            members::MockMemberRepository, payment_methods::MockPaymentMethodRepository,
            payments::MockPaymentRepository,
        },
    };
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type TestUseCase = PaymentUseCase<
        MockMemberRepository,
        MockMemberTypeRepository,
        MockPaymentMethodRepository,
        MockPaymentRepository,
    >;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member_type(name: &str, dues_minor: i32) -> MemberTypeEntity {
        MemberTypeEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            dues_minor,
            coverage_months: 1,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn member(
        member_type_id: Uuid,
        status: MemberStatus,
        member_id: Option<i32>,
        preferred_member_id: Option<i32>,
        expiration_date: NaiveDate,
    ) -> MemberEntity {
        let now = Utc::now();
        MemberEntity {
            member_uuid: Uuid::new_v4(),
            member_id,
            preferred_member_id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: None,
            member_type_id,
            status: status.as_str().to_string(),
            expiration_date,
            milestone_date: None,
            date_joined: date(2020, 1, 1),
            date_inactivated: (status == MemberStatus::Inactive).then_some(date(2025, 1, 1)),
            home_address: None,
            home_city: None,
            home_state: None,
            home_zip: None,
            home_phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    struct Fixture {
        member_repository: MockMemberRepository,
        member_type_repository: MockMemberTypeRepository,
        payment_method_repository: MockPaymentMethodRepository,
        payment_repository: MockPaymentRepository,
        payment_method_id: Uuid,
    }

    impl Fixture {
        fn new(member: MemberEntity, member_type: MemberTypeEntity) -> Self {
            Self::with_member_reads(vec![member], member_type)
        }

        /// Each lookup returns the next snapshot; the last one repeats.
        fn with_member_reads(reads: Vec<MemberEntity>, member_type: MemberTypeEntity) -> Self {
            let member_uuid = reads[0].member_uuid;
            let read_count = Arc::new(AtomicUsize::new(0));
            let mut member_repository = MockMemberRepository::new();
            member_repository
                .expect_find_by_uuid()
                .with(eq(member_uuid))
                .returning(move |_| {
                    let read = read_count.fetch_add(1, Ordering::SeqCst);
                    let member = reads[read.min(reads.len() - 1)].clone();
                    Box::pin(async move { Ok(Some(member)) })
                });

            let mut member_type_repository = MockMemberTypeRepository::new();
            member_type_repository
                .expect_find_by_id()
                .with(eq(member_type.id))
                .returning(move |_| {
                    let member_type = member_type.clone();
                    Box::pin(async move { Ok(Some(member_type)) })
                });

            let method = PaymentMethodEntity {
                id: Uuid::new_v4(),
                name: "Check".to_string(),
                is_credit_card: false,
                is_active: true,
                created_at: Utc::now(),
            };
            let payment_method_id = method.id;
            let mut payment_method_repository = MockPaymentMethodRepository::new();
            payment_method_repository
                .expect_find_by_id()
                .returning(move |_| {
                    let method = method.clone();
                    Box::pin(async move { Ok(Some(method)) })
                });

            Self {
                member_repository,
                member_type_repository,
                payment_method_repository,
                payment_repository: MockPaymentRepository::new(),
                payment_method_id,
            }
        }

        fn payment(&self, member_uuid: Uuid, amount: &str) -> NewPaymentModel {
            NewPaymentModel {
                member_uuid,
                payment_method_id: self.payment_method_id,
                amount: amount.to_string(),
                payment_date: None,
                receipt_number: "R-2001".to_string(),
                override_expiration: None,
            }
        }

        fn into_usecase(self) -> TestUseCase {
            PaymentUseCase::new(
                Arc::new(self.member_repository),
                Arc::new(self.member_type_repository),
                Arc::new(self.payment_method_repository),
                Arc::new(self.payment_repository),
            )
        }
    }

    #[tokio::test]
    async fn renewal_extends_from_current_expiration() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Active, Some(5), Some(5), date(2025, 3, 31));
        let member_uuid = member.member_uuid;
        let today = date(2025, 4, 2);

        let mut fixture = Fixture::new(member, member_type);
        let payment = fixture.payment(member_uuid, "60.00");
        fixture
            .payment_repository
            .expect_record_payment()
            .withf(move |payment, update| {
                payment.amount_minor == 6000
                    && payment.date == today
                    && update.previous_expiration == date(2025, 3, 31)
                    && update.new_expiration == date(2025, 5, 31)
                    && update.reactivate_with_member_id.is_none()
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(Uuid::new_v4()) }));

        let outcome = fixture.into_usecase().record_payment(payment, today).await.unwrap();

        assert_eq!(outcome.new_expiration, date(2025, 5, 31));
        assert_eq!(outcome.previous_expiration, date(2025, 3, 31));
        assert_eq!(outcome.status_transition, None);
        assert_eq!(outcome.member_id, Some(5));
        assert_eq!(outcome.amount, "60.00");
    }

    #[tokio::test]
    async fn underpayment_leaves_expiration_unchanged() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Active, Some(5), Some(5), date(2025, 3, 31));
        let member_uuid = member.member_uuid;

        let mut fixture = Fixture::new(member, member_type);
        let payment = fixture.payment(member_uuid, "15.00");
        fixture
            .payment_repository
            .expect_record_payment()
            .withf(|_, update| update.new_expiration == date(2025, 3, 31))
            .returning(|_, _| Box::pin(async { Ok(Uuid::new_v4()) }));

        let outcome = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 4, 2))
            .await
            .unwrap();

        assert_eq!(outcome.new_expiration, date(2025, 3, 31));
    }

    #[tokio::test]
    async fn inactive_member_is_reactivated_with_preferred_id() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Inactive, None, Some(42), date(2024, 12, 31));
        let member_uuid = member.member_uuid;

        let mut fixture = Fixture::new(member, member_type);
        let payment = fixture.payment(member_uuid, "30.00");
        fixture
            .member_repository
            .expect_list_active_member_ids()
            .returning(|| Box::pin(async { Ok(vec![1, 2, 3]) }));
        fixture
            .payment_repository
            .expect_record_payment()
            .withf(|_, update| {
                update.reactivate_with_member_id == Some(42)
                    && update.new_expiration == date(2025, 1, 31)
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(Uuid::new_v4()) }));

        let outcome = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 6, 1))
            .await
            .unwrap();

        assert_eq!(
            outcome.status_transition,
            Some(StatusTransition {
                from: MemberStatus::Inactive,
                to: MemberStatus::Active,
            })
        );
        assert_eq!(outcome.member_id, Some(42));
    }

    #[tokio::test]
    async fn reactivation_with_exhausted_pool_writes_nothing() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Inactive, None, Some(42), date(2024, 12, 31));
        let member_uuid = member.member_uuid;

        let mut fixture = Fixture::new(member, member_type);
        let payment = fixture.payment(member_uuid, "30.00");
        fixture
            .member_repository
            .expect_list_active_member_ids()
            .returning(|| Box::pin(async { Ok((1..=999).collect()) }));
        fixture.payment_repository.expect_record_payment().never();

        let err = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 6, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::NoMemberIdsAvailable));
    }

    #[tokio::test]
    async fn renewal_racing_another_payment_is_recomputed_from_the_new_expiration() {
        let member_type = member_type("Regular", 3000);
        let first_read = member(member_type.id, MemberStatus::Active, Some(5), Some(5), date(2025, 3, 31));
        let member_uuid = first_read.member_uuid;
        let mut second_read = first_read.clone();
        second_read.expiration_date = date(2025, 4, 30);

        let mut fixture = Fixture::with_member_reads(vec![first_read, second_read], member_type);
        let payment = fixture.payment(member_uuid, "30.00");
        let writes = Arc::new(AtomicUsize::new(0));
        let recorded = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&recorded);
        fixture
            .payment_repository
            .expect_record_payment()
            .times(2)
            .returning(move |_, update| {
                seen.lock().unwrap().push((update.previous_expiration, update.new_expiration));
                let write = writes.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    if write == 0 {
                        Err(MemberChanged { member_uuid }.into())
                    } else {
                        Ok(Uuid::new_v4())
                    }
                })
            });

        let outcome = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 4, 2))
            .await
            .unwrap();

        assert_eq!(
            *recorded.lock().unwrap(),
            vec![
                (date(2025, 3, 31), date(2025, 4, 30)),
                (date(2025, 4, 30), date(2025, 5, 31)),
            ]
        );
        assert_eq!(outcome.previous_expiration, date(2025, 4, 30));
        assert_eq!(outcome.new_expiration, date(2025, 5, 31));
    }

    #[tokio::test]
    async fn reactivation_regrants_when_the_id_is_taken_concurrently() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Inactive, None, Some(42), date(2024, 12, 31));
        let member_uuid = member.member_uuid;

        let mut fixture = Fixture::new(member, member_type);
        let payment = fixture.payment(member_uuid, "30.00");
        let pool_reads = Arc::new(AtomicUsize::new(0));
        fixture
            .member_repository
            .expect_list_active_member_ids()
            .times(2)
            .returning(move || {
                let read = pool_reads.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { Ok(if read == 0 { vec![] } else { vec![42] }) })
            });
        fixture
            .payment_repository
            .expect_record_payment()
            .withf(|_, update| update.reactivate_with_member_id == Some(42))
            .times(1)
            .returning(|_, _| Box::pin(async { Err(MemberIdTaken { member_id: Some(42) }.into()) }));
        fixture
            .payment_repository
            .expect_record_payment()
            .withf(|_, update| update.reactivate_with_member_id == Some(1))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(Uuid::new_v4()) }));

        let outcome = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 6, 1))
            .await
            .unwrap();

        assert_eq!(outcome.member_id, Some(1));
    }

    #[tokio::test]
    async fn concurrent_id_grant_is_reported_as_conflict() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Inactive, None, Some(42), date(2024, 12, 31));
        let member_uuid = member.member_uuid;

        let mut fixture = Fixture::new(member, member_type);
        let payment = fixture.payment(member_uuid, "30.00");
        fixture
            .member_repository
            .expect_list_active_member_ids()
            .returning(|| Box::pin(async { Ok(vec![]) }));
        fixture
            .payment_repository
            .expect_record_payment()
            .times(MAX_PAYMENT_ATTEMPTS)
            .returning(|_, _| Box::pin(async { Err(MemberIdTaken { member_id: Some(42) }.into()) }));

        let err = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 6, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Conflict));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn deceased_and_life_members_do_not_take_payments() {
        let regular = member_type("Regular", 3000);
        let deceased = member(regular.id, MemberStatus::Deceased, None, Some(9), date(2025, 1, 31));
        let deceased_uuid = deceased.member_uuid;
        let fixture = Fixture::new(deceased, regular);
        let payment = fixture.payment(deceased_uuid, "30.00");
        let err = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 6, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::MemberDeceased));

        let life = member_type("Life", 0);
        let lifer = member(life.id, MemberStatus::Active, Some(3), Some(3), date(2099, 12, 31));
        let lifer_uuid = lifer.member_uuid;
        let fixture = Fixture::new(lifer, life);
        let payment = fixture.payment(lifer_uuid, "30.00");
        let err = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 6, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::LifeMemberNoDues));
    }

    #[tokio::test]
    async fn zero_amount_and_missing_receipt_are_rejected() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Active, Some(5), Some(5), date(2025, 3, 31));
        let member_uuid = member.member_uuid;

        let fixture = Fixture::new(member.clone(), member_type.clone());
        let payment = fixture.payment(member_uuid, "0.00");
        let err = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 4, 2))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Amount must be greater than zero");

        let fixture = Fixture::new(member, member_type);
        let mut payment = fixture.payment(member_uuid, "30.00");
        payment.receipt_number = String::new();
        let err = fixture
            .into_usecase()
            .record_payment(payment, date(2025, 4, 2))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Receipt number is required");
    }

    #[tokio::test]
    async fn preview_reports_months_and_new_expiration() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Active, Some(5), Some(5), date(2025, 3, 31));
        let member_uuid = member.member_uuid;

        let preview = Fixture::new(member, member_type)
            .into_usecase()
            .preview_expiration(
                member_uuid,
                ExpirationPreviewModel {
                    amount: "90".to_string(),
                    override_expiration: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(preview.current_expiration, Some(date(2025, 3, 31)));
        assert_eq!(preview.new_expiration, date(2025, 6, 30));
        assert_eq!(preview.months_purchased, 3);
        assert_eq!(preview.suggested_amount, "30.00");
    }

    #[tokio::test]
    async fn history_is_paginated() {
        let member_type = member_type("Regular", 3000);
        let member = member(member_type.id, MemberStatus::Active, Some(5), Some(5), date(2025, 3, 31));
        let member_uuid = member.member_uuid;

        let mut fixture = Fixture::new(member, member_type);
        fixture
            .payment_repository
            .expect_list_member_payments()
            .withf(move |uuid, filter| *uuid == member_uuid && filter.offset() == 20)
            .returning(move |uuid, _| {
                let payment = PaymentEntity {
                    id: Uuid::new_v4(),
                    member_uuid: uuid,
                    payment_method_id: Uuid::new_v4(),
                    amount_minor: 3000,
                    date: date(2025, 2, 1),
                    receipt_number: "R-1".to_string(),
                    created_at: Utc::now(),
                };
                Box::pin(async move { Ok((vec![payment], 21)) })
            });

        let history = fixture
            .into_usecase()
            .payment_history(
                member_uuid,
                PaymentHistoryFilter {
                    page: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(history.total_payments, 21);
        assert_eq!(history.page, 2);
        assert_eq!(history.page_size, 20);
        assert_eq!(history.payments[0].amount, "30.00");
    }

    #[tokio::test]
    async fn inverted_history_range_is_rejected() {
        let usecase: TestUseCase = PaymentUseCase::new(
            Arc::new(MockMemberRepository::new()),
            Arc::new(MockMemberTypeRepository::new()),
            Arc::new(MockPaymentMethodRepository::new()),
            Arc::new(MockPaymentRepository::new()),
        );

        let err = usecase
            .payment_history(
                Uuid::new_v4(),
                PaymentHistoryFilter {
                    start_date: Some(date(2025, 5, 1)),
                    end_date: Some(date(2025, 4, 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::Validation(_)));
    }
}
