use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use crates::domain::{
    entities::{
        member_types::MemberTypeEntity,
        members::{InsertMemberEntity, MemberEntity, UpdateMemberEntity},
        payments::InsertPaymentEntity,
    },
    repositories::{
        errors::{MemberIdTaken, MemberStatusConflict, is_member_id_taken},
        member_types::MemberTypeRepository,
        members::MemberRepository,
        payment_methods::PaymentMethodRepository,
    },
    value_objects::{
        contact::{normalize_optional, validate_email, validate_name, validate_state, validate_zip},
        duplicates::{DuplicateCandidate, DuplicateMatchDto, find_duplicates},
        enums::member_statuses::MemberStatus,
        expiration::{months_purchased, new_member_expiration, suggested_initial_payment},
        member_id_pool::{MAX_MEMBER_ID, MIN_MEMBER_ID, is_in_range},
        members::{CreatedMemberDto, MemberDto, MemberSearchFilter, NewMemberModel, UpdateMemberModel},
        membership_dates::end_of_month,
        money::{format_minor, parse_amount_minor},
        payments::{ExpirationPreviewDto, NewMemberExpirationPreviewModel},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::member_ids::{MAX_MEMBER_ID_ATTEMPTS, load_member_id_pool};

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("{0}")]
    Validation(String),
    #[error("member not found")]
    MemberNotFound,
    #[error("member type not found or inactive")]
    MemberTypeNotFound,
    #[error("payment method not found or inactive")]
    PaymentMethodNotFound,
    #[error("member ID {0} is outside {min}..={max}", min = MIN_MEMBER_ID, max = MAX_MEMBER_ID)]
    MemberIdOutOfRange(i32),
    #[error("member ID {0} is already in use")]
    MemberIdInUse(i32),
    #[error("no member IDs available")]
    NoMemberIdsAvailable,
    #[error("could not reserve a member ID, please retry")]
    MemberIdContention,
    #[error("only active members can be edited")]
    MemberNotActive,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MemberError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MemberError::Validation(_)
            | MemberError::MemberTypeNotFound
            | MemberError::PaymentMethodNotFound
            | MemberError::MemberIdOutOfRange(_) => StatusCode::BAD_REQUEST,
            MemberError::MemberNotFound => StatusCode::NOT_FOUND,
            MemberError::MemberIdInUse(_)
            | MemberError::NoMemberIdsAvailable
            | MemberError::MemberIdContention
            | MemberError::MemberNotActive => StatusCode::CONFLICT,
            MemberError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, MemberError>;

fn invalid(err: impl ToString) -> MemberError {
    MemberError::Validation(err.to_string())
}

/// Trimmed and checked contact fields shared by create and edit.
struct ContactFields {
    first_name: String,
    last_name: String,
    email: Option<String>,
    home_address: Option<String>,
    home_city: Option<String>,
    home_state: Option<String>,
    home_zip: Option<String>,
    home_phone: Option<String>,
}

impl ContactFields {
    #[allow(clippy::too_many_arguments)]
    fn validate(
        first_name: &str,
        last_name: &str,
        email: Option<String>,
        home_address: Option<String>,
        home_city: Option<String>,
        home_state: Option<String>,
        home_zip: Option<String>,
        home_phone: Option<String>,
    ) -> UseCaseResult<Self> {
        Ok(Self {
            first_name: validate_name("First name", first_name).map_err(invalid)?,
            last_name: validate_name("Last name", last_name).map_err(invalid)?,
            email: validate_email(email).map_err(invalid)?,
            home_address: normalize_optional(home_address),
            home_city: normalize_optional(home_city),
            home_state: validate_state(home_state).map_err(invalid)?,
            home_zip: validate_zip(home_zip).map_err(invalid)?,
            home_phone: normalize_optional(home_phone),
        })
    }
}

pub struct MemberUseCase<M, T, P>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    member_repository: Arc<M>,
    member_type_repository: Arc<T>,
    payment_method_repository: Arc<P>,
}

impl<M, T, P> MemberUseCase<M, T, P>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    pub fn new(
        member_repository: Arc<M>,
        member_type_repository: Arc<T>,
        payment_method_repository: Arc<P>,
    ) -> Self {
        Self {
            member_repository,
            member_type_repository,
            payment_method_repository,
        }
    }

    pub async fn create_member(
        &self,
        model: NewMemberModel,
        today: NaiveDate,
    ) -> UseCaseResult<CreatedMemberDto> {
        let contact = ContactFields::validate(
            &model.first_name,
            &model.last_name,
            model.email,
            model.home_address,
            model.home_city,
            model.home_state,
            model.home_zip,
            model.home_phone,
        )?;

        if let Some(member_id) = model.member_id.filter(|id| !is_in_range(*id)) {
            return Err(MemberError::MemberIdOutOfRange(member_id));
        }

        let member_type = self.active_member_type(model.member_type_id).await?;
        let member_uuid = Uuid::new_v4();

        let (amount_minor, initial_payment) = match model.initial_payment {
            Some(payment) => {
                let amount_minor = parse_amount_minor(&payment.amount).map_err(invalid)?;
                if amount_minor > 0 && member_type.is_life() {
                    return Err(MemberError::Validation(
                        "Life members do not pay dues".to_string(),
                    ));
                }

                let insert_payment = if amount_minor > 0 {
                    let receipt_number = normalize_optional(Some(payment.receipt_number))
                        .ok_or_else(|| invalid("Receipt number is required"))?;
                    self.ensure_payment_method(payment.payment_method_id).await?;
                    Some(InsertPaymentEntity {
                        member_uuid,
                        payment_method_id: payment.payment_method_id,
                        amount_minor,
                        date: payment.payment_date.unwrap_or(today),
                        receipt_number,
                    })
                } else {
                    None
                };
                (amount_minor, insert_payment)
            }
            None => (0, None),
        };

        let start_date = model.start_date.unwrap_or(today);
        let expiration_date = new_member_expiration(
            start_date,
            i64::from(amount_minor),
            i64::from(member_type.dues_minor),
            model.expiration_override,
        );

        let mut member = InsertMemberEntity {
            member_uuid,
            member_id: None,
            preferred_member_id: None,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            member_type_id: member_type.id,
            status: MemberStatus::Active.as_str().to_string(),
            expiration_date,
            milestone_date: model.milestone_date,
            date_joined: model.date_joined.unwrap_or(today),
            home_address: contact.home_address,
            home_city: contact.home_city,
            home_state: contact.home_state,
            home_zip: contact.home_zip,
            home_phone: contact.home_phone,
        };

        let (created, initial_payment_id) = match model.member_id {
            Some(member_id) => {
                let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
                if !pool.is_available(member_id) {
                    warn!(member_id, "members: requested member id already in use");
                    return Err(MemberError::MemberIdInUse(member_id));
                }

                member.member_id = Some(member_id);
                member.preferred_member_id = Some(member_id);
                self.member_repository
                    .create_member(member, initial_payment)
                    .await
                    .map_err(|err| member_id_error(err, member_id))?
            }
            None => self.create_with_next_member_id(member, initial_payment).await?,
        };

        info!(
            member_uuid = %created.member_uuid,
            member_id = ?created.member_id,
            expiration_date = %created.expiration_date,
            initial_payment = initial_payment_id.is_some(),
            "members: member created"
        );

        Ok(CreatedMemberDto {
            member: MemberDto::from(created),
            initial_payment_id,
        })
    }

    async fn create_with_next_member_id(
        &self,
        mut member: InsertMemberEntity,
        initial_payment: Option<InsertPaymentEntity>,
    ) -> UseCaseResult<(MemberEntity, Option<Uuid>)> {
        for attempt in 1..=MAX_MEMBER_ID_ATTEMPTS {
            let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
            let member_id = pool.next_available_id().ok_or_else(|| {
                warn!("members: member id pool exhausted");
                MemberError::NoMemberIdsAvailable
            })?;

            member.member_id = Some(member_id);
            member.preferred_member_id = Some(member_id);

            match self
                .member_repository
                .create_member(member.clone(), initial_payment.clone())
                .await
            {
                Ok(created) => return Ok(created),
                Err(err) if is_member_id_taken(&err) => {
                    warn!(member_id, attempt, "members: suggested member id taken concurrently, retrying");
                }
                Err(err) => {
                    error!(db_error = ?err, "members: failed to create member");
                    return Err(MemberError::Internal(err));
                }
            }
        }

        Err(MemberError::MemberIdContention)
    }

    pub async fn check_duplicates(
        &self,
        candidate: DuplicateCandidate,
    ) -> UseCaseResult<Vec<DuplicateMatchDto>> {
        let candidate = candidate.normalized();
        let has_name = !candidate.first_name.is_empty() && !candidate.last_name.is_empty();
        if !has_name && candidate.phone.is_none() && candidate.email.is_none() {
            return Ok(Vec::new());
        }

        let existing = self
            .member_repository
            .find_duplicate_candidates(candidate.clone())
            .await?;

        Ok(find_duplicates(&candidate, &existing)
            .into_iter()
            .map(DuplicateMatchDto::from)
            .collect())
    }

    pub async fn get_member(&self, member_uuid: Uuid) -> UseCaseResult<MemberDto> {
        self.find_member(member_uuid).await.map(MemberDto::from)
    }

    pub async fn update_member(
        &self,
        member_uuid: Uuid,
        model: UpdateMemberModel,
    ) -> UseCaseResult<MemberDto> {
        let existing = self.find_member(member_uuid).await?;
        if existing.status() != MemberStatus::Active {
            return Err(MemberError::MemberNotActive);
        }

        let contact = ContactFields::validate(
            &model.first_name,
            &model.last_name,
            model.email,
            model.home_address,
            model.home_city,
            model.home_state,
            model.home_zip,
            model.home_phone,
        )?;

        if !is_in_range(model.member_id) {
            return Err(MemberError::MemberIdOutOfRange(model.member_id));
        }
        if existing.member_id != Some(model.member_id) {
            let pool = load_member_id_pool(self.member_repository.as_ref()).await?;
            if !pool.is_available(model.member_id) {
                return Err(MemberError::MemberIdInUse(model.member_id));
            }
        }

        let member_type = self.active_member_type(model.member_type_id).await?;

        let changes = UpdateMemberEntity {
            member_id: Some(Some(model.member_id)),
            preferred_member_id: Some(Some(model.member_id)),
            first_name: Some(contact.first_name),
            last_name: Some(contact.last_name),
            email: Some(contact.email),
            member_type_id: Some(member_type.id),
            expiration_date: model.expiration_override.map(end_of_month),
            milestone_date: Some(model.milestone_date),
            home_address: Some(contact.home_address),
            home_city: Some(contact.home_city),
            home_state: Some(contact.home_state),
            home_zip: Some(contact.home_zip),
            home_phone: Some(contact.home_phone),
            updated_at: Some(Utc::now()),
        };

        let updated = self
            .member_repository
            .update_active_member(member_uuid, changes)
            .await
            .map_err(|err| {
                if err.downcast_ref::<MemberStatusConflict>().is_some() {
                    MemberError::MemberNotActive
                } else {
                    member_id_error(err, model.member_id)
                }
            })?;

        info!(%member_uuid, member_id = model.member_id, "members: member updated");
        Ok(MemberDto::from(updated))
    }

    pub async fn search_members(&self, filter: MemberSearchFilter) -> UseCaseResult<Vec<MemberDto>> {
        let members = self.member_repository.search_members(filter).await?;
        Ok(members.into_iter().map(MemberDto::from).collect())
    }

    pub async fn preview_new_member_expiration(
        &self,
        model: NewMemberExpirationPreviewModel,
        today: NaiveDate,
    ) -> UseCaseResult<ExpirationPreviewDto> {
        let member_type = self.active_member_type(model.member_type_id).await?;
        let amount_minor = match model.amount.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_amount_minor(raw).map_err(invalid)?,
            _ => 0,
        };

        let new_expiration = new_member_expiration(
            model.start_date.unwrap_or(today),
            i64::from(amount_minor),
            i64::from(member_type.dues_minor),
            model.override_expiration,
        );

        Ok(ExpirationPreviewDto {
            current_expiration: None,
            new_expiration,
            months_purchased: months_purchased(
                i64::from(amount_minor),
                i64::from(member_type.dues_minor),
            ),
            suggested_amount: format_minor(suggested_initial_payment(member_type.dues_minor)),
        })
    }

    async fn find_member(&self, member_uuid: Uuid) -> UseCaseResult<MemberEntity> {
        self.member_repository
            .find_by_uuid(member_uuid)
            .await?
            .ok_or(MemberError::MemberNotFound)
    }

    async fn active_member_type(&self, member_type_id: Uuid) -> UseCaseResult<MemberTypeEntity> {
        self.member_type_repository
            .find_by_id(member_type_id)
            .await?
            .filter(|member_type| member_type.is_active)
            .ok_or(MemberError::MemberTypeNotFound)
    }

    async fn ensure_payment_method(&self, payment_method_id: Uuid) -> UseCaseResult<()> {
        self.payment_method_repository
            .find_by_id(payment_method_id)
            .await?
            .filter(|method| method.is_active)
            .map(|_| ())
            .ok_or(MemberError::PaymentMethodNotFound)
    }
}

fn member_id_error(err: anyhow::Error, member_id: i32) -> MemberError {
    match err.downcast_ref::<MemberIdTaken>() {
        Some(_) => MemberError::MemberIdInUse(member_id),
        None => MemberError::Internal(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::{
        entities::payment_methods::PaymentMethodEntity,
        repositories::{
            member_types::MockMemberTypeRepository, members::MockMemberRepository,
            payment_methods::MockPaymentMethodRepository,
        },
        value_objects::{duplicates::MatchReason, members::InitialPaymentModel},
    };
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member_type(dues_minor: i32) -> MemberTypeEntity {
        MemberTypeEntity {
            id: Uuid::new_v4(),
            name: "Regular".to_string(),
            dues_minor,
            coverage_months: 1,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn payment_method() -> PaymentMethodEntity {
        PaymentMethodEntity {
            id: Uuid::new_v4(),
            name: "Cash".to_string(),
            is_credit_card: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn stored(member: &InsertMemberEntity) -> MemberEntity {
        let now = Utc::now();
        MemberEntity {
            member_uuid: member.member_uuid,
            member_id: member.member_id,
            preferred_member_id: member.preferred_member_id,
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            email: member.email.clone(),
            member_type_id: member.member_type_id,
            status: member.status.clone(),
            expiration_date: member.expiration_date,
            milestone_date: member.milestone_date,
            date_joined: member.date_joined,
            date_inactivated: None,
            home_address: member.home_address.clone(),
            home_city: member.home_city.clone(),
            home_state: member.home_state.clone(),
            home_zip: member.home_zip.clone(),
            home_phone: member.home_phone.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn existing_member(first: &str, last: &str, status: MemberStatus, member_id: Option<i32>) -> MemberEntity {
        let now = Utc::now();
        MemberEntity {
            member_uuid: Uuid::new_v4(),
            member_id,
            preferred_member_id: member_id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            member_type_id: Uuid::new_v4(),
            status: status.as_str().to_string(),
            expiration_date: date(2025, 12, 31),
            milestone_date: None,
            date_joined: date(2020, 1, 1),
            date_inactivated: None,
            home_address: None,
            home_city: None,
            home_state: None,
            home_zip: None,
            home_phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_member(member_type_id: Uuid, member_id: Option<i32>) -> NewMemberModel {
        NewMemberModel {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            member_type_id,
            member_id,
            milestone_date: None,
            date_joined: None,
            start_date: None,
            home_address: None,
            home_city: None,
            home_state: Some("ca".to_string()),
            home_zip: Some("92101".to_string()),
            home_phone: None,
            initial_payment: None,
            expiration_override: None,
        }
    }

    fn type_repository(member_type: MemberTypeEntity) -> MockMemberTypeRepository {
        let mut member_type_repository = MockMemberTypeRepository::new();
        member_type_repository
            .expect_find_by_id()
            .with(eq(member_type.id))
            .returning(move |_| {
                let member_type = member_type.clone();
                Box::pin(async move { Ok(Some(member_type)) })
            });
        member_type_repository
    }

    fn active_ids(member_repository: &mut MockMemberRepository, ids: Vec<i32>) {
        member_repository
            .expect_list_active_member_ids()
            .returning(move || {
                let ids = ids.clone();
                Box::pin(async move { Ok(ids) })
            });
    }

    fn usecase(
        member_repository: MockMemberRepository,
        member_type_repository: MockMemberTypeRepository,
        payment_method_repository: MockPaymentMethodRepository,
    ) -> MemberUseCase<MockMemberRepository, MockMemberTypeRepository, MockPaymentMethodRepository> {
        MemberUseCase::new(
            Arc::new(member_repository),
            Arc::new(member_type_repository),
            Arc::new(payment_method_repository),
        )
    }

    #[tokio::test]
    async fn creates_member_with_explicit_id_and_initial_payment() {
        let member_type = member_type(3000);
        let method = payment_method();
        let method_id = method.id;
        let today = date(2025, 11, 20);

        let mut member_repository = MockMemberRepository::new();
        active_ids(&mut member_repository, vec![1, 2]);
        member_repository
            .expect_create_member()
            .withf(move |member, payment| {
                member.member_id == Some(42)
                    && member.preferred_member_id == Some(42)
                    && member.first_name == "Ada"
                    && member.home_state.as_deref() == Some("CA")
                    && member.expiration_date == date(2026, 2, 28)
                    && payment.as_ref().is_some_and(|p| p.amount_minor == 9000 && p.date == today)
            })
            .times(1)
            .returning(|member, _| {
                let created = stored(&member);
                Box::pin(async move { Ok((created, Some(Uuid::new_v4()))) })
            });

        let mut payment_method_repository = MockPaymentMethodRepository::new();
        payment_method_repository
            .expect_find_by_id()
            .with(eq(method_id))
            .returning(move |_| {
                let method = method.clone();
                Box::pin(async move { Ok(Some(method)) })
            });

        let mut model = new_member(member_type.id, Some(42));
        model.initial_payment = Some(InitialPaymentModel {
            payment_method_id: method_id,
            amount: "90.00".to_string(),
            receipt_number: "R-1001".to_string(),
            payment_date: None,
        });

        let created = usecase(member_repository, type_repository(member_type), payment_method_repository)
            .create_member(model, today)
            .await
            .unwrap();

        assert_eq!(created.member.member_id, Some(42));
        assert_eq!(created.member.status, MemberStatus::Active);
        assert!(created.initial_payment_id.is_some());
    }

    #[tokio::test]
    async fn new_member_without_payment_expires_at_end_of_start_month() {
        let member_type = member_type(3000);
        let mut member_repository = MockMemberRepository::new();
        active_ids(&mut member_repository, vec![]);
        member_repository
            .expect_create_member()
            .withf(|member, payment| {
                member.expiration_date == date(2025, 11, 30)
                    && member.member_id == Some(1)
                    && payment.is_none()
            })
            .returning(|member, _| {
                let created = stored(&member);
                Box::pin(async move { Ok((created, None)) })
            });

        let created = usecase(
            member_repository,
            type_repository(member_type.clone()),
            MockPaymentMethodRepository::new(),
        )
        .create_member(new_member(member_type.id, None), date(2025, 11, 15))
        .await
        .unwrap();

        assert_eq!(created.member.expiration_date, date(2025, 11, 30));
        assert_eq!(created.initial_payment_id, None);
    }

    #[tokio::test]
    async fn explicit_id_held_by_active_member_is_rejected() {
        let member_type = member_type(3000);
        let mut member_repository = MockMemberRepository::new();
        active_ids(&mut member_repository, vec![42]);
        member_repository.expect_create_member().never();

        let err = usecase(
            member_repository,
            type_repository(member_type.clone()),
            MockPaymentMethodRepository::new(),
        )
        .create_member(new_member(member_type.id, Some(42)), date(2025, 11, 15))
        .await
        .unwrap_err();

        assert!(matches!(err, MemberError::MemberIdInUse(42)));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn out_of_range_id_is_rejected_before_any_lookup() {
        let err = usecase(
            MockMemberRepository::new(),
            MockMemberTypeRepository::new(),
            MockPaymentMethodRepository::new(),
        )
        .create_member(new_member(Uuid::new_v4(), Some(1000)), date(2025, 11, 15))
        .await
        .unwrap_err();

        assert!(matches!(err, MemberError::MemberIdOutOfRange(1000)));
    }

    #[tokio::test]
    async fn auto_assigned_id_is_retried_after_concurrent_conflict() {
        let member_type = member_type(3000);
        let mut member_repository = MockMemberRepository::new();
        let pool_loads = Arc::new(AtomicUsize::new(0));
        let inserts = Arc::new(AtomicUsize::new(0));

        member_repository
            .expect_list_active_member_ids()
            .times(2)
            .returning(move || {
                let ids = match pool_loads.fetch_add(1, Ordering::SeqCst) {
                    0 => vec![1, 2],
                    _ => vec![1, 2, 3],
                };
                Box::pin(async move { Ok(ids) })
            });
        member_repository
            .expect_create_member()
            .times(2)
            .returning(move |member, _| {
                let attempt = inserts.fetch_add(1, Ordering::SeqCst);
                let created = stored(&member);
                Box::pin(async move {
                    match attempt {
                        0 => {
                            assert_eq!(created.member_id, Some(3));
                            Err(MemberIdTaken { member_id: Some(3) }.into())
                        }
                        _ => Ok((created, None)),
                    }
                })
            });

        let created = usecase(
            member_repository,
            type_repository(member_type.clone()),
            MockPaymentMethodRepository::new(),
        )
        .create_member(new_member(member_type.id, None), date(2025, 11, 15))
        .await
        .unwrap();

        assert_eq!(created.member.member_id, Some(4));
    }

    #[tokio::test]
    async fn exhausted_pool_is_a_business_error() {
        let member_type = member_type(3000);
        let mut member_repository = MockMemberRepository::new();
        active_ids(&mut member_repository, (MIN_MEMBER_ID..=MAX_MEMBER_ID).collect());
        member_repository.expect_create_member().never();

        let err = usecase(
            member_repository,
            type_repository(member_type.clone()),
            MockPaymentMethodRepository::new(),
        )
        .create_member(new_member(member_type.id, None), date(2025, 11, 15))
        .await
        .unwrap_err();

        assert!(matches!(err, MemberError::NoMemberIdsAvailable));
    }

    #[tokio::test]
    async fn invalid_contact_fields_are_rejected() {
        let mut model = new_member(Uuid::new_v4(), None);
        model.home_zip = Some("ABCDE".to_string());

        let err = usecase(
            MockMemberRepository::new(),
            MockMemberTypeRepository::new(),
            MockPaymentMethodRepository::new(),
        )
        .create_member(model, date(2025, 11, 15))
        .await
        .unwrap_err();

        assert!(matches!(err, MemberError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn payment_without_receipt_is_rejected() {
        let member_type = member_type(3000);
        let mut model = new_member(member_type.id, None);
        model.initial_payment = Some(InitialPaymentModel {
            payment_method_id: Uuid::new_v4(),
            amount: "30".to_string(),
            receipt_number: "  ".to_string(),
            payment_date: None,
        });

        let err = usecase(
            MockMemberRepository::new(),
            type_repository(member_type),
            MockPaymentMethodRepository::new(),
        )
        .create_member(model, date(2025, 11, 15))
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Receipt number is required");
    }

    #[tokio::test]
    async fn duplicates_are_reported_once_with_name_priority() {
        let ada = {
            let mut member = existing_member("Ada", "Lovelace", MemberStatus::Inactive, None);
            member.email = Some("ada@example.com".to_string());
            member
        };
        let ada_uuid = ada.member_uuid;

        let mut member_repository = MockMemberRepository::new();
        member_repository
            .expect_find_duplicate_candidates()
            .returning(move |_| {
                let ada = ada.clone();
                Box::pin(async move { Ok(vec![ada]) })
            });

        let matches = usecase(
            member_repository,
            MockMemberTypeRepository::new(),
            MockPaymentMethodRepository::new(),
        )
        .check_duplicates(DuplicateCandidate {
            first_name: "ADA".to_string(),
            last_name: "lovelace".to_string(),
            email: Some("Ada@Example.com".to_string()),
            phone: None,
        })
        .await
        .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].member.member_uuid, ada_uuid);
        assert_eq!(matches[0].match_reason, MatchReason::Name);
    }

    #[tokio::test]
    async fn empty_duplicate_candidate_skips_lookup() {
        let mut member_repository = MockMemberRepository::new();
        member_repository.expect_find_duplicate_candidates().never();

        let matches = usecase(
            member_repository,
            MockMemberTypeRepository::new(),
            MockPaymentMethodRepository::new(),
        )
        .check_duplicates(DuplicateCandidate::default())
        .await
        .unwrap();

        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn inactive_members_cannot_be_edited() {
        let member = existing_member("Grace", "Hopper", MemberStatus::Inactive, None);
        let member_uuid = member.member_uuid;

        let mut member_repository = MockMemberRepository::new();
        member_repository
            .expect_find_by_uuid()
            .with(eq(member_uuid))
            .returning(move |_| {
                let member = member.clone();
                Box::pin(async move { Ok(Some(member)) })
            });
        member_repository.expect_update_active_member().never();

        let err = usecase(
            member_repository,
            MockMemberTypeRepository::new(),
            MockPaymentMethodRepository::new(),
        )
        .update_member(
            member_uuid,
            UpdateMemberModel {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: None,
                member_type_id: Uuid::new_v4(),
                member_id: 7,
                milestone_date: None,
                home_address: None,
                home_city: None,
                home_state: None,
                home_zip: None,
                home_phone: None,
                expiration_override: None,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MemberError::MemberNotActive));
    }

    #[tokio::test]
    async fn edit_keeps_own_id_and_snaps_override() {
        let member_type = member_type(3000);
        let member = existing_member("Grace", "Hopper", MemberStatus::Active, Some(7));
        let member_uuid = member.member_uuid;

        let mut member_repository = MockMemberRepository::new();
        let found = member.clone();
        member_repository
            .expect_find_by_uuid()
            .returning(move |_| {
                let member = found.clone();
                Box::pin(async move { Ok(Some(member)) })
            });
        member_repository.expect_list_active_member_ids().never();
        member_repository
            .expect_update_active_member()
            .withf(move |uuid, changes| {
                *uuid == member_uuid
                    && changes.member_id == Some(Some(7))
                    && changes.expiration_date == Some(date(2026, 6, 30))
            })
            .returning(move |_, changes| {
                let mut updated = member.clone();
                updated.expiration_date = changes.expiration_date.unwrap_or(updated.expiration_date);
                Box::pin(async move { Ok(updated) })
            });

        let updated = usecase(
            member_repository,
            type_repository(member_type.clone()),
            MockPaymentMethodRepository::new(),
        )
        .update_member(
            member_uuid,
            UpdateMemberModel {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email: None,
                member_type_id: member_type.id,
                member_id: 7,
                milestone_date: None,
                home_address: None,
                home_city: None,
                home_state: None,
                home_zip: None,
                home_phone: None,
                expiration_override: Some(date(2026, 6, 3)),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.expiration_date, date(2026, 6, 30));
    }

    #[tokio::test]
    async fn new_member_preview_uses_end_of_start_month() {
        let member_type = member_type(3000);

        let preview = usecase(
            MockMemberRepository::new(),
            type_repository(member_type.clone()),
            MockPaymentMethodRepository::new(),
        )
        .preview_new_member_expiration(
            NewMemberExpirationPreviewModel {
                member_type_id: member_type.id,
                amount: Some("15.00".to_string()),
                start_date: Some(date(2025, 11, 15)),
                override_expiration: None,
            },
            date(2025, 11, 1),
        )
        .await
        .unwrap();

        assert_eq!(preview.new_expiration, date(2025, 11, 30));
        assert_eq!(preview.months_purchased, 0);
        assert_eq!(preview.suggested_amount, "30.00");
    }
}
