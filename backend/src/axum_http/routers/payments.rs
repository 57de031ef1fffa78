use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            member_types::MemberTypeRepository, members::MemberRepository,
            payment_methods::PaymentMethodRepository, payments::PaymentRepository,
        },
        value_objects::payments::{ExpirationPreviewModel, NewPaymentModel, PaymentHistoryFilter},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            member_types::MemberTypePostgres, members::MemberPostgres,
            payment_methods::PaymentMethodPostgres, payments::PaymentPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    axum_http::{error_responses::AppError, today},
    usecases::payments::PaymentUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let member_repository = MemberPostgres::new(Arc::clone(&db_pool));
    let member_type_repository = MemberTypePostgres::new(Arc::clone(&db_pool));
    let payment_method_repository = PaymentMethodPostgres::new(Arc::clone(&db_pool));
    let payment_repository = PaymentPostgres::new(Arc::clone(&db_pool));

    let payment_usecase = PaymentUseCase::new(
        Arc::new(member_repository),
        Arc::new(member_type_repository),
        Arc::new(payment_method_repository),
        Arc::new(payment_repository),
    );

    Router::new()
        .route("/", post(record_payment))
        .route("/members/:member_uuid", get(payment_history))
        .route("/members/:member_uuid/preview", post(preview_expiration))
        .with_state(Arc::new(payment_usecase))
}

pub async fn record_payment<M, T, P, Pay>(
    State(payment_usecase): State<Arc<PaymentUseCase<M, T, P, Pay>>>,
    Json(new_payment_model): Json<NewPaymentModel>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    let outcome = payment_usecase
        .record_payment(new_payment_model, today())
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn payment_history<M, T, P, Pay>(
    State(payment_usecase): State<Arc<PaymentUseCase<M, T, P, Pay>>>,
    Path(member_uuid): Path<Uuid>,
    Query(filter): Query<PaymentHistoryFilter>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    let history = payment_usecase.payment_history(member_uuid, filter).await?;
    Ok(Json(history))
}

pub async fn preview_expiration<M, T, P, Pay>(
    State(payment_usecase): State<Arc<PaymentUseCase<M, T, P, Pay>>>,
    Path(member_uuid): Path<Uuid>,
    Json(preview_model): Json<ExpirationPreviewModel>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
    Pay: PaymentRepository + Send + Sync + 'static,
{
    let preview = payment_usecase
        .preview_expiration(member_uuid, preview_model)
        .await?;
    Ok(Json(preview))
}
