use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::{
        member_types::MemberTypeRepository, payment_methods::PaymentMethodRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{member_types::MemberTypePostgres, payment_methods::PaymentMethodPostgres},
    },
};

use crate::{axum_http::error_responses::AppError, usecases::reference_data::ReferenceDataUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let member_type_repository = MemberTypePostgres::new(Arc::clone(&db_pool));
    let payment_method_repository = PaymentMethodPostgres::new(Arc::clone(&db_pool));
    let reference_data_usecase = ReferenceDataUseCase::new(
        Arc::new(member_type_repository),
        Arc::new(payment_method_repository),
    );

    Router::new()
        .route("/member-types", get(list_member_types))
        .route("/payment-methods", get(list_payment_methods))
        .with_state(Arc::new(reference_data_usecase))
}

pub async fn list_member_types<T, P>(
    State(reference_data_usecase): State<Arc<ReferenceDataUseCase<T, P>>>,
) -> Result<impl IntoResponse, AppError>
where
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let member_types = reference_data_usecase.list_member_types().await?;
    Ok(Json(member_types))
}

pub async fn list_payment_methods<T, P>(
    State(reference_data_usecase): State<Arc<ReferenceDataUseCase<T, P>>>,
) -> Result<impl IntoResponse, AppError>
where
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let payment_methods = reference_data_usecase.list_payment_methods().await?;
    Ok(Json(payment_methods))
}
