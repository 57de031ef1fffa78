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
            payment_methods::PaymentMethodRepository,
        },
        value_objects::{
            duplicates::DuplicateCandidate,
            members::{MemberSearchFilter, NewMemberModel, UpdateMemberModel},
            payments::NewMemberExpirationPreviewModel,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            member_types::MemberTypePostgres, members::MemberPostgres,
            payment_methods::PaymentMethodPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    axum_http::{error_responses::AppError, today},
    config::config_model::DotEnvyConfig,
    usecases::{member_ids::MemberIdUseCase, members::MemberUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let member_repository = Arc::new(MemberPostgres::new(Arc::clone(&db_pool)));
    let member_type_repository = Arc::new(MemberTypePostgres::new(Arc::clone(&db_pool)));
    let payment_method_repository = Arc::new(PaymentMethodPostgres::new(Arc::clone(&db_pool)));

    let member_usecase = MemberUseCase::new(
        Arc::clone(&member_repository),
        member_type_repository,
        payment_method_repository,
    );
    let member_id_usecase = MemberIdUseCase::new(
        member_repository,
        config.membership.member_id_suggestion_count,
    );

    let member_id_routes = Router::new()
        .route("/ids/suggestions", get(suggest_member_ids))
        .route("/ids/status", get(member_id_pool_status))
        .route("/ids/:member_id/availability", get(check_member_id_availability))
        .with_state(Arc::new(member_id_usecase));

    Router::new()
        .route("/", post(create_member).get(search_members))
        .route("/duplicates", post(check_duplicates))
        .route("/expiration-preview", post(preview_new_member_expiration))
        .route("/:member_uuid", get(get_member).put(update_member))
        .with_state(Arc::new(member_usecase))
        .merge(member_id_routes)
}

pub async fn create_member<M, T, P>(
    State(member_usecase): State<Arc<MemberUseCase<M, T, P>>>,
    Json(new_member_model): Json<NewMemberModel>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let created = member_usecase.create_member(new_member_model, today()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_members<M, T, P>(
    State(member_usecase): State<Arc<MemberUseCase<M, T, P>>>,
    Query(filter): Query<MemberSearchFilter>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let members = member_usecase.search_members(filter).await?;
    Ok(Json(members))
}

pub async fn check_duplicates<M, T, P>(
    State(member_usecase): State<Arc<MemberUseCase<M, T, P>>>,
    Json(candidate): Json<DuplicateCandidate>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let matches = member_usecase.check_duplicates(candidate).await?;
    Ok(Json(matches))
}

pub async fn preview_new_member_expiration<M, T, P>(
    State(member_usecase): State<Arc<MemberUseCase<M, T, P>>>,
    Json(preview_model): Json<NewMemberExpirationPreviewModel>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let preview = member_usecase
        .preview_new_member_expiration(preview_model, today())
        .await?;
    Ok(Json(preview))
}

pub async fn get_member<M, T, P>(
    State(member_usecase): State<Arc<MemberUseCase<M, T, P>>>,
    Path(member_uuid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let member = member_usecase.get_member(member_uuid).await?;
    Ok(Json(member))
}

pub async fn update_member<M, T, P>(
    State(member_usecase): State<Arc<MemberUseCase<M, T, P>>>,
    Path(member_uuid): Path<Uuid>,
    Json(update_member_model): Json<UpdateMemberModel>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
    T: MemberTypeRepository + Send + Sync + 'static,
    P: PaymentMethodRepository + Send + Sync + 'static,
{
    let member = member_usecase
        .update_member(member_uuid, update_member_model)
        .await?;
    Ok(Json(member))
}

pub async fn suggest_member_ids<M>(
    State(member_id_usecase): State<Arc<MemberIdUseCase<M>>>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let suggestion = member_id_usecase.suggest_member_ids().await?;
    Ok(Json(suggestion))
}

pub async fn member_id_pool_status<M>(
    State(member_id_usecase): State<Arc<MemberIdUseCase<M>>>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let status = member_id_usecase.pool_status().await?;
    Ok(Json(status))
}

pub async fn check_member_id_availability<M>(
    State(member_id_usecase): State<Arc<MemberIdUseCase<M>>>,
    Path(member_id): Path<i32>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let availability = member_id_usecase.check_availability(member_id).await?;
    Ok(Json(availability))
}
