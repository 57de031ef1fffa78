use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::members::MemberRepository,
        value_objects::members::MemberSelectionModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::members::MemberPostgres,
    },
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    axum_http::{
        admin_auth::{AdminToken, AdminTokenSource},
        error_responses::AppError,
        today,
    },
    config::config_model::DotEnvyConfig,
    usecases::lifecycle::LifecycleUseCase,
};

pub struct LifecycleState<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    pub lifecycle_usecase: LifecycleUseCase<M>,
    pub grace_period_days: i64,
    pub admin_api_token: Option<String>,
}

impl<M> AdminTokenSource for LifecycleState<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    fn admin_api_token(&self) -> Option<&str> {
        self.admin_api_token.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DeactivationQuery {
    pub grace_period_days: Option<i64>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DryRunQuery {
    #[serde(default)]
    pub dry_run: bool,
}

fn lifecycle_state(
    db_pool: Arc<PgPoolSquad>,
    config: &DotEnvyConfig,
) -> Arc<LifecycleState<MemberPostgres>> {
    let member_repository = MemberPostgres::new(Arc::clone(&db_pool));
    Arc::new(LifecycleState {
        lifecycle_usecase: LifecycleUseCase::new(Arc::new(member_repository)),
        grace_period_days: config.membership.grace_period_days,
        admin_api_token: config.admin.api_token.clone(),
    })
}

/// Staff-facing lifecycle actions.
pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    Router::new()
        .route("/candidates", get(list_deactivation_candidates))
        .route("/deactivate", post(deactivate_selected))
        .route("/deceased", post(mark_deceased))
        .route("/members/:member_uuid/deactivate", post(deactivate_member))
        .route("/members/:member_uuid/deceased", post(mark_member_deceased))
        .route("/members/:member_uuid/reactivate", post(reactivate_member))
        .with_state(lifecycle_state(db_pool, &config))
}

/// Token-protected maintenance endpoints meant for schedulers and operators.
pub fn admin_routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    Router::new()
        .route("/deactivate-expired", post(deactivate_expired_members))
        .route("/reinstate/:member_uuid", post(reinstate_member))
        .with_state(lifecycle_state(db_pool, &config))
}

pub async fn list_deactivation_candidates<M>(
    State(state): State<Arc<LifecycleState<M>>>,
    Query(query): Query<DeactivationQuery>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let grace_period_days = query.grace_period_days.unwrap_or(state.grace_period_days);
    let candidates = state
        .lifecycle_usecase
        .list_deactivation_candidates(today(), grace_period_days)
        .await?;
    Ok(Json(candidates))
}

pub async fn deactivate_selected<M>(
    State(state): State<Arc<LifecycleState<M>>>,
    Json(selection): Json<MemberSelectionModel>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let outcomes = state
        .lifecycle_usecase
        .deactivate_selected(selection.member_uuids, today(), state.grace_period_days)
        .await?;
    Ok(Json(outcomes))
}

pub async fn deactivate_member<M>(
    State(state): State<Arc<LifecycleState<M>>>,
    Path(member_uuid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let outcome = state
        .lifecycle_usecase
        .deactivate_member(member_uuid, today(), state.grace_period_days)
        .await?;
    Ok(Json(outcome))
}

pub async fn mark_deceased<M>(
    State(state): State<Arc<LifecycleState<M>>>,
    Json(selection): Json<MemberSelectionModel>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let outcomes = state
        .lifecycle_usecase
        .mark_deceased(selection.member_uuids, today())
        .await?;
    Ok(Json(outcomes))
}

pub async fn mark_member_deceased<M>(
    State(state): State<Arc<LifecycleState<M>>>,
    Path(member_uuid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let outcomes = state
        .lifecycle_usecase
        .mark_deceased(vec![member_uuid], today())
        .await?;
    Ok(Json(outcomes))
}

pub async fn reactivate_member<M>(
    State(state): State<Arc<LifecycleState<M>>>,
    Path(member_uuid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let reinstatement = state
        .lifecycle_usecase
        .reactivate_member(member_uuid, false)
        .await?;
    Ok(Json(reinstatement))
}

pub async fn deactivate_expired_members<M>(
    _: AdminToken,
    State(state): State<Arc<LifecycleState<M>>>,
    Query(query): Query<DeactivationQuery>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    let grace_period_days = query.grace_period_days.unwrap_or(state.grace_period_days);
    info!(grace_period_days, dry_run = query.dry_run, "admin: deactivate-expired requested");

    let report = state
        .lifecycle_usecase
        .deactivate_expired_members(today(), grace_period_days, query.dry_run)
        .await?;
    Ok(Json(report))
}

pub async fn reinstate_member<M>(
    _: AdminToken,
    State(state): State<Arc<LifecycleState<M>>>,
    Path(member_uuid): Path<Uuid>,
    Query(query): Query<DryRunQuery>,
) -> Result<impl IntoResponse, AppError>
where
    M: MemberRepository + Send + Sync + 'static,
{
    info!(%member_uuid, dry_run = query.dry_run, "admin: reinstatement requested");
    let reinstatement = state
        .lifecycle_usecase
        .reactivate_member(member_uuid, query.dry_run)
        .await?;
    Ok(Json(reinstatement))
}
