use axum::Json;
use axum::extract::State;
use common::Role;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{Sex, admin, parent, student, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::models::overview::{OverviewResponse, SexBreakdown};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/overview",
    tag = "Overview",
    operation_id = "overview",
    summary = "Dashboard widget data",
    description = "Per-role user counts and the student sex breakdown, read in one consistent snapshot. Admin only.",
    responses(
        (status = 200, description = "Dashboard counts", body = OverviewResponse),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer))]
pub async fn overview(
    viewer: Viewer,
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, AppError> {
    if viewer.role != Role::Admin {
        return Err(AppError::PermissionDenied);
    }

    let txn = state.db.begin().await?;
    let admins = admin::Entity::find().count(&txn).await?;
    let teachers = teacher::Entity::find().count(&txn).await?;
    let students = student::Entity::find().count(&txn).await?;
    let parents = parent::Entity::find().count(&txn).await?;
    let male = student::Entity::find()
        .filter(student::Column::Sex.eq(Sex::Male))
        .count(&txn)
        .await?;
    let female = student::Entity::find()
        .filter(student::Column::Sex.eq(Sex::Female))
        .count(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(OverviewResponse {
        admins,
        teachers,
        students,
        parents,
        student_sex: SexBreakdown { male, female },
    }))
}
