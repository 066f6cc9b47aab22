use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{announcement, class};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::announcement::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every announcement read: school-wide rows
/// plus rows for classes in the viewer's scope.
fn scope_condition(viewer: &Viewer) -> Condition {
    let global = announcement::Column::ClassId.is_null();
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            Condition::any()
                .add(global)
                .add(
                    announcement::Column::ClassId
                        .in_subquery(scope::class_ids_for_teacher(viewer.user_id)),
                )
                .add(
                    announcement::Column::ClassId
                        .in_subquery(scope::supervised_class_ids(viewer.user_id)),
                ),
        ),
        Role::Student => Condition::all().add(
            Condition::any().add(global).add(
                announcement::Column::ClassId
                    .in_subquery(scope::class_id_for_student(viewer.user_id)),
            ),
        ),
        Role::Parent => Condition::all().add(
            Condition::any().add(global).add(
                announcement::Column::ClassId
                    .in_subquery(scope::class_ids_for_parent(viewer.user_id)),
            ),
        ),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Announcements",
    operation_id = "createAnnouncement",
    summary = "Publish an announcement",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement published", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Referenced class missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(title = %payload.title))]
pub async fn create_announcement(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Announcement)?;
    validate_create_announcement(&payload)?;

    let new_announcement = announcement::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        date: Set(chrono::Utc::now()),
        class_id: Set(payload.class_id),
        ..Default::default()
    };

    let model = new_announcement
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(AnnouncementResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Announcements",
    operation_id = "listAnnouncements",
    summary = "List announcements",
    description = "One page of announcements, newest first, restricted to school-wide rows and rows for classes in the viewer's scope.",
    params(AnnouncementListQuery),
    responses(
        (status = 200, description = "List of announcements", body = AnnouncementListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_announcements(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<AnnouncementListQuery>,
) -> Result<Json<AnnouncementListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = announcement::Entity::find()
        .join(JoinType::LeftJoin, announcement::Relation::Class.def())
        .filter(scope_condition(&viewer));

    if let Some(class_id) = query.class_id {
        select = select.filter(announcement::Column::ClassId.eq(class_id));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(ci_contains(
                (announcement::Entity, announcement::Column::Title),
                term,
            ));
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_desc(announcement::Column::Date)
        .select_only()
        .column(announcement::Column::Id)
        .column(announcement::Column::Title)
        .column(announcement::Column::Description)
        .column(announcement::Column::Date)
        .column(announcement::Column::ClassId)
        .column_as(class::Column::Name, "class_name")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<AnnouncementListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(AnnouncementListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Announcements",
    operation_id = "getAnnouncement",
    summary = "Get an announcement by ID",
    params(("id" = i32, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement details", body = AnnouncementResponse),
        (status = 404, description = "Announcement not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_announcement(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AnnouncementResponse>, AppError> {
    let model = announcement::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Announcements",
    operation_id = "updateAnnouncement",
    summary = "Update an announcement",
    description = "PATCH semantics. `class_id` supports three-state updates: omit to leave unchanged, null to make school-wide, value to set.",
    params(("id" = i32, Path, description = "Announcement ID")),
    request_body = UpdateAnnouncementRequest,
    responses(
        (status = 200, description = "Announcement updated", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Announcement not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Referenced class missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_announcement(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAnnouncementRequest>,
) -> Result<Json<AnnouncementResponse>, AppError> {
    viewer.require_update(EntityKind::Announcement)?;
    validate_update_announcement(&payload)?;

    if payload == UpdateAnnouncementRequest::default() {
        let existing = find_announcement(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_announcement_for_update(&txn, id).await?;
    let mut active: announcement::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    match payload.class_id {
        Some(Some(class_id)) => active.class_id = Set(Some(class_id)),
        Some(None) => active.class_id = Set(None),
        None => {}
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Announcements",
    operation_id = "deleteAnnouncement",
    summary = "Delete an announcement",
    params(("id" = i32, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Announcement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_announcement(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Announcement)?;

    let txn = state.db.begin().await?;
    find_announcement_for_update(&txn, id).await?;

    announcement::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_announcement<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<announcement::Model, AppError> {
    announcement::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
}

async fn find_announcement_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<announcement::Model, AppError> {
    use sea_orm::sea_query::LockType;
    announcement::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
}
