use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{class, event};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::event::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains, validate_time_window};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every event read: school-wide rows plus
/// rows for classes in the viewer's scope.
fn scope_condition(viewer: &Viewer) -> Condition {
    let global = event::Column::ClassId.is_null();
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            Condition::any()
                .add(global)
                .add(
                    event::Column::ClassId
                        .in_subquery(scope::class_ids_for_teacher(viewer.user_id)),
                )
                .add(
                    event::Column::ClassId.in_subquery(scope::supervised_class_ids(viewer.user_id)),
                ),
        ),
        Role::Student => Condition::all().add(
            Condition::any().add(global).add(
                event::Column::ClassId.in_subquery(scope::class_id_for_student(viewer.user_id)),
            ),
        ),
        Role::Parent => Condition::all().add(
            Condition::any().add(global).add(
                event::Column::ClassId.in_subquery(scope::class_ids_for_parent(viewer.user_id)),
            ),
        ),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create a calendar event",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Referenced class missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(title = %payload.title))]
pub async fn create_event(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Event)?;
    validate_create_event(&payload)?;

    let new_event = event::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        class_id: Set(payload.class_id),
        ..Default::default()
    };

    let model = new_event
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "One page of events, restricted to school-wide rows and rows for classes in the viewer's scope. `date` restricts to events starting on that day (the calendar widget's query).",
    params(EventListQuery),
    responses(
        (status = 200, description = "List of events", body = EventListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_events(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = event::Entity::find()
        .join(JoinType::LeftJoin, event::Relation::Class.def())
        .filter(scope_condition(&viewer));

    if let Some(class_id) = query.class_id {
        select = select.filter(event::Column::ClassId.eq(class_id));
    }
    if let Some(date) = query.date {
        select = select.filter(day_window(event::Column::StartTime, date));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(ci_contains((event::Entity, event::Column::Title), term));
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(event::Column::StartTime)
        .select_only()
        .column(event::Column::Id)
        .column(event::Column::Title)
        .column(event::Column::Description)
        .column(event::Column::StartTime)
        .column(event::Column::EndTime)
        .column(event::Column::ClassId)
        .column_as(class::Column::Name, "class_name")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<EventListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(EventListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_event(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let model = event::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "PATCH semantics. The time window is re-validated against stored values when only one bound changes; the end must stay strictly after the start.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Referenced class missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_event(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    viewer.require_update(EntityKind::Event)?;
    validate_update_event(&payload)?;

    if payload == UpdateEventRequest::default() {
        let existing = find_event(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;

    let effective_start = payload.start_time.unwrap_or(existing.start_time);
    let effective_end = payload.end_time.unwrap_or(existing.end_time);
    validate_time_window(effective_start, effective_end, "start time", "end time")?;

    let mut active: event::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(start_time) = payload.start_time {
        active.start_time = Set(start_time);
    }
    if let Some(end_time) = payload.end_time {
        active.end_time = Set(end_time);
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
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_event(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Event)?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, id).await?;

    event::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Predicate matching timestamps that fall on the given calendar day (UTC).
fn day_window(column: event::Column, date: NaiveDate) -> Condition {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = start + chrono::Duration::days(1);
    Condition::all().add(column.gte(start)).add(column.lt(end))
}

async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    use sea_orm::sea_query::LockType;
    event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}
