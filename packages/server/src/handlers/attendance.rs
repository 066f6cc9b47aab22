use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{attendance, class, lesson, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::handlers::lesson::require_owned_lesson;
use crate::models::attendance::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every attendance read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            attendance::Column::LessonId.in_subquery(scope::lesson_ids_for_teacher(viewer.user_id)),
        ),
        Role::Student => Condition::all().add(attendance::Column::StudentId.eq(viewer.user_id)),
        Role::Parent => Condition::all().add(
            attendance::Column::StudentId
                .in_subquery(scope::student_ids_for_parent(viewer.user_id)),
        ),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Attendance",
    operation_id = "createAttendance",
    summary = "Record attendance",
    description = "Teachers may only record attendance for their own lessons.",
    request_body = CreateAttendanceRequest,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(lesson_id = payload.lesson_id))]
pub async fn create_attendance(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAttendanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Attendance)?;
    validate_create_attendance(&payload)?;

    require_owned_lesson(&state.db, &viewer, payload.lesson_id).await?;

    let new_attendance = attendance::ActiveModel {
        date: Set(payload.date),
        present: Set(payload.present),
        student_id: Set(payload.student_id),
        lesson_id: Set(payload.lesson_id),
        ..Default::default()
    };

    let model = new_attendance
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(AttendanceResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Attendance",
    operation_id = "listAttendance",
    summary = "List attendance records",
    description = "One page of attendance records with the student, lesson and class, restricted to the viewer's scope. The scope always wins: a teacher supplying another teacher's `class_id` gets the intersection, which is empty.",
    params(AttendanceListQuery),
    responses(
        (status = 200, description = "List of attendance records", body = AttendanceListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_attendance(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<AttendanceListQuery>,
) -> Result<Json<AttendanceListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = attendance::Entity::find()
        .join(JoinType::InnerJoin, attendance::Relation::Student.def())
        .join(JoinType::InnerJoin, attendance::Relation::Lesson.def())
        .join(JoinType::InnerJoin, lesson::Relation::Class.def())
        .filter(scope_condition(&viewer));

    if let Some(student_id) = query.student_id {
        select = select.filter(attendance::Column::StudentId.eq(student_id));
    }
    if let Some(lesson_id) = query.lesson_id {
        select = select.filter(attendance::Column::LessonId.eq(lesson_id));
    }
    if let Some(class_id) = query.class_id {
        select = select.filter(lesson::Column::ClassId.eq(class_id));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(ci_contains((class::Entity, class::Column::Name), term));
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_desc(attendance::Column::Date)
        .order_by_asc(attendance::Column::Id)
        .select_only()
        .column(attendance::Column::Id)
        .column(attendance::Column::Date)
        .column(attendance::Column::Present)
        .column_as(student::Column::Name, "student_name")
        .column_as(student::Column::Surname, "student_surname")
        .column_as(lesson::Column::Name, "lesson_name")
        .column_as(class::Column::Name, "class_name")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<AttendanceListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(AttendanceListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Attendance",
    operation_id = "getAttendance",
    summary = "Get an attendance record by ID",
    params(("id" = i32, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance details", body = AttendanceResponse),
        (status = 404, description = "Record not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_attendance(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AttendanceResponse>, AppError> {
    let model = attendance::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Attendance",
    operation_id = "updateAttendance",
    summary = "Update an attendance record",
    description = "PATCH semantics: only provided fields change.",
    params(("id" = i32, Path, description = "Attendance record ID")),
    request_body = UpdateAttendanceRequest,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Record not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_attendance(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAttendanceRequest>,
) -> Result<Json<AttendanceResponse>, AppError> {
    viewer.require_update(EntityKind::Attendance)?;

    if payload == UpdateAttendanceRequest::default() {
        let existing = find_attendance(&state.db, id).await?;
        require_owned_lesson(&state.db, &viewer, existing.lesson_id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_attendance_for_update(&txn, id).await?;

    require_owned_lesson(&txn, &viewer, existing.lesson_id).await?;
    if let Some(lesson_id) = payload.lesson_id
        && lesson_id != existing.lesson_id
    {
        require_owned_lesson(&txn, &viewer, lesson_id).await?;
    }

    let mut active: attendance::ActiveModel = existing.into();

    if let Some(date) = payload.date {
        active.date = Set(date);
    }
    if let Some(present) = payload.present {
        active.present = Set(present);
    }
    if let Some(student_id) = payload.student_id {
        active.student_id = Set(student_id);
    }
    if let Some(lesson_id) = payload.lesson_id {
        active.lesson_id = Set(lesson_id);
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Attendance",
    operation_id = "deleteAttendance",
    summary = "Delete an attendance record",
    params(("id" = i32, Path, description = "Attendance record ID")),
    responses(
        (status = 204, description = "Attendance deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Record not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_attendance(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Attendance)?;

    let txn = state.db.begin().await?;
    let existing = find_attendance_for_update(&txn, id).await?;
    require_owned_lesson(&txn, &viewer, existing.lesson_id).await?;

    attendance::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_attendance<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<attendance::Model, AppError> {
    attendance::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
}

async fn find_attendance_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<attendance::Model, AppError> {
    use sea_orm::sea_query::LockType;
    attendance::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
}
