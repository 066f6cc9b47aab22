use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{assignment, attendance, class, exam, lesson, subject, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::lesson::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains, validate_time_window};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every lesson read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(lesson::Column::TeacherId.eq(viewer.user_id)),
        Role::Student => Condition::all()
            .add(lesson::Column::ClassId.in_subquery(scope::class_id_for_student(viewer.user_id))),
        Role::Parent => Condition::all()
            .add(lesson::Column::ClassId.in_subquery(scope::class_ids_for_parent(viewer.user_id))),
        Role::None => scope::nothing(),
    }
}

/// Load a lesson and ensure a teacher viewer owns it.
///
/// A missing lesson is a submission conflict (dangling reference), an
/// existing lesson taught by somebody else is a permission failure.
pub(crate) async fn require_owned_lesson<C: ConnectionTrait>(
    db: &C,
    viewer: &Viewer,
    lesson_id: i32,
) -> Result<lesson::Model, AppError> {
    let model = lesson::Entity::find_by_id(lesson_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Conflict("Referenced lesson does not exist".into()))?;
    if viewer.role == Role::Teacher && model.teacher_id != viewer.user_id {
        return Err(AppError::PermissionDenied);
    }
    Ok(model)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Lessons",
    operation_id = "createLesson",
    summary = "Create a lesson",
    description = "Admins may schedule lessons for anyone; a teacher may only create lessons for themself.",
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(name = %payload.name))]
pub async fn create_lesson(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Lesson)?;
    validate_create_lesson(&payload)?;

    if viewer.role == Role::Teacher && payload.teacher_id != viewer.user_id {
        return Err(AppError::PermissionDenied);
    }

    let new_lesson = lesson::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        subject_id: Set(payload.subject_id),
        class_id: Set(payload.class_id),
        teacher_id: Set(payload.teacher_id),
        ..Default::default()
    };

    let model = new_lesson
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(LessonResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Lessons",
    operation_id = "listLessons",
    summary = "List lessons",
    description = "One page of lessons with their subject, class and teacher names, restricted to the viewer's scope.",
    params(LessonListQuery),
    responses(
        (status = 200, description = "List of lessons", body = LessonListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_lessons(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<LessonListQuery>,
) -> Result<Json<LessonListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = lesson::Entity::find()
        .join(JoinType::InnerJoin, lesson::Relation::Subject.def())
        .join(JoinType::InnerJoin, lesson::Relation::Class.def())
        .join(JoinType::InnerJoin, lesson::Relation::Teacher.def())
        .filter(scope_condition(&viewer));

    if let Some(teacher_id) = query.teacher_id {
        select = select.filter(lesson::Column::TeacherId.eq(teacher_id));
    }
    if let Some(class_id) = query.class_id {
        select = select.filter(lesson::Column::ClassId.eq(class_id));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((lesson::Entity, lesson::Column::Name), term))
                    .add(ci_contains((subject::Entity, subject::Column::Name), term)),
            );
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(lesson::Column::StartTime)
        .select_only()
        .column(lesson::Column::Id)
        .column(lesson::Column::Name)
        .column(lesson::Column::StartTime)
        .column(lesson::Column::EndTime)
        .column_as(subject::Column::Name, "subject_name")
        .column_as(class::Column::Name, "class_name")
        .column_as(teacher::Column::Name, "teacher_name")
        .column_as(teacher::Column::Surname, "teacher_surname")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<LessonListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(LessonListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Lessons",
    operation_id = "getLesson",
    summary = "Get a lesson by ID",
    params(("id" = i32, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson details", body = LessonResponse),
        (status = 404, description = "Lesson not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_lesson(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LessonResponse>, AppError> {
    let model = lesson::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Lessons",
    operation_id = "updateLesson",
    summary = "Update a lesson",
    description = "PATCH semantics. The time window is re-validated against stored values when only one bound changes. Teachers may only touch their own lessons and cannot hand them to someone else.",
    params(("id" = i32, Path, description = "Lesson ID")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated", body = LessonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Lesson not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_lesson(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateLessonRequest>,
) -> Result<Json<LessonResponse>, AppError> {
    viewer.require_update(EntityKind::Lesson)?;
    validate_update_lesson(&payload)?;

    if payload == UpdateLessonRequest::default() {
        let existing = find_lesson(&state.db, id).await?;
        if viewer.role == Role::Teacher && existing.teacher_id != viewer.user_id {
            return Err(AppError::PermissionDenied);
        }
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_lesson_for_update(&txn, id).await?;

    if viewer.role == Role::Teacher {
        if existing.teacher_id != viewer.user_id {
            return Err(AppError::PermissionDenied);
        }
        if let Some(teacher_id) = payload.teacher_id
            && teacher_id != viewer.user_id
        {
            return Err(AppError::PermissionDenied);
        }
    }

    let effective_start = payload.start_time.unwrap_or(existing.start_time);
    let effective_end = payload.end_time.unwrap_or(existing.end_time);
    validate_time_window(effective_start, effective_end, "start time", "end time")?;

    let mut active: lesson::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(start_time) = payload.start_time {
        active.start_time = Set(start_time);
    }
    if let Some(end_time) = payload.end_time {
        active.end_time = Set(end_time);
    }
    if let Some(subject_id) = payload.subject_id {
        active.subject_id = Set(subject_id);
    }
    if let Some(class_id) = payload.class_id {
        active.class_id = Set(class_id);
    }
    if let Some(teacher_id) = payload.teacher_id {
        active.teacher_id = Set(teacher_id);
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Lessons",
    operation_id = "deleteLesson",
    summary = "Delete a lesson",
    description = "Fails with 409 while the lesson still has exams, assignments or attendance records. Teachers may only delete their own lessons.",
    params(("id" = i32, Path, description = "Lesson ID")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Lesson not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Lesson still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_lesson(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Lesson)?;

    let txn = state.db.begin().await?;
    let existing = find_lesson_for_update(&txn, id).await?;

    if viewer.role == Role::Teacher && existing.teacher_id != viewer.user_id {
        return Err(AppError::PermissionDenied);
    }

    let exam_count = exam::Entity::find()
        .filter(exam::Column::LessonId.eq(id))
        .count(&txn)
        .await?;
    if exam_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a lesson with scheduled exams".into(),
        ));
    }

    let assignment_count = assignment::Entity::find()
        .filter(assignment::Column::LessonId.eq(id))
        .count(&txn)
        .await?;
    if assignment_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a lesson with open assignments".into(),
        ));
    }

    let attendance_count = attendance::Entity::find()
        .filter(attendance::Column::LessonId.eq(id))
        .count(&txn)
        .await?;
    if attendance_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a lesson with attendance records".into(),
        ));
    }

    lesson::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_lesson<C: ConnectionTrait>(db: &C, id: i32) -> Result<lesson::Model, AppError> {
    lesson::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".into()))
}

async fn find_lesson_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<lesson::Model, AppError> {
    use sea_orm::sea_query::LockType;
    lesson::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".into()))
}
