use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{assignment, class, lesson, result, subject, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::handlers::lesson::require_owned_lesson;
use crate::models::assignment::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains, validate_time_window};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every assignment read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            assignment::Column::LessonId.in_subquery(scope::lesson_ids_for_teacher(viewer.user_id)),
        ),
        Role::Student => Condition::all().add(
            assignment::Column::LessonId.in_subquery(scope::lesson_ids_for_classes(
                scope::class_id_for_student(viewer.user_id),
            )),
        ),
        Role::Parent => Condition::all().add(
            assignment::Column::LessonId.in_subquery(scope::lesson_ids_for_classes(
                scope::class_ids_for_parent(viewer.user_id),
            )),
        ),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Assignments",
    operation_id = "createAssignment",
    summary = "Create an assignment",
    description = "Teachers may only give assignments under their own lessons.",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Referenced lesson missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(title = %payload.title))]
pub async fn create_assignment(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Assignment)?;
    validate_create_assignment(&payload)?;

    require_owned_lesson(&state.db, &viewer, payload.lesson_id).await?;

    let new_assignment = assignment::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        start_date: Set(payload.start_date),
        due_date: Set(payload.due_date),
        lesson_id: Set(payload.lesson_id),
        ..Default::default()
    };

    let model = new_assignment
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Assignments",
    operation_id = "listAssignments",
    summary = "List assignments",
    description = "One page of assignments with the lesson's subject, class and teacher, restricted to the viewer's scope.",
    params(AssignmentListQuery),
    responses(
        (status = 200, description = "List of assignments", body = AssignmentListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_assignments(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<AssignmentListQuery>,
) -> Result<Json<AssignmentListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = assignment::Entity::find()
        .join(JoinType::InnerJoin, assignment::Relation::Lesson.def())
        .join(JoinType::InnerJoin, lesson::Relation::Subject.def())
        .join(JoinType::InnerJoin, lesson::Relation::Class.def())
        .join(JoinType::InnerJoin, lesson::Relation::Teacher.def())
        .filter(scope_condition(&viewer));

    if let Some(class_id) = query.class_id {
        select = select.filter(lesson::Column::ClassId.eq(class_id));
    }
    if let Some(teacher_id) = query.teacher_id {
        select = select.filter(lesson::Column::TeacherId.eq(teacher_id));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(ci_contains((subject::Entity, subject::Column::Name), term));
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(assignment::Column::DueDate)
        .select_only()
        .column(assignment::Column::Id)
        .column(assignment::Column::Title)
        .column(assignment::Column::StartDate)
        .column(assignment::Column::DueDate)
        .column_as(subject::Column::Name, "subject_name")
        .column_as(class::Column::Name, "class_name")
        .column_as(teacher::Column::Name, "teacher_name")
        .column_as(teacher::Column::Surname, "teacher_surname")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<AssignmentListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(AssignmentListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Assignments",
    operation_id = "getAssignment",
    summary = "Get an assignment by ID",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment details", body = AssignmentResponse),
        (status = 404, description = "Assignment not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_assignment(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let model = assignment::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Assignments",
    operation_id = "updateAssignment",
    summary = "Update an assignment",
    description = "PATCH semantics. The date window is re-validated against stored values when only one bound changes.",
    params(("id" = i32, Path, description = "Assignment ID")),
    request_body = UpdateAssignmentRequest,
    responses(
        (status = 200, description = "Assignment updated", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Referenced lesson missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_assignment(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAssignmentRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    viewer.require_update(EntityKind::Assignment)?;
    validate_update_assignment(&payload)?;

    if payload == UpdateAssignmentRequest::default() {
        let existing = find_assignment(&state.db, id).await?;
        require_owned_lesson(&state.db, &viewer, existing.lesson_id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_assignment_for_update(&txn, id).await?;

    require_owned_lesson(&txn, &viewer, existing.lesson_id).await?;
    if let Some(lesson_id) = payload.lesson_id
        && lesson_id != existing.lesson_id
    {
        require_owned_lesson(&txn, &viewer, lesson_id).await?;
    }

    let effective_start = payload.start_date.unwrap_or(existing.start_date);
    let effective_due = payload.due_date.unwrap_or(existing.due_date);
    validate_time_window(effective_start, effective_due, "start date", "due date")?;

    let mut active: assignment::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(due_date) = payload.due_date {
        active.due_date = Set(due_date);
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
    tag = "Assignments",
    operation_id = "deleteAssignment",
    summary = "Delete an assignment",
    description = "Fails with 409 while results still reference the assignment.",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Assignment still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_assignment(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Assignment)?;

    let txn = state.db.begin().await?;
    let existing = find_assignment_for_update(&txn, id).await?;
    require_owned_lesson(&txn, &viewer, existing.lesson_id).await?;

    let result_count = result::Entity::find()
        .filter(result::Column::AssignmentId.eq(id))
        .count(&txn)
        .await?;
    if result_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete an assignment with recorded results".into(),
        ));
    }

    assignment::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_assignment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<assignment::Model, AppError> {
    assignment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}

async fn find_assignment_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<assignment::Model, AppError> {
    use sea_orm::sea_query::LockType;
    assignment::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}
