use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{assignment, exam, result, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::handlers::lesson::require_owned_lesson;
use crate::models::result::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every result read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            Condition::any()
                .add(result::Column::ExamId.in_subquery(scope::exam_ids_for_teacher(
                    viewer.user_id,
                )))
                .add(
                    result::Column::AssignmentId
                        .in_subquery(scope::assignment_ids_for_teacher(viewer.user_id)),
                ),
        ),
        Role::Student => Condition::all().add(result::Column::StudentId.eq(viewer.user_id)),
        Role::Parent => Condition::all().add(
            result::Column::StudentId.in_subquery(scope::student_ids_for_parent(viewer.user_id)),
        ),
        Role::None => scope::nothing(),
    }
}

/// Check the exam-or-assignment target exists and, for teachers, sits under
/// one of the viewer's own lessons.
async fn require_owned_target<C: ConnectionTrait>(
    db: &C,
    viewer: &Viewer,
    exam_id: Option<i32>,
    assignment_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(exam_id) = exam_id {
        let exam = exam::Entity::find_by_id(exam_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::Conflict("Referenced exam does not exist".into()))?;
        require_owned_lesson(db, viewer, exam.lesson_id).await?;
    }
    if let Some(assignment_id) = assignment_id {
        let assignment = assignment::Entity::find_by_id(assignment_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::Conflict("Referenced assignment does not exist".into()))?;
        require_owned_lesson(db, viewer, assignment.lesson_id).await?;
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Results",
    operation_id = "createResult",
    summary = "Record a result",
    description = "A result scores one student on exactly one of an exam or an assignment. Teachers may only record results under their own lessons.",
    request_body = CreateResultRequest,
    responses(
        (status = 201, description = "Result recorded", body = ResultResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(student_id = payload.student_id))]
pub async fn create_result(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Result)?;
    validate_create_result(&payload)?;

    require_owned_target(&state.db, &viewer, payload.exam_id, payload.assignment_id).await?;

    let new_result = result::ActiveModel {
        score: Set(payload.score),
        student_id: Set(payload.student_id),
        exam_id: Set(payload.exam_id),
        assignment_id: Set(payload.assignment_id),
        ..Default::default()
    };

    let model = new_result
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(ResultResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Results",
    operation_id = "listResults",
    summary = "List results",
    description = "One page of results with the student and the scored exam or assignment, restricted to the viewer's scope.",
    params(ResultListQuery),
    responses(
        (status = 200, description = "List of results", body = ResultListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_results(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<ResultListQuery>,
) -> Result<Json<ResultListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = result::Entity::find()
        .join(JoinType::InnerJoin, result::Relation::Student.def())
        .join(JoinType::LeftJoin, result::Relation::Exam.def())
        .join(JoinType::LeftJoin, result::Relation::Assignment.def())
        .filter(scope_condition(&viewer));

    if let Some(student_id) = query.student_id {
        select = select.filter(result::Column::StudentId.eq(student_id));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(
                Condition::any()
                    .add(ci_contains((student::Entity, student::Column::Name), term))
                    .add(ci_contains(
                        (student::Entity, student::Column::Surname),
                        term,
                    ))
                    .add(ci_contains((exam::Entity, exam::Column::Title), term)),
            );
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(result::Column::Id)
        .select_only()
        .column(result::Column::Id)
        .column(result::Column::Score)
        .column_as(student::Column::Name, "student_name")
        .column_as(student::Column::Surname, "student_surname")
        .column_as(exam::Column::Title, "exam_title")
        .column_as(assignment::Column::Title, "assignment_title")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<ResultListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(ResultListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Results",
    operation_id = "getResult",
    summary = "Get a result by ID",
    params(("id" = i32, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Result details", body = ResultResponse),
        (status = 404, description = "Result not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_result(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ResultResponse>, AppError> {
    let model = result::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Results",
    operation_id = "updateResult",
    summary = "Update a result",
    description = "PATCH semantics. `exam_id` and `assignment_id` support three-state updates; the row must still reference exactly one of the two after the change.",
    params(("id" = i32, Path, description = "Result ID")),
    request_body = UpdateResultRequest,
    responses(
        (status = 200, description = "Result updated", body = ResultResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Result not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_result(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateResultRequest>,
) -> Result<Json<ResultResponse>, AppError> {
    viewer.require_update(EntityKind::Result)?;
    validate_update_result(&payload)?;

    if payload == UpdateResultRequest::default() {
        let existing = find_result(&state.db, id).await?;
        require_owned_target(&state.db, &viewer, existing.exam_id, existing.assignment_id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_result_for_update(&txn, id).await?;

    require_owned_target(&txn, &viewer, existing.exam_id, existing.assignment_id).await?;

    // Effective values: payload wins where present, stored row otherwise.
    let effective_exam = match payload.exam_id {
        Some(value) => value,
        None => existing.exam_id,
    };
    let effective_assignment = match payload.assignment_id {
        Some(value) => value,
        None => existing.assignment_id,
    };
    validate_exactly_one(effective_exam, effective_assignment)?;
    require_owned_target(&txn, &viewer, effective_exam, effective_assignment).await?;

    let mut active: result::ActiveModel = existing.into();

    if let Some(score) = payload.score {
        active.score = Set(score);
    }
    if let Some(student_id) = payload.student_id {
        active.student_id = Set(student_id);
    }
    if payload.exam_id.is_some() {
        active.exam_id = Set(effective_exam);
    }
    if payload.assignment_id.is_some() {
        active.assignment_id = Set(effective_assignment);
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Results",
    operation_id = "deleteResult",
    summary = "Delete a result",
    params(("id" = i32, Path, description = "Result ID")),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Result not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_result(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Result)?;

    let txn = state.db.begin().await?;
    let existing = find_result_for_update(&txn, id).await?;
    require_owned_target(&txn, &viewer, existing.exam_id, existing.assignment_id).await?;

    result::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_result<C: ConnectionTrait>(db: &C, id: i32) -> Result<result::Model, AppError> {
    result::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found".into()))
}

async fn find_result_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<result::Model, AppError> {
    use sea_orm::sea_query::LockType;
    result::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found".into()))
}
