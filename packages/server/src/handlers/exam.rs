use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{class, exam, lesson, result, subject, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::handlers::lesson::require_owned_lesson;
use crate::models::exam::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains, validate_time_window};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every exam read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all()
            .add(exam::Column::LessonId.in_subquery(scope::lesson_ids_for_teacher(viewer.user_id))),
        Role::Student => Condition::all().add(
            exam::Column::LessonId.in_subquery(scope::lesson_ids_for_classes(
                scope::class_id_for_student(viewer.user_id),
            )),
        ),
        Role::Parent => Condition::all().add(
            exam::Column::LessonId.in_subquery(scope::lesson_ids_for_classes(
                scope::class_ids_for_parent(viewer.user_id),
            )),
        ),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Exams",
    operation_id = "createExam",
    summary = "Schedule an exam",
    description = "Teachers may only schedule exams under their own lessons.",
    request_body = CreateExamRequest,
    responses(
        (status = 201, description = "Exam created", body = ExamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Referenced lesson missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(title = %payload.title))]
pub async fn create_exam(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Exam)?;
    validate_create_exam(&payload)?;

    require_owned_lesson(&state.db, &viewer, payload.lesson_id).await?;

    let new_exam = exam::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        lesson_id: Set(payload.lesson_id),
        ..Default::default()
    };

    let model = new_exam
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(ExamResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Exams",
    operation_id = "listExams",
    summary = "List exams",
    description = "One page of exams with the lesson's subject, class and teacher, restricted to the viewer's scope.",
    params(ExamListQuery),
    responses(
        (status = 200, description = "List of exams", body = ExamListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_exams(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<ExamListQuery>,
) -> Result<Json<ExamListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = exam::Entity::find()
        .join(JoinType::InnerJoin, exam::Relation::Lesson.def())
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
        .order_by_asc(exam::Column::StartTime)
        .select_only()
        .column(exam::Column::Id)
        .column(exam::Column::Title)
        .column(exam::Column::StartTime)
        .column(exam::Column::EndTime)
        .column_as(subject::Column::Name, "subject_name")
        .column_as(class::Column::Name, "class_name")
        .column_as(teacher::Column::Name, "teacher_name")
        .column_as(teacher::Column::Surname, "teacher_surname")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<ExamListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(ExamListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Exams",
    operation_id = "getExam",
    summary = "Get an exam by ID",
    params(("id" = i32, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Exam details", body = ExamResponse),
        (status = 404, description = "Exam not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_exam(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ExamResponse>, AppError> {
    let model = exam::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Exams",
    operation_id = "updateExam",
    summary = "Update an exam",
    description = "PATCH semantics. The time window is re-validated against stored values when only one bound changes.",
    params(("id" = i32, Path, description = "Exam ID")),
    request_body = UpdateExamRequest,
    responses(
        (status = 200, description = "Exam updated", body = ExamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Exam not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Referenced lesson missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_exam(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateExamRequest>,
) -> Result<Json<ExamResponse>, AppError> {
    viewer.require_update(EntityKind::Exam)?;
    validate_update_exam(&payload)?;

    if payload == UpdateExamRequest::default() {
        let existing = find_exam(&state.db, id).await?;
        require_owned_lesson(&state.db, &viewer, existing.lesson_id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_exam_for_update(&txn, id).await?;

    require_owned_lesson(&txn, &viewer, existing.lesson_id).await?;
    if let Some(lesson_id) = payload.lesson_id
        && lesson_id != existing.lesson_id
    {
        require_owned_lesson(&txn, &viewer, lesson_id).await?;
    }

    let effective_start = payload.start_time.unwrap_or(existing.start_time);
    let effective_end = payload.end_time.unwrap_or(existing.end_time);
    validate_time_window(effective_start, effective_end, "start time", "end time")?;

    let mut active: exam::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(start_time) = payload.start_time {
        active.start_time = Set(start_time);
    }
    if let Some(end_time) = payload.end_time {
        active.end_time = Set(end_time);
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
    tag = "Exams",
    operation_id = "deleteExam",
    summary = "Delete an exam",
    description = "Fails with 409 while results still reference the exam.",
    params(("id" = i32, Path, description = "Exam ID")),
    responses(
        (status = 204, description = "Exam deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Exam not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Exam still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_exam(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Exam)?;

    let txn = state.db.begin().await?;
    let existing = find_exam_for_update(&txn, id).await?;
    require_owned_lesson(&txn, &viewer, existing.lesson_id).await?;

    let result_count = result::Entity::find()
        .filter(result::Column::ExamId.eq(id))
        .count(&txn)
        .await?;
    if result_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete an exam with recorded results".into(),
        ));
    }

    exam::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_exam<C: ConnectionTrait>(db: &C, id: i32) -> Result<exam::Model, AppError> {
    exam::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))
}

async fn find_exam_for_update(txn: &DatabaseTransaction, id: i32) -> Result<exam::Model, AppError> {
    use sea_orm::sea_query::LockType;
    exam::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))
}
