use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{lesson, subject, subject_teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::models::subject::*;
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every subject read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all()
            .add(subject::Column::Id.in_subquery(scope::subject_ids_for_teacher(viewer.user_id))),
        Role::Student => Condition::all().add(
            subject::Column::Id.in_subquery(scope::subject_ids_for_classes(
                scope::class_id_for_student(viewer.user_id),
            )),
        ),
        Role::Parent => Condition::all().add(
            subject::Column::Id.in_subquery(scope::subject_ids_for_classes(
                scope::class_ids_for_parent(viewer.user_id),
            )),
        ),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Subjects",
    operation_id = "createSubject",
    summary = "Create a subject",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name taken or teacher missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(name = %payload.name))]
pub async fn create_subject(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Subject)?;
    validate_create_subject(&payload)?;

    let txn = state.db.begin().await?;

    let new_subject = subject::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        ..Default::default()
    };
    let model = new_subject
        .insert(&txn)
        .await
        .map_err(AppError::from_write_err)?;

    for &teacher_id in &payload.teacher_ids {
        let link = subject_teacher::ActiveModel {
            subject_id: Set(model.id),
            teacher_id: Set(teacher_id),
        };
        link.insert(&txn).await.map_err(AppError::from_write_err)?;
    }

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(SubjectResponse::from_model(model, payload.teacher_ids)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Subjects",
    operation_id = "listSubjects",
    summary = "List subjects",
    params(SubjectListQuery),
    responses(
        (status = 200, description = "List of subjects", body = SubjectListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_subjects(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<SubjectListQuery>,
) -> Result<Json<SubjectListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = subject::Entity::find().filter(scope_condition(&viewer));

    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(ci_contains(subject::Column::Name, term));
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(subject::Column::Id)
        .select_only()
        .column(subject::Column::Id)
        .column(subject::Column::Name)
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<SubjectListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(SubjectListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Subjects",
    operation_id = "getSubject",
    summary = "Get a subject by ID",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject details", body = SubjectResponse),
        (status = 404, description = "Subject not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_subject(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubjectResponse>, AppError> {
    let model = subject::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))?;

    let teacher_ids = teacher_ids_of(&state.db, id).await?;
    Ok(Json(SubjectResponse::from_model(model, teacher_ids)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Subjects",
    operation_id = "updateSubject",
    summary = "Update a subject",
    description = "PATCH semantics. `teacher_ids` replaces the full teacher assignment when present.",
    params(("id" = i32, Path, description = "Subject ID")),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken or teacher missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_subject(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSubjectRequest>,
) -> Result<Json<SubjectResponse>, AppError> {
    viewer.require_update(EntityKind::Subject)?;
    validate_update_subject(&payload)?;

    if payload == UpdateSubjectRequest::default() {
        let existing = find_subject(&state.db, id).await?;
        let teacher_ids = teacher_ids_of(&state.db, id).await?;
        return Ok(Json(SubjectResponse::from_model(existing, teacher_ids)));
    }

    let txn = state.db.begin().await?;
    let existing = find_subject_for_update(&txn, id).await?;
    let mut active: subject::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;

    if let Some(ref teacher_ids) = payload.teacher_ids {
        subject_teacher::Entity::delete_many()
            .filter(subject_teacher::Column::SubjectId.eq(id))
            .exec(&txn)
            .await?;
        for &teacher_id in teacher_ids {
            let link = subject_teacher::ActiveModel {
                subject_id: Set(id),
                teacher_id: Set(teacher_id),
            };
            link.insert(&txn).await.map_err(AppError::from_write_err)?;
        }
    }

    let teacher_ids = teacher_ids_of(&txn, id).await?;
    txn.commit().await?;

    Ok(Json(SubjectResponse::from_model(model, teacher_ids)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Subjects",
    operation_id = "deleteSubject",
    summary = "Delete a subject",
    description = "Fails with 409 while lessons still reference the subject.",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Subject still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_subject(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Subject)?;

    let txn = state.db.begin().await?;
    find_subject_for_update(&txn, id).await?;

    let lesson_count = lesson::Entity::find()
        .filter(lesson::Column::SubjectId.eq(id))
        .count(&txn)
        .await?;
    if lesson_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a subject with existing lessons".into(),
        ));
    }

    subject_teacher::Entity::delete_many()
        .filter(subject_teacher::Column::SubjectId.eq(id))
        .exec(&txn)
        .await?;
    subject::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_subject<C: ConnectionTrait>(db: &C, id: i32) -> Result<subject::Model, AppError> {
    subject::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))
}

async fn find_subject_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<subject::Model, AppError> {
    use sea_orm::sea_query::LockType;
    subject::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))
}

async fn teacher_ids_of<C: ConnectionTrait>(db: &C, subject_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(subject_teacher::Entity::find()
        .filter(subject_teacher::Column::SubjectId.eq(subject_id))
        .select_only()
        .column(subject_teacher::Column::TeacherId)
        .order_by_asc(subject_teacher::Column::TeacherId)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}
