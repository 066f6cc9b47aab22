use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{class, grade, lesson, student, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::class::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::state::AppState;
use crate::utils::scope;

/// Role-scope predicate ANDed into every class read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            Condition::any()
                .add(class::Column::SupervisorId.eq(viewer.user_id))
                .add(
                    class::Column::Id.in_subquery(scope::class_ids_for_teacher(viewer.user_id)),
                ),
        ),
        Role::Student => Condition::all()
            .add(class::Column::Id.in_subquery(scope::class_id_for_student(viewer.user_id))),
        Role::Parent => Condition::all()
            .add(class::Column::Id.in_subquery(scope::class_ids_for_parent(viewer.user_id))),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Classes",
    operation_id = "createClass",
    summary = "Create a class",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name taken or referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(name = %payload.name))]
pub async fn create_class(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Class)?;
    validate_create_class(&payload)?;

    let new_class = class::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        capacity: Set(payload.capacity),
        grade_id: Set(payload.grade_id),
        supervisor_id: Set(payload.supervisor_id),
        ..Default::default()
    };

    let model = new_class
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(ClassResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Classes",
    operation_id = "listClasses",
    summary = "List classes",
    description = "One page of classes with their grade level and supervisor name, restricted to the viewer's scope.",
    params(ClassListQuery),
    responses(
        (status = 200, description = "List of classes", body = ClassListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_classes(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<ClassListQuery>,
) -> Result<Json<ClassListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = class::Entity::find()
        .join(JoinType::InnerJoin, class::Relation::Grade.def())
        .join(JoinType::LeftJoin, class::Relation::Supervisor.def())
        .filter(scope_condition(&viewer));

    if let Some(supervisor_id) = query.supervisor_id {
        select = select.filter(class::Column::SupervisorId.eq(supervisor_id));
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
        .order_by_asc(class::Column::Id)
        .select_only()
        .column(class::Column::Id)
        .column(class::Column::Name)
        .column(class::Column::Capacity)
        .column_as(grade::Column::Level, "grade_level")
        .column_as(teacher::Column::Name, "supervisor_name")
        .column_as(teacher::Column::Surname, "supervisor_surname")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<ClassListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(ClassListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Classes",
    operation_id = "getClass",
    summary = "Get a class by ID",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class details", body = ClassResponse),
        (status = 404, description = "Class not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_class(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClassResponse>, AppError> {
    let model = class::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Class not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Classes",
    operation_id = "updateClass",
    summary = "Update a class",
    description = "PATCH semantics. `supervisor_id` supports three-state updates: omit to leave unchanged, null to clear, value to set.",
    params(("id" = i32, Path, description = "Class ID")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = ClassResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Class not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken or referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_class(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateClassRequest>,
) -> Result<Json<ClassResponse>, AppError> {
    viewer.require_update(EntityKind::Class)?;
    validate_update_class(&payload)?;

    if payload == UpdateClassRequest::default() {
        let existing = find_class(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_class_for_update(&txn, id).await?;
    let mut active: class::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(capacity) = payload.capacity {
        active.capacity = Set(capacity);
    }
    if let Some(grade_id) = payload.grade_id {
        active.grade_id = Set(grade_id);
    }
    match payload.supervisor_id {
        Some(Some(supervisor_id)) => active.supervisor_id = Set(Some(supervisor_id)),
        Some(None) => active.supervisor_id = Set(None),
        None => {}
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Classes",
    operation_id = "deleteClass",
    summary = "Delete a class",
    description = "Fails with 409 while the class still has students or lessons.",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Class not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Class still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_class(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Class)?;

    let txn = state.db.begin().await?;
    find_class_for_update(&txn, id).await?;

    let student_count = student::Entity::find()
        .filter(student::Column::ClassId.eq(id))
        .count(&txn)
        .await?;
    if student_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a class with enrolled students".into(),
        ));
    }

    let lesson_count = lesson::Entity::find()
        .filter(lesson::Column::ClassId.eq(id))
        .count(&txn)
        .await?;
    if lesson_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a class with scheduled lessons".into(),
        ));
    }

    class::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_class<C: ConnectionTrait>(db: &C, id: i32) -> Result<class::Model, AppError> {
    class::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Class not found".into()))
}

async fn find_class_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<class::Model, AppError> {
    use sea_orm::sea_query::LockType;
    class::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Class not found".into()))
}
