use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{class, lesson, subject_teacher, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::models::teacher::*;
use crate::state::AppState;
use crate::utils::{hash, scope};

/// Role-scope predicate ANDed into every teacher read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin | Role::Teacher => Condition::all(),
        Role::Student => Condition::all().add(
            teacher::Column::Id.in_subquery(scope::teacher_ids_for_classes(
                scope::class_id_for_student(viewer.user_id),
            )),
        ),
        Role::Parent => Condition::all().add(
            teacher::Column::Id.in_subquery(scope::teacher_ids_for_classes(
                scope::class_ids_for_parent(viewer.user_id),
            )),
        ),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Teachers",
    operation_id = "createTeacher",
    summary = "Create a teacher account",
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher created", body = TeacherResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username taken or subject missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(username = %payload.username))]
pub async fn create_teacher(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeacherRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Teacher)?;
    validate_create_teacher(&payload)?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;

    let new_teacher = teacher::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        password_hash: Set(password_hash),
        name: Set(payload.name.trim().to_string()),
        surname: Set(payload.surname.trim().to_string()),
        email: Set(payload.email),
        phone: Set(payload.phone),
        address: Set(payload.address),
        img: Set(payload.img),
        blood_type: Set(payload.blood_type),
        sex: Set(payload.sex),
        birthday: Set(payload.birthday),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_teacher
        .insert(&txn)
        .await
        .map_err(AppError::from_write_err)?;

    replace_subject_links(&txn, model.id, &payload.subject_ids).await?;

    txn.commit().await?;

    let subject_ids = payload.subject_ids;
    Ok((
        StatusCode::CREATED,
        Json(TeacherResponse::from_model(model, subject_ids)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Teachers",
    operation_id = "listTeachers",
    summary = "List teachers",
    description = "One page of teachers matching the filters, restricted to the viewer's scope. Supports `class_id` (teachers with a lesson in that class) and `search`.",
    params(TeacherListQuery),
    responses(
        (status = 200, description = "List of teachers", body = TeacherListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_teachers(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<TeacherListQuery>,
) -> Result<Json<TeacherListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = teacher::Entity::find().filter(scope_condition(&viewer));

    if let Some(class_id) = query.class_id {
        select =
            select.filter(teacher::Column::Id.in_subquery(scope::teacher_ids_for_class(class_id)));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(
                Condition::any()
                    .add(ci_contains(teacher::Column::Name, term))
                    .add(ci_contains(teacher::Column::Surname, term))
                    .add(ci_contains(teacher::Column::Username, term)),
            );
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(teacher::Column::Id)
        .select_only()
        .column(teacher::Column::Id)
        .column(teacher::Column::Username)
        .column(teacher::Column::Name)
        .column(teacher::Column::Surname)
        .column(teacher::Column::Email)
        .column(teacher::Column::Phone)
        .column(teacher::Column::Address)
        .column(teacher::Column::Img)
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<TeacherListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(TeacherListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teachers",
    operation_id = "getTeacher",
    summary = "Get a teacher by ID",
    params(("id" = i32, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher details", body = TeacherResponse),
        (status = 404, description = "Teacher not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_teacher(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TeacherResponse>, AppError> {
    let model = teacher::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".into()))?;

    let subject_ids = subject_ids_of(&state.db, id).await?;
    Ok(Json(TeacherResponse::from_model(model, subject_ids)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Teachers",
    operation_id = "updateTeacher",
    summary = "Update a teacher",
    description = "PATCH semantics: only provided fields change. An empty or absent password leaves the stored password untouched. `subject_ids` replaces the full assignment when present.",
    params(("id" = i32, Path, description = "Teacher ID")),
    request_body = UpdateTeacherRequest,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Teacher not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Username taken or subject missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_teacher(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeacherRequest>,
) -> Result<Json<TeacherResponse>, AppError> {
    viewer.require_update(EntityKind::Teacher)?;
    validate_update_teacher(&payload)?;

    if payload == UpdateTeacherRequest::default() {
        let existing = find_teacher(&state.db, id).await?;
        let subject_ids = subject_ids_of(&state.db, id).await?;
        return Ok(Json(TeacherResponse::from_model(existing, subject_ids)));
    }

    let txn = state.db.begin().await?;
    let existing = find_teacher_for_update(&txn, id).await?;
    let mut active: teacher::ActiveModel = existing.into();

    if let Some(ref username) = payload.username {
        active.username = Set(username.trim().to_string());
    }
    if let Some(ref password) = payload.password
        && !password.is_empty()
    {
        let password_hash = hash::hash_password(password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password_hash = Set(password_hash);
    }
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref surname) = payload.surname {
        active.surname = Set(surname.trim().to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(img) = payload.img {
        active.img = Set(Some(img));
    }
    if let Some(blood_type) = payload.blood_type {
        active.blood_type = Set(blood_type);
    }
    if let Some(sex) = payload.sex {
        active.sex = Set(sex);
    }
    if let Some(birthday) = payload.birthday {
        active.birthday = Set(birthday);
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;

    if let Some(ref subject_ids) = payload.subject_ids {
        subject_teacher::Entity::delete_many()
            .filter(subject_teacher::Column::TeacherId.eq(id))
            .exec(&txn)
            .await?;
        replace_subject_links(&txn, id, subject_ids).await?;
    }

    let subject_ids = subject_ids_of(&txn, id).await?;
    txn.commit().await?;

    Ok(Json(TeacherResponse::from_model(model, subject_ids)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Teachers",
    operation_id = "deleteTeacher",
    summary = "Delete a teacher",
    description = "Fails with 409 while the teacher still has lessons or supervises a class.",
    params(("id" = i32, Path, description = "Teacher ID")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Teacher not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Teacher still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_teacher(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Teacher)?;

    let txn = state.db.begin().await?;
    find_teacher_for_update(&txn, id).await?;

    let lesson_count = lesson::Entity::find()
        .filter(lesson::Column::TeacherId.eq(id))
        .count(&txn)
        .await?;
    if lesson_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a teacher with existing lessons".into(),
        ));
    }

    let supervised = class::Entity::find()
        .filter(class::Column::SupervisorId.eq(id))
        .count(&txn)
        .await?;
    if supervised > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a teacher supervising a class".into(),
        ));
    }

    subject_teacher::Entity::delete_many()
        .filter(subject_teacher::Column::TeacherId.eq(id))
        .exec(&txn)
        .await?;
    teacher::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_teacher<C: ConnectionTrait>(db: &C, id: i32) -> Result<teacher::Model, AppError> {
    teacher::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".into()))
}

async fn find_teacher_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<teacher::Model, AppError> {
    use sea_orm::sea_query::LockType;
    teacher::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".into()))
}

async fn subject_ids_of<C: ConnectionTrait>(db: &C, teacher_id: i32) -> Result<Vec<i32>, AppError> {
    Ok(subject_teacher::Entity::find()
        .filter(subject_teacher::Column::TeacherId.eq(teacher_id))
        .select_only()
        .column(subject_teacher::Column::SubjectId)
        .order_by_asc(subject_teacher::Column::SubjectId)
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

async fn replace_subject_links(
    txn: &DatabaseTransaction,
    teacher_id: i32,
    subject_ids: &[i32],
) -> Result<(), AppError> {
    for &subject_id in subject_ids {
        let link = subject_teacher::ActiveModel {
            subject_id: Set(subject_id),
            teacher_id: Set(teacher_id),
        };
        link.insert(txn).await.map_err(AppError::from_write_err)?;
    }
    Ok(())
}
