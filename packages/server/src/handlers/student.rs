use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{attendance, class, grade, result, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::models::student::*;
use crate::state::AppState;
use crate::utils::{hash, scope};

/// Role-scope predicate ANDed into every student read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            student::Column::ClassId.in_subquery(scope::class_ids_for_teacher(viewer.user_id)),
        ),
        Role::Student => Condition::all().add(student::Column::Id.eq(viewer.user_id)),
        Role::Parent => Condition::all().add(student::Column::ParentId.eq(viewer.user_id)),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Students",
    operation_id = "createStudent",
    summary = "Create a student account",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username taken or referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(username = %payload.username))]
pub async fn create_student(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Student)?;
    validate_create_student(&payload)?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_student = student::ActiveModel {
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
        grade_id: Set(payload.grade_id),
        class_id: Set(payload.class_id),
        parent_id: Set(payload.parent_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_student
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List students",
    description = "One page of students with their grade level and class name, restricted to the viewer's scope. Supports `class_id`, `teacher_id` (students in classes that teacher teaches) and `search`.",
    params(StudentListQuery),
    responses(
        (status = 200, description = "List of students", body = StudentListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_students(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<StudentListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = student::Entity::find()
        .join(JoinType::InnerJoin, student::Relation::Grade.def())
        .join(JoinType::InnerJoin, student::Relation::Class.def())
        .filter(scope_condition(&viewer));

    if let Some(class_id) = query.class_id {
        select = select.filter(student::Column::ClassId.eq(class_id));
    }
    if let Some(grade_id) = query.grade_id {
        select = select.filter(student::Column::GradeId.eq(grade_id));
    }
    if let Some(teacher_id) = query.teacher_id {
        select = select
            .filter(student::Column::ClassId.in_subquery(scope::class_ids_for_teacher(teacher_id)));
    }
    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(
                Condition::any()
                    .add(ci_contains(
                        (student::Entity, student::Column::Name),
                        term,
                    ))
                    .add(ci_contains(
                        (student::Entity, student::Column::Surname),
                        term,
                    ))
                    .add(ci_contains(
                        (student::Entity, student::Column::Username),
                        term,
                    )),
            );
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(student::Column::Id)
        .select_only()
        .column(student::Column::Id)
        .column(student::Column::Username)
        .column(student::Column::Name)
        .column(student::Column::Surname)
        .column(student::Column::Img)
        .column(student::Column::Address)
        .column_as(grade::Column::Level, "grade_level")
        .column(student::Column::ClassId)
        .column_as(class::Column::Name, "class_name")
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<StudentListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(StudentListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Students",
    operation_id = "getStudent",
    summary = "Get a student by ID",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student details", body = StudentResponse),
        (status = 404, description = "Student not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_student(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudentResponse>, AppError> {
    let model = student::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Students",
    operation_id = "updateStudent",
    summary = "Update a student",
    description = "PATCH semantics: only provided fields change. An empty or absent password leaves the stored password untouched.",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Username taken or referenced row missing (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_student(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    viewer.require_update(EntityKind::Student)?;
    validate_update_student(&payload)?;

    if payload == UpdateStudentRequest::default() {
        let existing = find_student(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_student_for_update(&txn, id).await?;
    let mut active: student::ActiveModel = existing.into();

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
    if let Some(grade_id) = payload.grade_id {
        active.grade_id = Set(grade_id);
    }
    if let Some(class_id) = payload.class_id {
        active.class_id = Set(class_id);
    }
    if let Some(parent_id) = payload.parent_id {
        active.parent_id = Set(parent_id);
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Delete a student",
    description = "Fails with 409 while the student still has results or attendance records.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Student still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_student(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Student)?;

    let txn = state.db.begin().await?;
    find_student_for_update(&txn, id).await?;

    let result_count = result::Entity::find()
        .filter(result::Column::StudentId.eq(id))
        .count(&txn)
        .await?;
    if result_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a student with recorded results".into(),
        ));
    }

    let attendance_count = attendance::Entity::find()
        .filter(attendance::Column::StudentId.eq(id))
        .count(&txn)
        .await?;
    if attendance_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a student with attendance records".into(),
        ));
    }

    student::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_student<C: ConnectionTrait>(db: &C, id: i32) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

async fn find_student_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<student::Model, AppError> {
    use sea_orm::sea_query::LockType;
    student::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}
