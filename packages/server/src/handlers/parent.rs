use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{parent, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::parent::*;
use crate::models::shared::{PAGE_SIZE, Pagination, ci_contains};
use crate::state::AppState;
use crate::utils::{hash, scope};

/// Role-scope predicate ANDed into every parent read.
fn scope_condition(viewer: &Viewer) -> Condition {
    match viewer.role {
        Role::Admin => Condition::all(),
        Role::Teacher => Condition::all().add(
            parent::Column::Id.in_subquery(scope::parent_ids_for_classes(
                scope::class_ids_for_teacher(viewer.user_id),
            )),
        ),
        Role::Student => Condition::all()
            .add(parent::Column::Id.in_subquery(scope::parent_id_for_student(viewer.user_id))),
        Role::Parent => Condition::all().add(parent::Column::Id.eq(viewer.user_id)),
        Role::None => scope::nothing(),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Parents",
    operation_id = "createParent",
    summary = "Create a parent account",
    request_body = CreateParentRequest,
    responses(
        (status = 201, description = "Parent created", body = ParentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(username = %payload.username))]
pub async fn create_parent(
    viewer: Viewer,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateParentRequest>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_create(EntityKind::Parent)?;
    validate_create_parent(&payload)?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_parent = parent::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        password_hash: Set(password_hash),
        name: Set(payload.name.trim().to_string()),
        surname: Set(payload.surname.trim().to_string()),
        email: Set(payload.email),
        phone: Set(payload.phone),
        address: Set(payload.address),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_parent
        .insert(&state.db)
        .await
        .map_err(AppError::from_write_err)?;

    Ok((StatusCode::CREATED, Json(ParentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Parents",
    operation_id = "listParents",
    summary = "List parents",
    description = "One page of parents matching the filters, restricted to the viewer's scope.",
    params(ParentListQuery),
    responses(
        (status = 200, description = "List of parents", body = ParentListResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_parents(
    viewer: Viewer,
    State(state): State<AppState>,
    Query(query): Query<ParentListQuery>,
) -> Result<Json<ParentListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);

    let mut select = parent::Entity::find().filter(scope_condition(&viewer));

    if let Some(ref search) = query.search {
        let term = search.trim();
        if !term.is_empty() {
            select = select.filter(
                Condition::any()
                    .add(ci_contains(parent::Column::Name, term))
                    .add(ci_contains(parent::Column::Surname, term))
                    .add(ci_contains(parent::Column::Username, term)),
            );
        }
    }

    let txn = state.db.begin().await?;
    let total = select.clone().count(&txn).await?;
    let data = select
        .order_by_asc(parent::Column::Id)
        .select_only()
        .column(parent::Column::Id)
        .column(parent::Column::Username)
        .column(parent::Column::Name)
        .column(parent::Column::Surname)
        .column(parent::Column::Email)
        .column(parent::Column::Phone)
        .column(parent::Column::Address)
        .offset(Some((page - 1) * PAGE_SIZE))
        .limit(Some(PAGE_SIZE))
        .into_model::<ParentListItem>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    Ok(Json(ParentListResponse {
        data,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Parents",
    operation_id = "getParent",
    summary = "Get a parent by ID",
    params(("id" = i32, Path, description = "Parent ID")),
    responses(
        (status = 200, description = "Parent details", body = ParentResponse),
        (status = 404, description = "Parent not found or out of scope (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_parent(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ParentResponse>, AppError> {
    let model = parent::Entity::find_by_id(id)
        .filter(scope_condition(&viewer))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Parent not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Parents",
    operation_id = "updateParent",
    summary = "Update a parent",
    description = "PATCH semantics: only provided fields change. An empty or absent password leaves the stored password untouched.",
    params(("id" = i32, Path, description = "Parent ID")),
    request_body = UpdateParentRequest,
    responses(
        (status = 200, description = "Parent updated", body = ParentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Parent not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Username taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer, payload), fields(id))]
pub async fn update_parent(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateParentRequest>,
) -> Result<Json<ParentResponse>, AppError> {
    viewer.require_update(EntityKind::Parent)?;
    validate_update_parent(&payload)?;

    if payload == UpdateParentRequest::default() {
        let existing = find_parent(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_parent_for_update(&txn, id).await?;
    let mut active: parent::ActiveModel = existing.into();

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
        active.phone = Set(phone);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }

    let model = active.update(&txn).await.map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Parents",
    operation_id = "deleteParent",
    summary = "Delete a parent",
    description = "Fails with 409 while the parent still has students linked.",
    params(("id" = i32, Path, description = "Parent ID")),
    responses(
        (status = 204, description = "Parent deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Parent not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Parent still referenced (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn delete_parent(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    viewer.require_delete(EntityKind::Parent)?;

    let txn = state.db.begin().await?;
    find_parent_for_update(&txn, id).await?;

    let child_count = student::Entity::find()
        .filter(student::Column::ParentId.eq(id))
        .count(&txn)
        .await?;
    if child_count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a parent with linked students".into(),
        ));
    }

    parent::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(AppError::from_write_err)?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_parent<C: ConnectionTrait>(db: &C, id: i32) -> Result<parent::Model, AppError> {
    parent::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Parent not found".into()))
}

async fn find_parent_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<parent::Model, AppError> {
    use sea_orm::sea_query::LockType;
    parent::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Parent not found".into()))
}
