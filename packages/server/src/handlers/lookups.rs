use axum::Json;
use axum::extract::{Path, State};
use common::{EntityKind, Role};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{assignment, class, exam, grade, lesson, parent, student, subject, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::models::lookup::*;
use crate::state::AppState;
use crate::utils::scope;

/// One reference-data list a form can declare.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Grades,
    Classes,
    Subjects,
    Teachers,
    Parents,
    Students,
    Lessons,
    Exams,
    Assignments,
}

/// The registry: which lookup lists each entity's form needs.
///
/// This replaces a per-entity dispatch switch; adding a form means adding a
/// row here, not a new branch.
const REGISTRY: &[(EntityKind, &[Lookup])] = &[
    (EntityKind::Teacher, &[Lookup::Subjects]),
    (
        EntityKind::Student,
        &[Lookup::Grades, Lookup::Classes, Lookup::Parents],
    ),
    (EntityKind::Parent, &[]),
    (EntityKind::Subject, &[Lookup::Teachers]),
    (EntityKind::Class, &[Lookup::Grades, Lookup::Teachers]),
    (
        EntityKind::Lesson,
        &[Lookup::Subjects, Lookup::Classes, Lookup::Teachers],
    ),
    (EntityKind::Exam, &[Lookup::Lessons]),
    (EntityKind::Assignment, &[Lookup::Lessons]),
    (
        EntityKind::Result,
        &[Lookup::Students, Lookup::Exams, Lookup::Assignments],
    ),
    (EntityKind::Attendance, &[Lookup::Students, Lookup::Lessons]),
    (EntityKind::Event, &[Lookup::Classes]),
    (EntityKind::Announcement, &[Lookup::Classes]),
];

#[utoipa::path(
    get,
    path = "/{entity}/options",
    tag = "Forms",
    operation_id = "formOptions",
    summary = "Fetch the reference data an entity's form needs",
    description = "Returns the drop-down option lists registered for the entity. Requires create or update capability on the entity; lesson-derived lists are scoped to the acting teacher's own lessons.",
    params(("entity" = String, Path, description = "Entity tag, e.g. `lesson` or `exam`")),
    responses(
        (status = 200, description = "Reference data for the form", body = FormOptionsResponse),
        (status = 403, description = "Viewer may not open this form (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown entity tag (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, viewer), fields(entity = %entity))]
pub async fn form_options(
    viewer: Viewer,
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<FormOptionsResponse>, AppError> {
    let kind: EntityKind = entity
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown entity '{entity}'")))?;

    if !viewer.can_use_form(kind) {
        return Err(AppError::PermissionDenied);
    }

    let lookups = REGISTRY
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, lookups)| *lookups)
        .unwrap_or_default();

    let mut response = FormOptionsResponse::default();
    for lookup in lookups {
        match lookup {
            Lookup::Grades => {
                response.grades = Some(
                    grade::Entity::find()
                        .select_only()
                        .column(grade::Column::Id)
                        .column(grade::Column::Level)
                        .order_by_asc(grade::Column::Level)
                        .into_model::<GradeOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Classes => {
                response.classes = Some(
                    class::Entity::find()
                        .select_only()
                        .column(class::Column::Id)
                        .column(class::Column::Name)
                        .order_by_asc(class::Column::Name)
                        .into_model::<NamedOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Subjects => {
                response.subjects = Some(
                    subject::Entity::find()
                        .select_only()
                        .column(subject::Column::Id)
                        .column(subject::Column::Name)
                        .order_by_asc(subject::Column::Name)
                        .into_model::<NamedOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Teachers => {
                response.teachers = Some(
                    teacher::Entity::find()
                        .select_only()
                        .column(teacher::Column::Id)
                        .column(teacher::Column::Name)
                        .column(teacher::Column::Surname)
                        .order_by_asc(teacher::Column::Surname)
                        .into_model::<PersonOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Parents => {
                response.parents = Some(
                    parent::Entity::find()
                        .select_only()
                        .column(parent::Column::Id)
                        .column(parent::Column::Name)
                        .column(parent::Column::Surname)
                        .order_by_asc(parent::Column::Surname)
                        .into_model::<PersonOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Students => {
                let mut select = student::Entity::find();
                if viewer.role == Role::Teacher {
                    select = select.filter(
                        student::Column::ClassId
                            .in_subquery(scope::class_ids_for_teacher(viewer.user_id)),
                    );
                }
                response.students = Some(
                    select
                        .select_only()
                        .column(student::Column::Id)
                        .column(student::Column::Name)
                        .column(student::Column::Surname)
                        .order_by_asc(student::Column::Surname)
                        .into_model::<PersonOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Lessons => {
                let mut select = lesson::Entity::find();
                if viewer.role == Role::Teacher {
                    select = select.filter(lesson::Column::TeacherId.eq(viewer.user_id));
                }
                response.lessons = Some(
                    select
                        .select_only()
                        .column(lesson::Column::Id)
                        .column(lesson::Column::Name)
                        .order_by_asc(lesson::Column::Name)
                        .into_model::<NamedOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Exams => {
                let mut select = exam::Entity::find();
                if viewer.role == Role::Teacher {
                    select = select.filter(
                        exam::Column::LessonId
                            .in_subquery(scope::lesson_ids_for_teacher(viewer.user_id)),
                    );
                }
                response.exams = Some(
                    select
                        .select_only()
                        .column(exam::Column::Id)
                        .column(exam::Column::Title)
                        .order_by_asc(exam::Column::Title)
                        .into_model::<TitledOption>()
                        .all(&state.db)
                        .await?,
                );
            }
            Lookup::Assignments => {
                let mut select = assignment::Entity::find();
                if viewer.role == Role::Teacher {
                    select = select.filter(
                        assignment::Column::LessonId
                            .in_subquery(scope::lesson_ids_for_teacher(viewer.user_id)),
                    );
                }
                response.assignments = Some(
                    select
                        .select_only()
                        .column(assignment::Column::Id)
                        .column(assignment::Column::Title)
                        .order_by_asc(assignment::Column::Title)
                        .into_model::<TitledOption>()
                        .all(&state.db)
                        .await?,
                );
            }
        }
    }

    Ok(Json(response))
}
