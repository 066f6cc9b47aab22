use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/teachers", teacher_routes())
        .nest("/students", student_routes())
        .nest("/parents", parent_routes())
        .nest("/subjects", subject_routes())
        .nest("/classes", class_routes())
        .nest("/lessons", lesson_routes())
        .nest("/exams", exam_routes())
        .nest("/assignments", assignment_routes())
        .nest("/results", result_routes())
        .nest("/attendance", attendance_routes())
        .nest("/events", event_routes())
        .nest("/announcements", announcement_routes())
        .nest("/forms", form_routes())
        .routes(routes!(handlers::overview::overview))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn teacher_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::teacher::list_teachers,
            handlers::teacher::create_teacher
        ))
        .routes(routes!(
            handlers::teacher::get_teacher,
            handlers::teacher::update_teacher,
            handlers::teacher::delete_teacher
        ))
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::student::list_students,
            handlers::student::create_student
        ))
        .routes(routes!(
            handlers::student::get_student,
            handlers::student::update_student,
            handlers::student::delete_student
        ))
}

fn parent_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::parent::list_parents,
            handlers::parent::create_parent
        ))
        .routes(routes!(
            handlers::parent::get_parent,
            handlers::parent::update_parent,
            handlers::parent::delete_parent
        ))
}

fn subject_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::subject::list_subjects,
            handlers::subject::create_subject
        ))
        .routes(routes!(
            handlers::subject::get_subject,
            handlers::subject::update_subject,
            handlers::subject::delete_subject
        ))
}

fn class_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::class::list_classes,
            handlers::class::create_class
        ))
        .routes(routes!(
            handlers::class::get_class,
            handlers::class::update_class,
            handlers::class::delete_class
        ))
}

fn lesson_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::lesson::list_lessons,
            handlers::lesson::create_lesson
        ))
        .routes(routes!(
            handlers::lesson::get_lesson,
            handlers::lesson::update_lesson,
            handlers::lesson::delete_lesson
        ))
}

fn exam_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::exam::list_exams,
            handlers::exam::create_exam
        ))
        .routes(routes!(
            handlers::exam::get_exam,
            handlers::exam::update_exam,
            handlers::exam::delete_exam
        ))
}

fn assignment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::assignment::list_assignments,
            handlers::assignment::create_assignment
        ))
        .routes(routes!(
            handlers::assignment::get_assignment,
            handlers::assignment::update_assignment,
            handlers::assignment::delete_assignment
        ))
}

fn result_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::result::list_results,
            handlers::result::create_result
        ))
        .routes(routes!(
            handlers::result::get_result,
            handlers::result::update_result,
            handlers::result::delete_result
        ))
}

fn attendance_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::attendance::list_attendance,
            handlers::attendance::create_attendance
        ))
        .routes(routes!(
            handlers::attendance::get_attendance,
            handlers::attendance::update_attendance,
            handlers::attendance::delete_attendance
        ))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::list_events,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::get_event,
            handlers::event::update_event,
            handlers::event::delete_event
        ))
}

fn announcement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::announcement::list_announcements,
            handlers::announcement::create_announcement
        ))
        .routes(routes!(
            handlers::announcement::get_announcement,
            handlers::announcement::update_announcement,
            handlers::announcement::delete_announcement
        ))
}

fn form_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::lookups::form_options))
}
