//! Subquery builders for the role-scope predicates ANDed into list queries.
//!
//! Each builder returns a `SELECT` usable with `Column::in_subquery`, so a
//! handler can express "rows linked to the viewer's teaching graph" without
//! joining the scoping tables into the page query itself.

use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Query as SeaQuery, SelectStatement};
use sea_orm::{ColumnTrait, Condition};

use crate::entity::{assignment, class, exam, lesson, student, subject_teacher};

/// A condition that matches no rows. The scope of an unresolved role.
pub fn nothing() -> Condition {
    Condition::all().add(Expr::value(false))
}

/// IDs of the lessons taught by a teacher.
pub fn lesson_ids_for_teacher(teacher_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(lesson::Column::Id)
        .from(lesson::Entity)
        .and_where(lesson::Column::TeacherId.eq(teacher_id))
        .to_owned()
}

/// IDs of the classes a teacher teaches at least one lesson in.
pub fn class_ids_for_teacher(teacher_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(lesson::Column::ClassId)
        .from(lesson::Entity)
        .and_where(lesson::Column::TeacherId.eq(teacher_id))
        .to_owned()
}

/// IDs of the subjects assigned to a teacher.
pub fn subject_ids_for_teacher(teacher_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(subject_teacher::Column::SubjectId)
        .from(subject_teacher::Entity)
        .and_where(subject_teacher::Column::TeacherId.eq(teacher_id))
        .to_owned()
}

/// IDs of a parent's children.
pub fn student_ids_for_parent(parent_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(student::Column::Id)
        .from(student::Entity)
        .and_where(student::Column::ParentId.eq(parent_id))
        .to_owned()
}

/// Class IDs of a parent's children.
pub fn class_ids_for_parent(parent_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(student::Column::ClassId)
        .from(student::Entity)
        .and_where(student::Column::ParentId.eq(parent_id))
        .to_owned()
}

/// Class ID of a student (as a one-row subquery).
pub fn class_id_for_student(student_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(student::Column::ClassId)
        .from(student::Entity)
        .and_where(student::Column::Id.eq(student_id))
        .to_owned()
}

/// Teacher IDs of everyone teaching any of the given classes.
pub fn teacher_ids_for_classes(class_ids: SelectStatement) -> SelectStatement {
    SeaQuery::select()
        .column(lesson::Column::TeacherId)
        .from(lesson::Entity)
        .and_where(Expr::col(lesson::Column::ClassId).in_subquery(class_ids))
        .to_owned()
}

/// Subject IDs taught in any of the given classes.
pub fn subject_ids_for_classes(class_ids: SelectStatement) -> SelectStatement {
    SeaQuery::select()
        .column(lesson::Column::SubjectId)
        .from(lesson::Entity)
        .and_where(Expr::col(lesson::Column::ClassId).in_subquery(class_ids))
        .to_owned()
}

/// Lesson IDs held in any of the given classes.
pub fn lesson_ids_for_classes(class_ids: SelectStatement) -> SelectStatement {
    SeaQuery::select()
        .column(lesson::Column::Id)
        .from(lesson::Entity)
        .and_where(Expr::col(lesson::Column::ClassId).in_subquery(class_ids))
        .to_owned()
}

/// Lesson IDs held in one class.
pub fn lesson_ids_for_class(class_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(lesson::Column::Id)
        .from(lesson::Entity)
        .and_where(lesson::Column::ClassId.eq(class_id))
        .to_owned()
}

/// Parent IDs of the students in any of the given classes.
pub fn parent_ids_for_classes(class_ids: SelectStatement) -> SelectStatement {
    SeaQuery::select()
        .column(student::Column::ParentId)
        .from(student::Entity)
        .and_where(Expr::col(student::Column::ClassId).in_subquery(class_ids))
        .to_owned()
}

/// Parent ID of a student (as a one-row subquery).
pub fn parent_id_for_student(student_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(student::Column::ParentId)
        .from(student::Entity)
        .and_where(student::Column::Id.eq(student_id))
        .to_owned()
}

/// IDs of the classes a teacher supervises.
pub fn supervised_class_ids(teacher_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(class::Column::Id)
        .from(class::Entity)
        .and_where(class::Column::SupervisorId.eq(teacher_id))
        .to_owned()
}

/// Teacher IDs of everyone teaching a lesson in one class.
pub fn teacher_ids_for_class(class_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(lesson::Column::TeacherId)
        .from(lesson::Entity)
        .and_where(lesson::Column::ClassId.eq(class_id))
        .to_owned()
}

/// IDs of the exams scheduled under a teacher's own lessons.
pub fn exam_ids_for_teacher(teacher_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(exam::Column::Id)
        .from(exam::Entity)
        .and_where(Expr::col(exam::Column::LessonId).in_subquery(lesson_ids_for_teacher(teacher_id)))
        .to_owned()
}

/// IDs of the assignments given under a teacher's own lessons.
pub fn assignment_ids_for_teacher(teacher_id: i32) -> SelectStatement {
    SeaQuery::select()
        .column(assignment::Column::Id)
        .from(assignment::Entity)
        .and_where(
            Expr::col(assignment::Column::LessonId).in_subquery(lesson_ids_for_teacher(teacher_id)),
        )
        .to_owned()
}
