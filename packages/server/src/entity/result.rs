use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A score a student earned on exactly one of an exam or an assignment.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "result")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub score: i32, // 0-100

    pub student_id: i32,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: BelongsTo<super::student::Entity>,

    pub exam_id: Option<i32>,
    #[sea_orm(belongs_to, from = "exam_id", to = "id")]
    pub exam: BelongsTo<Option<super::exam::Entity>>,

    pub assignment_id: Option<i32>,
    #[sea_orm(belongs_to, from = "assignment_id", to = "id")]
    pub assignment: BelongsTo<Option<super::assignment::Entity>>,
}

impl ActiveModelBehavior for ActiveModel {}
