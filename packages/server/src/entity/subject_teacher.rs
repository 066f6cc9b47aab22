use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subject_teacher")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub subject_id: i32,
    #[sea_orm(primary_key)]
    pub teacher_id: i32,
    #[sea_orm(belongs_to, from = "subject_id", to = "id")]
    pub subject: BelongsTo<super::subject::Entity>,
    #[sea_orm(belongs_to, from = "teacher_id", to = "id")]
    pub teacher: BelongsTo<super::teacher::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
