use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub capacity: i32,

    pub grade_id: i32,
    #[sea_orm(belongs_to, from = "grade_id", to = "id")]
    pub grade: BelongsTo<super::grade::Entity>,

    pub supervisor_id: Option<i32>,
    #[sea_orm(belongs_to, from = "supervisor_id", to = "id", relation_enum = "supervisor")]
    pub supervisor: BelongsTo<Option<super::teacher::Entity>>,

    #[sea_orm(has_many)]
    pub students: HasMany<super::student::Entity>,

    #[sea_orm(has_many)]
    pub lessons: HasMany<super::lesson::Entity>,

    #[sea_orm(has_many)]
    pub events: HasMany<super::event::Entity>,

    #[sea_orm(has_many)]
    pub announcements: HasMany<super::announcement::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
