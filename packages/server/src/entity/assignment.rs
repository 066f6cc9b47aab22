use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub start_date: DateTimeUtc,
    pub due_date: DateTimeUtc,

    pub lesson_id: i32,
    #[sea_orm(belongs_to, from = "lesson_id", to = "id")]
    pub lesson: BelongsTo<super::lesson::Entity>,

    #[sea_orm(has_many)]
    pub results: HasMany<super::result::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
