use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A notice, either school-wide (`class_id` null) or for one class.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "announcement")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,
    pub date: DateTimeUtc,

    pub class_id: Option<i32>,
    #[sea_orm(belongs_to, from = "class_id", to = "id")]
    pub class: BelongsTo<Option<super::class::Entity>>,
}

impl ActiveModelBehavior for ActiveModel {}
