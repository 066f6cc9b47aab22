use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grade")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub level: i32,

    #[sea_orm(has_many)]
    pub students: HasMany<super::student::Entity>,

    #[sea_orm(has_many)]
    pub classes: HasMany<super::class::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
