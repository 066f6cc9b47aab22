use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sex::Sex;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,

    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: String,
    pub img: Option<String>,
    pub blood_type: String,
    pub sex: Sex,
    pub birthday: Date,

    pub grade_id: i32,
    #[sea_orm(belongs_to, from = "grade_id", to = "id")]
    pub grade: BelongsTo<super::grade::Entity>,

    pub class_id: i32,
    #[sea_orm(belongs_to, from = "class_id", to = "id")]
    pub class: BelongsTo<super::class::Entity>,

    pub parent_id: i32,
    #[sea_orm(belongs_to, from = "parent_id", to = "id")]
    pub parent: BelongsTo<super::parent::Entity>,

    #[sea_orm(has_many)]
    pub results: HasMany<super::result::Entity>,

    #[sea_orm(has_many)]
    pub attendances: HasMany<super::attendance::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
