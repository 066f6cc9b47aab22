use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sex::Sex;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teacher")]
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
    pub img: Option<String>, // URL; images are hosted elsewhere
    pub blood_type: String,
    pub sex: Sex,
    pub birthday: Date,

    #[sea_orm(has_many)]
    pub lessons: HasMany<super::lesson::Entity>,

    #[sea_orm(has_many)]
    pub classes: HasMany<super::class::Entity>,

    #[sea_orm(has_many, via = "subject_teacher")]
    pub subjects: HasMany<super::subject::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
