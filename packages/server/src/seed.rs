use sea_orm::*;
use tracing::info;

use crate::config::AppConfig;
use crate::entity::{admin, grade};
use crate::error::AppError;
use crate::utils::hash;

/// Grade levels seeded on startup.
const GRADE_LEVELS: &[i32] = &[1, 2, 3, 4, 5, 6];

/// Seed the `grade` table with the standard levels.
pub async fn seed_grades(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &level in GRADE_LEVELS {
        let model = grade::ActiveModel {
            level: Set(level),
            ..Default::default()
        };

        let result = grade::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(grade::Column::Level)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new grade levels", inserted);
    }

    Ok(())
}

/// Create the bootstrap administrator account if it does not exist yet.
pub async fn seed_admin(db: &DatabaseConnection, config: &AppConfig) -> Result<(), AppError> {
    let username = config.auth.admin_username.trim();

    let existing = admin::Entity::find()
        .filter(admin::Column::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = hash::hash_password(&config.auth.admin_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let model = admin::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(_) => {
            info!("Seeded bootstrap admin account '{}'", username);
            Ok(())
        }
        // A concurrent instance won the race; the account exists either way.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Run all idempotent startup seeding.
pub async fn seed_initial_data(db: &DatabaseConnection, config: &AppConfig) -> Result<(), AppError> {
    seed_grades(db).await?;
    seed_admin(db, config).await?;
    Ok(())
}
