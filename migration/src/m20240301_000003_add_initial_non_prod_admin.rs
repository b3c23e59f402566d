use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Role};
use password_auth::generate_hash;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, Set};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ModelTrait, QueryFilter};
use service::config::RustEnv;
use std::env;
use std::str::FromStr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let rust_env: RustEnv = RustEnv::from_str(
            env::var("RUST_ENV")
                .unwrap_or_else(|_| "development".to_string())
                .as_str(),
        )
        .unwrap();

        match rust_env {
            RustEnv::Development => insert_initial_admin_user(manager).await,
            RustEnv::Staging => insert_initial_admin_user(manager).await,
            RustEnv::Production => {
                // Production gets its first admin through a separate setup process
                Ok(())
            }
        }
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let rust_env: RustEnv = RustEnv::from_str(
            env::var("RUST_ENV")
                .unwrap_or_else(|_| "development".to_string())
                .as_str(),
        )
        .unwrap();

        match rust_env {
            RustEnv::Development => delete_initial_admin_user(manager).await,
            RustEnv::Staging => delete_initial_admin_user(manager).await,
            RustEnv::Production => Ok(()),
        }
    }
}

async fn insert_initial_admin_user(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let db = manager.get_connection();
    let now = Utc::now();

    ActiveModel {
        email: Set("admin@mangapulse.dev".to_owned()),
        password: Set(Some(generate_hash("password"))),
        display_name: Set(Some("admin".to_owned())),
        nickname: Set(None),
        email_verified_at: Set(Some(now.into())),
        role: Set(Role::Admin),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await?;

    Ok(())
}

async fn delete_initial_admin_user(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let db = manager.get_connection();

    if let Some(user) = Entity::find()
        .filter(Column::Email.eq("admin@mangapulse.dev"))
        .one(db)
        .await?
    {
        user.delete(db).await?;
    }

    Ok(())
}
