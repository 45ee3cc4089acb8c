use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{encastes, gallos, profiles};
use crate::models::encaste::EncasteInput;
use crate::models::gallo::GalloInput;

pub mod migrator;
pub mod repositories;

pub use repositories::encaste::EncasteTotals;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn gallo_repo(&self) -> repositories::gallo::GalloRepository {
        repositories::gallo::GalloRepository::new(self.conn.clone())
    }

    fn encaste_repo(&self) -> repositories::encaste::EncasteRepository {
        repositories::encaste::EncasteRepository::new(self.conn.clone())
    }

    fn profile_repo(&self) -> repositories::profile::ProfileRepository {
        repositories::profile::ProfileRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Gallos ==========

    pub async fn add_gallo(
        &self,
        user_id: i32,
        input: &GalloInput,
        fotos: &HashMap<String, String>,
    ) -> Result<gallos::Model> {
        self.gallo_repo().add(user_id, input, fotos).await
    }

    pub async fn get_gallo(&self, id: &str, user_id: i32) -> Result<Option<gallos::Model>> {
        self.gallo_repo().get(id, user_id).await
    }

    pub async fn list_gallos(&self, user_id: i32) -> Result<Vec<gallos::Model>> {
        self.gallo_repo().list(user_id).await
    }

    pub async fn update_gallo(
        &self,
        existing: gallos::Model,
        input: &GalloInput,
        fotos: &HashMap<String, String>,
    ) -> Result<gallos::Model> {
        self.gallo_repo().update(existing, input, fotos).await
    }

    pub async fn remove_gallo(&self, id: &str, user_id: i32) -> Result<bool> {
        self.gallo_repo().remove(id, user_id).await
    }

    pub async fn count_gallos(&self, user_id: i32) -> Result<u64> {
        self.gallo_repo().count(user_id).await
    }

    pub async fn count_gallos_created_between(
        &self,
        user_id: i32,
        desde: &str,
        hasta: Option<&str>,
    ) -> Result<u64> {
        self.gallo_repo()
            .count_created_between(user_id, desde, hasta)
            .await
    }

    // ========== Encastes ==========

    pub async fn add_encaste(
        &self,
        user_id: i32,
        input: &EncasteInput,
        imagenes: &HashMap<String, String>,
    ) -> Result<encastes::Model> {
        self.encaste_repo().add(user_id, input, imagenes).await
    }

    pub async fn get_encaste(&self, id: &str, user_id: i32) -> Result<Option<encastes::Model>> {
        self.encaste_repo().get(id, user_id).await
    }

    pub async fn list_encastes(&self, user_id: i32) -> Result<Vec<encastes::Model>> {
        self.encaste_repo().list(user_id).await
    }

    pub async fn update_encaste(
        &self,
        existing: encastes::Model,
        input: &EncasteInput,
        imagenes: &HashMap<String, String>,
    ) -> Result<encastes::Model> {
        self.encaste_repo().update(existing, input, imagenes).await
    }

    pub async fn remove_encaste(&self, id: &str, user_id: i32) -> Result<bool> {
        self.encaste_repo().remove(id, user_id).await
    }

    pub async fn encaste_totals(&self, user_id: i32) -> Result<EncasteTotals> {
        self.encaste_repo().totals(user_id).await
    }

    pub async fn count_encastes_created_between(
        &self,
        user_id: i32,
        desde: &str,
        hasta: Option<&str>,
    ) -> Result<u64> {
        self.encaste_repo()
            .count_created_between(user_id, desde, hasta)
            .await
    }

    // ========== Edit-key profiles ==========

    pub async fn get_profile(&self, user_id: i32) -> Result<Option<profiles::Model>> {
        self.profile_repo().get_by_user(user_id).await
    }

    pub async fn upsert_profile(&self, user_id: i32, clave_hash: &str) -> Result<()> {
        self.profile_repo().upsert(user_id, clave_hash).await
    }

    // ========== Users ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(username, password, config).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }
}
