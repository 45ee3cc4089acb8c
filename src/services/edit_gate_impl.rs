//! `SeaORM` implementation of the `EditGate` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::constants::seguridad::{DEFAULT_CLAVE_EDICION, MIN_CLAVE_LEN};
use crate::db::Store;
use crate::db::repositories::user::{hash_password, verify_hash};
use crate::services::edit_gate::{EditGate, GateError, Verdict};

pub struct SeaOrmEditGate {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmEditGate {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash(&self, clave: &str) -> Result<String, GateError> {
        let clave = clave.to_string();
        let config = self.security.clone();
        task::spawn_blocking(move || hash_password(&clave, Some(&config)))
            .await
            .map_err(|e| GateError::Internal(format!("Hashing task panicked: {e}")))?
            .map_err(|e| GateError::Internal(e.to_string()))
    }

    /// Stored key hash for the user, seeding the documented default when no
    /// row exists yet.
    async fn stored_hash(&self, owner_user_id: i32) -> Result<String, GateError> {
        if let Some(profile) = self.store.get_profile(owner_user_id).await? {
            return Ok(profile.clave_edicion);
        }

        info!("No edit key stored for user {owner_user_id}, seeding the default");
        let hash = self.hash(DEFAULT_CLAVE_EDICION).await?;
        self.store.upsert_profile(owner_user_id, &hash).await?;
        Ok(hash)
    }

    async fn matches(&self, owner_user_id: i32, submitted: &str) -> Result<bool, GateError> {
        let hash = self.stored_hash(owner_user_id).await?;
        verify_hash(hash, submitted.to_string())
            .await
            .map_err(|e| GateError::Internal(e.to_string()))
    }
}

#[async_trait]
impl EditGate for SeaOrmEditGate {
    async fn verify(
        &self,
        owner_user_id: i32,
        session_user_id: i32,
        submitted: &str,
    ) -> Result<Verdict, GateError> {
        if submitted.is_empty() {
            return Ok(Verdict::Denied);
        }

        if owner_user_id != session_user_id {
            warn!(
                "Edit-key verification for user {owner_user_id} attempted by session user {session_user_id}"
            );
            return Ok(Verdict::Denied);
        }

        if self.matches(owner_user_id, submitted).await? {
            Ok(Verdict::Authorized)
        } else {
            Ok(Verdict::Denied)
        }
    }

    async fn change_clave(
        &self,
        owner_user_id: i32,
        actual: &str,
        nueva: &str,
        confirmacion: &str,
    ) -> Result<(), GateError> {
        if actual.is_empty() || nueva.is_empty() || confirmacion.is_empty() {
            return Err(GateError::Validation(
                "Todos los campos son obligatorios".to_string(),
            ));
        }

        if nueva != confirmacion {
            return Err(GateError::Validation(
                "Las nuevas claves no coinciden".to_string(),
            ));
        }

        if nueva.chars().count() < MIN_CLAVE_LEN {
            return Err(GateError::Validation(format!(
                "La nueva clave debe tener al menos {MIN_CLAVE_LEN} caracteres"
            )));
        }

        if nueva == DEFAULT_CLAVE_EDICION {
            return Err(GateError::Validation(
                "La nueva clave no puede ser la clave por defecto".to_string(),
            ));
        }

        if nueva == actual {
            return Err(GateError::Validation(
                "La nueva clave debe ser distinta de la actual".to_string(),
            ));
        }

        if !self.matches(owner_user_id, actual).await? {
            return Err(GateError::Denied);
        }

        let hash = self.hash(nueva).await?;
        self.store.upsert_profile(owner_user_id, &hash).await?;
        info!("Edit key changed for user {owner_user_id}");
        Ok(())
    }

    async fn reset_to_default(&self, owner_user_id: i32) -> Result<(), GateError> {
        let hash = self.hash(DEFAULT_CLAVE_EDICION).await?;
        self.store.upsert_profile(owner_user_id, &hash).await?;
        warn!("Edit key for user {owner_user_id} reset to the documented default");
        Ok(())
    }
}
