//! Domain service for the secondary edit key ("clave de edición").
//!
//! Separate from login authentication: a session alone may read records, but
//! every edit or delete must present the owner's edit key again. Nothing is
//! remembered between requests; each mutation attempt re-verifies.

use thiserror::Error;

/// Errors specific to edit-key operations.
#[derive(Debug, Error)]
pub enum GateError {
    /// Submitted key does not match the stored one.
    #[error("Clave de edición incorrecta")]
    Denied,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for GateError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Outcome of one verification attempt. `Authorized` covers exactly the one
/// mutation request that carried the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Authorized,
    Denied,
}

impl Verdict {
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Domain service trait for the edit gate.
#[async_trait::async_trait]
pub trait EditGate: Send + Sync {
    /// Checks a submitted key against the stored key of `owner_user_id`.
    ///
    /// Fails closed (`Denied`) when the owner is not the session user, no
    /// matter what was submitted. When the owner has no stored key yet, the
    /// documented default key is seeded and compared against (self-healing
    /// of missing configuration).
    async fn verify(
        &self,
        owner_user_id: i32,
        session_user_id: i32,
        submitted: &str,
    ) -> Result<Verdict, GateError>;

    /// Replaces the stored key after validating the change request.
    ///
    /// # Errors
    ///
    /// [`GateError::Validation`] for empty fields, a confirmation mismatch, a
    /// key shorter than the minimum, reuse of the documented default, or a
    /// no-op change; [`GateError::Denied`] when `actual` does not verify.
    async fn change_clave(
        &self,
        owner_user_id: i32,
        actual: &str,
        nueva: &str,
        confirmacion: &str,
    ) -> Result<(), GateError>;

    /// Unconditionally restores the documented default key. Recovery escape
    /// hatch; the caller's primary session (or operator CLI access) is the
    /// only guard.
    async fn reset_to_default(&self, owner_user_id: i32) -> Result<(), GateError>;
}
