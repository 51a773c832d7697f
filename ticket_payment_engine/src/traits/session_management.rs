use thiserror::Error;

use crate::db_types::BuyerId;

#[derive(Debug, Clone, Error)]
pub enum SessionApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for SessionApiError {
    fn from(e: sqlx::Error) -> Self {
        SessionApiError::DatabaseError(e.to_string())
    }
}

/// Resolves session tokens issued by the login collaborator. Sessions are never created or destroyed here.
#[allow(async_fn_in_trait)]
pub trait SessionManagement {
    /// Returns the buyer that owns the session, or `None` if the token is unknown.
    async fn fetch_buyer_id_for_session(&self, token: &str) -> Result<Option<BuyerId>, SessionApiError>;
}
