use std::fmt::Debug;

use log::*;

use crate::{db_types::BuyerId, tpe_api::errors::SessionError, traits::SessionManagement};

/// Resolves the session token presented by a buyer into the buyer's id.
pub struct SessionApi<S> {
    store: S,
}

impl<S> Debug for SessionApi<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionApi")
    }
}

impl<S> SessionApi<S>
where S: SessionManagement
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn authenticate(&self, token: Option<&str>) -> Result<BuyerId, SessionError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(SessionError::MissingToken)?;
        match self.store.fetch_buyer_id_for_session(token).await? {
            Some(buyer_id) => {
                trace!("🔑️ Session resolved to {buyer_id}");
                Ok(buyer_id)
            },
            None => {
                debug!("🔑️ Unknown session token presented");
                Err(SessionError::UnknownSession)
            },
        }
    }
}
