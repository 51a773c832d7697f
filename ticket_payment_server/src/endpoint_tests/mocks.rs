use mockall::mock;
use ticket_payment_engine::{
    db_types::BuyerId,
    traits::{SessionApiError, SessionManagement},
};

mock! {
    pub SessionManager {}
    impl SessionManagement for SessionManager {
        async fn fetch_buyer_id_for_session(&self, token: &str) -> Result<Option<BuyerId>, SessionApiError>;
    }
}
