use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::*;
use thiserror::Error;
use ticket_payment_engine::{helpers::PayLinkError, CheckoutError, SessionError};

/// Errors for the buyer-facing endpoints. The provider callbacks never produce these; they always answer in their own
/// protocol.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Not authenticated. {0}")]
    Unauthenticated(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "error": self.to_string() }).to_string())
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::BuyerNotFound(_) | CheckoutError::NoMatchingItems => Self::NoRecordFound(e.to_string()),
            CheckoutError::AlreadyPaid(_) | CheckoutError::EmptySelection => Self::InvalidRequest(e.to_string()),
            CheckoutError::PayLink(PayLinkError::MissingMerchantConfig(_)) => Self::ConfigurationError(e.to_string()),
            CheckoutError::PayLink(PayLinkError::InvalidAmount(_)) => Self::BackendError(e.to_string()),
            CheckoutError::DatabaseError(_) => {
                error!("💻️ Checkout failed on the backend. {e}");
                Self::BackendError("The order could not be created".to_string())
            },
        }
    }
}

impl From<SessionError> for ServerError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingToken | SessionError::UnknownSession => Self::Unauthenticated(e.to_string()),
            SessionError::Backend(e) => {
                error!("💻️ Could not resolve the session. {e}");
                Self::BackendError("Session lookup failed".to_string())
            },
        }
    }
}
