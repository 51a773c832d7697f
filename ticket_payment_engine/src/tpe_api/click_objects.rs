use serde::{Deserialize, Serialize};

use crate::{
    helpers::{md5_signature, signature_matches},
    tpe_api::errors::{ClickError, ClickErrorCode},
};

/// The two phases of a Click payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Prepare,
    Complete,
}

impl ClickAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim() {
            "0" => Some(ClickAction::Prepare),
            "1" => Some(ClickAction::Complete),
            _ => None,
        }
    }
}

/// A Prepare or Complete callback, as posted by Click (`application/x-www-form-urlencoded`).
///
/// Every field is kept as the raw string that was received. The signature is computed over these raw values, and
/// numeric fields are only parsed once the signature has been checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickRequest {
    pub click_trans_id: String,
    pub service_id: String,
    pub click_paydoc_id: String,
    pub merchant_trans_id: String,
    pub merchant_prepare_id: String,
    pub amount: String,
    pub action: String,
    pub error: String,
    pub error_note: String,
    pub sign_time: String,
    pub sign_string: String,
}

impl ClickRequest {
    /// The fields covered by the signature, in signing order. `merchant_prepare_id` is only included for Complete.
    fn signed_parts<'a>(&'a self, secret_key: &'a str) -> Vec<&'a str> {
        let mut parts = vec![self.click_trans_id.as_str(), self.service_id.as_str(), secret_key, self.merchant_trans_id.as_str()];
        if ClickAction::parse(&self.action) == Some(ClickAction::Complete) {
            parts.push(self.merchant_prepare_id.as_str());
        }
        parts.extend([self.amount.as_str(), self.action.as_str(), self.sign_time.as_str()]);
        parts
    }

    pub fn expected_signature(&self, secret_key: &str) -> String {
        md5_signature(&self.signed_parts(secret_key))
    }

    pub fn signature_is_valid(&self, secret_key: &str) -> bool {
        !self.sign_string.is_empty() && signature_matches(&self.signed_parts(secret_key), &self.sign_string)
    }

    /// Signs the request in place. Click does this on its side; this is used to build requests in tests and tools.
    pub fn sign(mut self, secret_key: &str) -> Self {
        self.sign_string = self.expected_signature(secret_key);
        self
    }

    pub fn click_trans_id(&self) -> Result<i64, ClickError> {
        self.click_trans_id.trim().parse().map_err(|_| ClickError::BadRequest("click_trans_id"))
    }

    /// The provider-side error code. A missing value means no error.
    pub fn provider_error(&self) -> Result<i32, ClickError> {
        let error = self.error.trim();
        if error.is_empty() {
            return Ok(0);
        }
        error.parse().map_err(|_| ClickError::BadRequest("error"))
    }

    /// The prepare id echoed on Complete. A missing value is reported as `None`.
    pub fn merchant_prepare_id(&self) -> Result<Option<i64>, ClickError> {
        let id = self.merchant_prepare_id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        id.parse().map(Some).map_err(|_| ClickError::BadRequest("merchant_prepare_id"))
    }
}

/// The flat JSON answer to every Click callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickResponse {
    pub click_trans_id: i64,
    pub merchant_trans_id: String,
    pub merchant_prepare_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_confirm_id: Option<i64>,
    pub error: i32,
    pub error_note: String,
}

impl ClickResponse {
    pub fn success(request: &ClickRequest, click_trans_id: i64, prepare_id: i64) -> Self {
        Self {
            click_trans_id,
            merchant_trans_id: request.merchant_trans_id.clone(),
            merchant_prepare_id: prepare_id,
            merchant_confirm_id: None,
            error: ClickErrorCode::Success.code(),
            error_note: "Success".to_string(),
        }
    }

    pub fn failure(request: &ClickRequest, click_trans_id: i64, prepare_id: i64, err: &ClickError) -> Self {
        Self {
            click_trans_id,
            merchant_trans_id: request.merchant_trans_id.clone(),
            merchant_prepare_id: prepare_id,
            merchant_confirm_id: None,
            error: err.code().code(),
            error_note: err.note(),
        }
    }

    pub fn with_confirm_id(mut self, confirm_id: i64) -> Self {
        self.merchant_confirm_id = Some(confirm_id);
        self
    }

    pub fn is_success(&self) -> bool {
        self.error == ClickErrorCode::Success.code()
    }
}
