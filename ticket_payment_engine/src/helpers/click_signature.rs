//! # Click request signatures
//!
//! Click signs every Prepare and Complete callback with an MD5 digest over the request fields and the shared secret:
//!
//! ```text
//!    md5(click_trans_id + service_id + secret_key + merchant_trans_id + [merchant_prepare_id] + amount + action + sign_time)
//! ```
//!
//! `merchant_prepare_id` only takes part in Complete requests. Fields are concatenated exactly as they were received,
//! so that formatting differences (e.g. `1000` vs `1000.00`) never cause a spurious mismatch.

/// Lowercase hex MD5 over the concatenation of `parts`.
pub fn md5_signature(parts: &[&str]) -> String {
    format!("{:x}", md5::compute(parts.concat()))
}

pub fn signature_matches(parts: &[&str], provided: &str) -> bool {
    md5_signature(parts) == provided.trim()
}
