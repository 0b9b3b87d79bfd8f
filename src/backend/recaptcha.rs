//! reCAPTCHA v3 verification.

use crate::backend::client::{UpstreamError, execute};
use crate::config::Config;
use crate::types::SiteVerifyResponse;

/// Lowest score accepted as human.
pub const MIN_SCORE: f64 = 0.5;

/// Outcome of a `siteverify` call.
#[derive(Debug, Clone)]
pub struct CaptchaVerdict {
    pub success: bool,
    pub score: f64,
    pub action: Option<String>,
    pub error_codes: Vec<String>,
}

impl CaptchaVerdict {
    pub fn passes(&self) -> bool {
        self.success && self.score >= MIN_SCORE
    }
}

impl From<SiteVerifyResponse> for CaptchaVerdict {
    fn from(resp: SiteVerifyResponse) -> Self {
        Self {
            success: resp.success,
            score: resp.score.unwrap_or(0.0),
            action: resp.action,
            error_codes: resp.error_codes,
        }
    }
}

/// POST the client token to the verification endpoint.
pub async fn verify_token(
    http_client: &reqwest::Client,
    config: &Config,
    token: &str,
) -> Result<CaptchaVerdict, UpstreamError> {
    let params = [
        ("secret", config.recaptcha_secret.as_str()),
        ("response", token),
    ];
    let resp = execute(http_client.post(&config.recaptcha_verify_url).form(&params)).await?;

    let body: SiteVerifyResponse =
        serde_json::from_value(resp.body).map_err(|e| UpstreamError::Decode(e.to_string()))?;
    Ok(body.into())
}
