//! Shared request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::backend::jwt::{Claims, Permissions};

/// Generic success response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// GET /health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
    pub claims: String,
    pub registry: String,
}

/// GET /api/auth/me and /api/staff/me response: the user claims snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaimsResponse {
    pub id: Option<String>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub permissions: Permissions,
    pub location_code: Option<String>,
}

impl From<Claims> for UserClaimsResponse {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.subject(),
            role: claims.role_name().map(String::from),
            permissions: claims.permissions(),
            username: claims.username,
            location_code: claims.location_code,
        }
    }
}

/// POST /api/recaptcha/verify response.
#[derive(Debug, Serialize)]
pub struct RecaptchaResponse {
    pub success: bool,
    pub score: f64,
}

/// Body returned by the reCAPTCHA `siteverify` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteVerifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
}

/// Registry login request body.
#[derive(Debug, Serialize)]
pub struct RegistryLoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::jwt::{RoleClaim, RoleDetails};

    #[test]
    fn test_claims_snapshot_serialization() {
        let claims = Claims {
            sub: Some(serde_json::json!(31)),
            username: Some("officer".into()),
            role: Some(RoleClaim::Detailed(RoleDetails {
                name: Some("staff".into()),
                can_add: true,
                can_update: false,
                can_delete: false,
            })),
            location_code: Some("WB-07".into()),
            exp: None,
        };
        let json = serde_json::to_value(UserClaimsResponse::from(claims)).unwrap();
        assert_eq!(json["id"], "31");
        assert_eq!(json["role"], "staff");
        assert_eq!(json["locationCode"], "WB-07");
        assert_eq!(json["permissions"]["canAdd"], true);
        assert_eq!(json["permissions"]["canDelete"], false);
    }

    #[test]
    fn test_site_verify_deserialization() {
        let json = r#"{"success": true, "score": 0.7, "action": "login"}"#;
        let resp: SiteVerifyResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.score, Some(0.7));
        assert!(resp.error_codes.is_empty());
    }

    #[test]
    fn test_site_verify_error_codes() {
        let json = r#"{"success": false, "error-codes": ["invalid-input-response"]}"#;
        let resp: SiteVerifyResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.success);
        assert!(resp.score.is_none());
        assert_eq!(resp.error_codes, vec!["invalid-input-response"]);
    }

    #[test]
    fn test_success_response() {
        let json = serde_json::to_value(SuccessResponse { success: true }).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }
}
