//! JWT claim reading for backend-issued bearer tokens.
//!
//! Claims decoded here only steer redirects and the `/me` snapshots. The
//! backend re-validates the bearer token on every proxied call, so it stays
//! the real trust boundary. When a shared secret is configured every read
//! also verifies the HS256 signature.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claims carried by general and staff tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, alias = "id", alias = "userId")]
    pub sub: Option<Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<RoleClaim>,
    #[serde(default, alias = "locationCode")]
    pub location_code: Option<String>,
    #[serde(default)]
    pub exp: Option<u64>,
}

/// The `role` claim: a bare role name, or a role object with permission flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    Name(String),
    Detailed(RoleDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDetails {
    #[serde(default, alias = "roleName")]
    pub name: Option<String>,
    #[serde(default)]
    pub can_add: bool,
    #[serde(default)]
    pub can_update: bool,
    #[serde(default)]
    pub can_delete: bool,
}

/// Permission flags derived from the role claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_add: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl Claims {
    /// Role name regardless of which shape the claim took.
    pub fn role_name(&self) -> Option<&str> {
        match self.role.as_ref()? {
            RoleClaim::Name(name) => Some(name.as_str()),
            RoleClaim::Detailed(details) => details.name.as_deref(),
        }
    }

    pub fn permissions(&self) -> Permissions {
        match &self.role {
            Some(RoleClaim::Detailed(d)) => Permissions {
                can_add: d.can_add,
                can_update: d.can_update,
                can_delete: d.can_delete,
            },
            _ => Permissions::default(),
        }
    }

    /// Subject id as a string (numeric ids are rendered without quotes).
    pub fn subject(&self) -> Option<String> {
        match self.sub.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Decode a JWT payload without signature verification.
///
/// Needs at least two `.`-separated segments; the second must be base64url
/// JSON (padded or unpadded).
pub fn decode_jwt_unverified(token: &str) -> Result<Claims, JwtError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload)) = (parts.next(), parts.next()) else {
        return Err(JwtError::InvalidFormat);
    };

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| JwtError::InvalidFormat)?;

    serde_json::from_slice(&payload_bytes).map_err(|_| JwtError::InvalidPayload)
}

/// Verify an HS256 token against the shared secret and return its claims.
///
/// `exp` is enforced when present; no other registered claim is required.
pub fn verify_jwt(token: &str, key: &DecodingKey) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims::<&str>(&[]);
    validation.validate_aud = false;

    decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::Validation(e.to_string()))
}

/// Reads claims under the configured policy: verify when a secret exists,
/// decode unverified otherwise.
#[derive(Clone)]
pub struct ClaimReader {
    key: Option<DecodingKey>,
}

impl ClaimReader {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
        }
    }

    pub fn verifies(&self) -> bool {
        self.key.is_some()
    }

    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        match &self.key {
            Some(key) => verify_jwt(token, key),
            None => decode_jwt_unverified(token),
        }
    }

    /// Claims or `None`; a token that fails to decode counts as absent.
    pub fn read(&self, token: &str) -> Option<Claims> {
        match self.decode(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("Ignoring undecodable token: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Invalid JWT format")]
    InvalidFormat,

    #[error("JWT payload is not a JSON claims object")]
    InvalidPayload,

    #[error("JWT validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    fn make_unsigned_jwt(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.sig")
    }

    fn make_signed_jwt(claims: &Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_plain_role() {
        let token = make_unsigned_jwt(&json!({
            "id": 17,
            "username": "district-admin",
            "role": "admin",
            "locationCode": "WB-19"
        }));
        let claims = decode_jwt_unverified(&token).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("17"));
        assert_eq!(claims.username.as_deref(), Some("district-admin"));
        assert_eq!(claims.role_name(), Some("admin"));
        assert_eq!(claims.location_code.as_deref(), Some("WB-19"));
        assert_eq!(claims.permissions(), Permissions::default());
    }

    #[test]
    fn test_decode_detailed_role() {
        let token = make_unsigned_jwt(&json!({
            "sub": "staff-9",
            "role": {"name": "staff", "canAdd": true, "canUpdate": true, "canDelete": false}
        }));
        let claims = decode_jwt_unverified(&token).unwrap();
        assert_eq!(claims.role_name(), Some("staff"));
        assert_eq!(
            claims.permissions(),
            Permissions {
                can_add: true,
                can_update: true,
                can_delete: false
            }
        );
    }

    #[test]
    fn test_two_segments_are_enough() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"role":"admin"}"#);
        let claims = decode_jwt_unverified(&format!("header.{payload}")).unwrap();
        assert_eq!(claims.role_name(), Some("admin"));
    }

    #[test]
    fn test_padded_payload_accepted() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"role":"ad"}"#);
        assert!(payload.ends_with('='));
        let claims = decode_jwt_unverified(&format!("h.{payload}.s")).unwrap();
        assert_eq!(claims.role_name(), Some("ad"));
    }

    #[test]
    fn test_decode_invalid_format() {
        assert!(decode_jwt_unverified("").is_err());
        assert!(decode_jwt_unverified("no-dots-here").is_err());
        assert!(decode_jwt_unverified("a.!!!.c").is_err());
    }

    #[test]
    fn test_decode_non_json_payload() {
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(matches!(
            decode_jwt_unverified(&format!("h.{payload}.s")),
            Err(JwtError::InvalidPayload)
        ));
        let array = URL_SAFE_NO_PAD.encode(b"[1,2]");
        assert!(decode_jwt_unverified(&format!("h.{array}.s")).is_err());
    }

    #[test]
    fn test_reader_swallows_failures() {
        let reader = ClaimReader::new(None);
        assert!(reader.read("garbage").is_none());
        assert!(!reader.verifies());
    }

    #[test]
    fn test_verifying_reader_accepts_signed_token() {
        let token = make_signed_jwt(&json!({"role": "admin", "username": "a"}), "s3cret");
        let reader = ClaimReader::new(Some("s3cret"));
        let claims = reader.read(&token).unwrap();
        assert_eq!(claims.role_name(), Some("admin"));
    }

    #[test]
    fn test_verifying_reader_rejects_forged_token() {
        let forged = make_unsigned_jwt(&json!({"role": "admin"}));
        let reader = ClaimReader::new(Some("s3cret"));
        assert!(reader.read(&forged).is_none());

        let wrong_key = make_signed_jwt(&json!({"role": "admin"}), "other");
        assert!(reader.read(&wrong_key).is_none());
    }

    #[test]
    fn test_verifying_reader_rejects_expired_token() {
        let token = make_signed_jwt(&json!({"role": "admin", "exp": 1000}), "s3cret");
        let reader = ClaimReader::new(Some("s3cret"));
        assert!(matches!(reader.decode(&token), Err(JwtError::Validation(_))));
    }
}
