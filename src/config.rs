//! Gateway configuration via environment variables.
//!
//! Built once in `main` and shared read-only through `AppState`; nothing
//! else in the crate reads the process environment.

use std::env;
use std::time::Duration;

const DEFAULT_RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub app_key: String,
    pub jwt_secret: Option<String>,
    pub frontend_url: String,
    pub frontend_upstream: Option<String>,
    pub port: u16,
    pub cookie_secure: bool,
    pub staff_cookie_secure: bool,
    pub upstream_timeout: Duration,
    pub admin_role: String,
    pub staff_role: String,
    pub admin_paths: Vec<String>,
    pub staff_paths: Vec<String>,
    pub admin_fallback_path: String,
    pub staff_fallback_path: String,
    pub recaptcha_secret: String,
    pub recaptcha_verify_url: String,
    pub registry_base_url: Option<String>,
    pub registry_username: String,
    pub registry_password: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `API_BASE_URL`, `APP_KEY`. Everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = EnvReader(lookup);
        Ok(Self {
            api_base_url: trim_base(&vars.required("API_BASE_URL")?),
            app_key: vars.required("APP_KEY")?,
            jwt_secret: vars.optional("JWT_SECRET"),
            frontend_url: vars.or("FRONTEND_URL", "http://localhost:3000"),
            frontend_upstream: vars.optional("FRONTEND_UPSTREAM").map(|u| trim_base(&u)),
            port: vars.parse("PORT", 3001)?,
            cookie_secure: vars.flag("COOKIE_SECURE"),
            staff_cookie_secure: vars.flag("STAFF_COOKIE_SECURE"),
            upstream_timeout: Duration::from_secs(vars.parse("UPSTREAM_TIMEOUT_SECS", 15)?),
            admin_role: vars.or("ADMIN_ROLE", "admin"),
            staff_role: vars.or("STAFF_ROLE", "staff"),
            admin_paths: vars.list("ADMIN_PATHS", "/admin"),
            staff_paths: vars.list(
                "STAFF_PATHS",
                "/staff/dashboard,/staff/beneficiaries,/staff/reports",
            ),
            admin_fallback_path: vars.or("ADMIN_FALLBACK_PATH", "/login"),
            staff_fallback_path: vars.or("STAFF_FALLBACK_PATH", "/staff/login"),
            recaptcha_secret: vars.or("RECAPTCHA_SECRET_KEY", ""),
            recaptcha_verify_url: vars.or("RECAPTCHA_VERIFY_URL", DEFAULT_RECAPTCHA_VERIFY_URL),
            registry_base_url: vars.optional("REGISTRY_BASE_URL").map(|u| trim_base(&u)),
            registry_username: vars.or("REGISTRY_USERNAME", ""),
            registry_password: vars.or("REGISTRY_PASSWORD", ""),
        })
    }
}

/// Configuration for testing: all fields settable directly.
impl Config {
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:9".into(),
            app_key: "test-app-key".into(),
            jwt_secret: None,
            frontend_url: "http://localhost:3000".into(),
            frontend_upstream: None,
            port: 3001,
            cookie_secure: false,
            staff_cookie_secure: false,
            upstream_timeout: Duration::from_secs(5),
            admin_role: "admin".into(),
            staff_role: "staff".into(),
            admin_paths: vec!["/admin".into()],
            staff_paths: vec![
                "/staff/dashboard".into(),
                "/staff/beneficiaries".into(),
                "/staff/reports".into(),
            ],
            admin_fallback_path: "/login".into(),
            staff_fallback_path: "/staff/login".into(),
            recaptcha_secret: "test-recaptcha-secret".into(),
            recaptcha_verify_url: DEFAULT_RECAPTCHA_VERIFY_URL.into(),
            registry_base_url: None,
            registry_username: "registry-user".into(),
            registry_password: "registry-pass".into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

struct EnvReader<F>(F);

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnv(key.into()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.into())
    }

    fn flag(&self, key: &str) -> bool {
        (self.0)(key)
            .map(|v| v == "true" || v == "1" || v == "True")
            .unwrap_or(false)
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.into(), raw)),
            None => Ok(default),
        }
    }

    fn list(&self, key: &str, default: &str) -> Vec<String> {
        split_list(&self.or(key, default))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_creates_valid_config() {
        let cfg = Config::test_default();
        assert_eq!(cfg.app_key, "test-app-key");
        assert_eq!(cfg.port, 3001);
        assert!(cfg.jwt_secret.is_none());
        assert!(!cfg.staff_cookie_secure);
    }

    #[test]
    fn test_split_list_trims_and_skips_empty() {
        assert_eq!(
            split_list(" /admin, ,/staff/reports ,"),
            vec!["/admin".to_string(), "/staff/reports".to_string()]
        );
    }

    #[test]
    fn test_trim_base_strips_trailing_slash() {
        assert_eq!(trim_base("https://api.example.gov/ "), "https://api.example.gov");
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let err = Config::from_lookup(lookup_from(&[("APP_KEY", "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref k) if k == "API_BASE_URL"));
    }

    #[test]
    fn test_from_lookup_blank_required_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://api.example.gov"),
            ("APP_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref k) if k == "APP_KEY"));
    }

    #[test]
    fn test_from_lookup_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://api.example.gov"),
            ("APP_KEY", "k"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "PORT"));
    }

    #[test]
    fn test_from_lookup_applies_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://api.example.gov/"),
            ("APP_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_base_url, "https://api.example.gov");
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(15));
        assert_eq!(cfg.admin_role, "admin");
        assert_eq!(cfg.staff_paths.len(), 3);
        assert_eq!(cfg.staff_fallback_path, "/staff/login");
        assert!(cfg.jwt_secret.is_none());
        assert!(cfg.registry_base_url.is_none());
        assert!(!cfg.cookie_secure);
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://api.example.gov"),
            ("APP_KEY", "k"),
            ("PORT", " 8080 "),
            ("COOKIE_SECURE", "1"),
            ("ADMIN_PATHS", "/admin, /ops ,"),
            ("REGISTRY_BASE_URL", "https://registry.example.gov/"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.cookie_secure);
        assert_eq!(cfg.admin_paths, vec!["/admin".to_string(), "/ops".to_string()]);
        assert_eq!(
            cfg.registry_base_url.as_deref(),
            Some("https://registry.example.gov")
        );
    }
}
