//! Outbound integrations: the beneficiary backend, the household registry
//! and reCAPTCHA, plus claim reading for backend-issued tokens.

pub mod client;
pub mod jwt;
pub mod recaptcha;
pub mod registry;
