//! OCSF (Open Cybersecurity Schema Framework) audit events.
//!
//! Login/logout, registry token refreshes, Application Key rejections and
//! Request Gate redirects are emitted via `tracing::info!` (target `ocsf`)
//! as structured JSON. Emission never panics.

use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

pub const CLASS_AUTHENTICATION: u32 = 3001;

// Activity IDs
pub const ACTIVITY_LOGON: u32 = 1;
pub const ACTIVITY_LOGOFF: u32 = 2;
pub const ACTIVITY_SERVICE_TICKET: u32 = 4; // Registry token refresh
pub const ACTIVITY_OTHER: u32 = 99; // Gate/app-key decisions

// Status IDs
pub const STATUS_SUCCESS: u32 = 1;
pub const STATUS_FAILURE: u32 = 2;

// Severity IDs
pub const SEVERITY_INFORMATIONAL: u32 = 1;
pub const SEVERITY_LOW: u32 = 2;
pub const SEVERITY_MEDIUM: u32 = 3;
pub const SEVERITY_HIGH: u32 = 4;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn severity_name(id: u32) -> &'static str {
    match id {
        SEVERITY_INFORMATIONAL => "Informational",
        SEVERITY_LOW => "Low",
        SEVERITY_MEDIUM => "Medium",
        SEVERITY_HIGH => "High",
        _ => "Unknown",
    }
}

fn status_name(id: u32) -> &'static str {
    match id {
        STATUS_SUCCESS => "Success",
        _ => "Failure",
    }
}

fn activity_name(id: u32) -> &'static str {
    match id {
        ACTIVITY_LOGON => "Logon",
        ACTIVITY_LOGOFF => "Logoff",
        ACTIVITY_SERVICE_TICKET => "Service Ticket",
        _ => "Other",
    }
}

fn product() -> serde_json::Value {
    json!({
        "name": "beneficiary-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "vendor_name": "Beneficiary Management Portal"
    })
}

fn emit(event: &serde_json::Value) {
    if let Ok(json) = serde_json::to_string(event) {
        tracing::info!(target: "ocsf", "{}", json);
    }
}

/// Build an OCSF Authentication (3001) event.
pub fn authentication_event_json(
    activity_id: u32,
    status_id: u32,
    severity_id: u32,
    realm: &str,
    username: Option<&str>,
    message: &str,
) -> serde_json::Value {
    let mut event = json!({
        "class_uid": CLASS_AUTHENTICATION,
        "class_name": "Authentication",
        "activity_id": activity_id,
        "activity_name": activity_name(activity_id),
        "severity_id": severity_id,
        "severity": severity_name(severity_id),
        "status_id": status_id,
        "status": status_name(status_id),
        "time": now_millis(),
        "metadata": { "product": product() },
        "service": { "name": realm },
        "message": message,
    });

    if let Some(name) = username {
        event["actor"] = json!({
            "user": {
                "name": name,
                "type_id": 1,
                "type": "User"
            }
        });
    }

    event
}

/// Emit an OCSF Authentication (3001) event.
///
/// `realm` is the token realm: `general`, `staff` or `registry`.
pub fn authentication_event(
    activity_id: u32,
    status_id: u32,
    severity_id: u32,
    realm: &str,
    username: Option<&str>,
    message: &str,
) {
    emit(&authentication_event_json(
        activity_id,
        status_id,
        severity_id,
        realm,
        username,
        message,
    ));
}

/// Emit an access-decision event (class 3001, activity 99/Other) for a
/// request refused before reaching a handler.
pub fn access_denied_event(path: &str, reason: &str, redirect_to: Option<&str>) {
    let event = json!({
        "class_uid": CLASS_AUTHENTICATION,
        "class_name": "Authentication",
        "activity_id": ACTIVITY_OTHER,
        "activity_name": activity_name(ACTIVITY_OTHER),
        "severity_id": SEVERITY_MEDIUM,
        "severity": severity_name(SEVERITY_MEDIUM),
        "status_id": STATUS_FAILURE,
        "status": status_name(STATUS_FAILURE),
        "time": now_millis(),
        "metadata": {
            "product": product(),
            "access": {
                "path": path,
                "reason": reason,
                "redirect": redirect_to,
            }
        },
        "message": format!("Access denied to {path}: {reason}"),
    });

    emit(&event);
}
