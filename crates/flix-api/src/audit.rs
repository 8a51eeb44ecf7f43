//! Security audit logging for account and access events
//!
//! Every event is emitted at INFO level on the `audit` target so it can be
//! filtered and shipped apart from request logs:
//!
//! ```text
//! RUST_LOG=audit=info,flix_api=warn
//! ```
//!
//! Events carry usernames only. Password digests, plaintext passwords and
//! tokens never appear in an event.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Credentials accepted and a token issued
    LoginSuccess {
        username: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Credentials rejected
    LoginFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Account created
    RegistrationSuccess {
        user_id: Uuid,
        username: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Account creation refused (validation or duplicate username)
    RegistrationFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Missing, malformed, forged or expired bearer token
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        path: String,
        reason: String,
    },

    /// Authenticated user tried to act on another account
    AccessDenied {
        username: String,
        resource: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Profile overwritten, possibly under a new username
    ProfileUpdated {
        username: String,
        new_username: String,
        ip_address: Option<String>,
    },

    /// Account removed by its owner
    AccountDeleted {
        username: String,
        ip_address: Option<String>,
    },
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess {
            username,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                username = %username,
                ip_address = ?ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            username,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?ip_address,
                "Login failed"
            );
        }
        AuditEvent::RegistrationSuccess {
            user_id,
            username,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?ip_address,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure {
            username,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?ip_address,
                "Registration failed"
            );
        }
        AuditEvent::InvalidToken {
            ip_address,
            path,
            reason,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                ip_address = ?ip_address,
                path = %path,
                reason = %reason,
                "Invalid token"
            );
        }
        AuditEvent::AccessDenied {
            username,
            resource,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                username = %username,
                resource = %resource,
                ip_address = ?ip_address,
                "Access denied"
            );
        }
        AuditEvent::ProfileUpdated {
            username,
            new_username,
            ip_address,
        } => {
            info!(
                target: "audit",
                event = %event_json,
                username = %username,
                new_username = %new_username,
                ip_address = ?ip_address,
                "Profile updated"
            );
        }
        AuditEvent::AccountDeleted {
            username,
            ip_address,
        } => {
            info!(
                target: "audit",
                event = %event_json,
                username = %username,
                ip_address = ?ip_address,
                "Account deleted"
            );
        }
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks `X-Forwarded-For` (first hop) and then `X-Real-IP`.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|ip| ip.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract the user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginSuccess {
            username: "alice01".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"login_success\""));
        assert!(json.contains("alice01"));
    }

    #[test]
    fn test_audit_log_all_events() {
        // Only checks that logging never panics
        let ip = Some("192.168.1.1".to_string());
        let events = [
            AuditEvent::LoginFailure {
                username: "alice01".to_string(),
                reason: "invalid credentials".to_string(),
                ip_address: ip.clone(),
                user_agent: None,
            },
            AuditEvent::RegistrationSuccess {
                user_id: Uuid::new_v4(),
                username: "alice01".to_string(),
                ip_address: ip.clone(),
                user_agent: None,
            },
            AuditEvent::RegistrationFailure {
                username: "alice01".to_string(),
                reason: "Username alice01 already taken.".to_string(),
                ip_address: ip.clone(),
                user_agent: None,
            },
            AuditEvent::InvalidToken {
                ip_address: ip.clone(),
                user_agent: None,
                path: "/movies".to_string(),
                reason: "token expired".to_string(),
            },
            AuditEvent::AccessDenied {
                username: "alice01".to_string(),
                resource: "/users/bob02".to_string(),
                ip_address: ip.clone(),
                user_agent: None,
            },
            AuditEvent::ProfileUpdated {
                username: "alice01".to_string(),
                new_username: "alice02".to_string(),
                ip_address: ip.clone(),
            },
            AuditEvent::AccountDeleted {
                username: "alice01".to_string(),
                ip_address: ip,
            },
        ];

        for event in &events {
            audit_log(event);
        }
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.7".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_extract_missing_headers() {
        let headers = axum::http::HeaderMap::new();

        assert_eq!(extract_ip_address(&headers), None);
        assert_eq!(extract_user_agent(&headers), None);
    }
}
