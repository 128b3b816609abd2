//! Security audit logging for account and session events
//!
//! Signups, signins, token refreshes and rejected bearer tokens are logged at
//! INFO level on the "audit" target, so they can be filtered and routed apart
//! from application logs (`RUST_LOG=audit=info`).
//!
//! # Example
//!
//! ```ignore
//! use carebook_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::SigninSuccess {
//!     user_id: user.id.clone(),
//!     email: user.email.clone(),
//!     ip_address: Some("192.168.1.1".to_string()),
//!     user_agent: Some("Mozilla/5.0...".to_string()),
//! });
//! ```

use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// New account created
    SignupSuccess {
        user_id: String,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Signup rejected (duplicate email, failed insert)
    SignupFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Token pair issued after a password check
    SigninSuccess {
        user_id: String,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Unknown email or wrong password
    SigninFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Refresh token exchanged for a new pair
    TokenRefresh {
        user_id: String,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Bearer token rejected by the request gate or the refresh endpoint
    InvalidToken {
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },
}

/// Client details taken from request headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
///
/// The whole event is also attached as a JSON string for log aggregators:
///
/// ```json
/// {
///   "event_type": "signin_success",
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "email": "user@example.com",
///   "ip_address": "192.168.1.1",
///   "user_agent": "Mozilla/5.0..."
/// }
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::SignupSuccess {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Signup successful"
            );
        }
        AuditEvent::SignupFailure {
            email,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "Signup failed"
            );
        }
        AuditEvent::SigninSuccess {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Signin successful"
            );
        }
        AuditEvent::SigninFailure {
            email,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "Signin failed"
            );
        }
        AuditEvent::TokenRefresh {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Token refreshed"
            );
        }
        AuditEvent::InvalidToken {
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                ip_address = ?ip_address,
                "Invalid token rejected"
            );
        }
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For (first hop) then X-Real-IP. The socket address is
/// not consulted.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract the user agent from request headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
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
        let event = AuditEvent::SigninSuccess {
            user_id: "12345".to_string(),
            email: "johndoe@example.com".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"signin_success\""));
        assert!(json.contains("johndoe@example.com"));
    }

    #[test]
    fn test_audit_log_every_event() {
        // Only checks that logging never panics
        let events = vec![
            AuditEvent::SignupSuccess {
                user_id: "12345".to_string(),
                email: "johndoe@example.com".to_string(),
                ip_address: None,
                user_agent: None,
            },
            AuditEvent::SignupFailure {
                email: "johndoe@example.com".to_string(),
                reason: "User already exists".to_string(),
                ip_address: None,
                user_agent: None,
            },
            AuditEvent::SigninFailure {
                email: "johndoe@example.com".to_string(),
                reason: "Password mismatch".to_string(),
                ip_address: Some("10.0.0.1".to_string()),
                user_agent: None,
            },
            AuditEvent::TokenRefresh {
                user_id: "12345".to_string(),
                email: "johndoe@example.com".to_string(),
                ip_address: None,
                user_agent: Some("Test Agent".to_string()),
            },
            AuditEvent::InvalidToken {
                reason: "Token has expired".to_string(),
                ip_address: None,
                user_agent: None,
            },
        ];

        for event in &events {
            audit_log(event);
        }
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_request_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::USER_AGENT,
            "Mozilla/5.0 (Test)".parse().unwrap(),
        );

        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.ip_address, None);
        assert_eq!(ctx.user_agent, Some("Mozilla/5.0 (Test)".to_string()));

        assert_eq!(RequestContext::from_headers(&HeaderMap::new()), RequestContext::default());
    }
}
