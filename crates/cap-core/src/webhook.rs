//! HMAC-SHA256 verification of inbound webhook deliveries.

use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::WebhookSecret;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";
/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
/// Route accepting CAP deliveries.
pub const DEFAULT_ROUTE: &str = "/v3/cap/log";

/// Computes `"sha256=" + hex(HMAC-SHA256(secret, body))`.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Checks a presented signature against the body.
///
/// Returns `false` for a missing signature, a length mismatch (checked
/// before any comparison; length is not secret) or differing bytes. Equal
/// lengths are compared in constant time.
pub fn verify_signature(secret: &[u8], body: &[u8], presented: Option<&str>) -> bool {
    let Some(presented) = presented else {
        return false;
    };
    let expected = compute_signature(secret, body);
    if expected.is_empty() || presented.len() != expected.len() {
        return false;
    }
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// One inbound delivery, stripped of transport details.
#[derive(Debug, Clone)]
pub struct WebhookDelivery<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Request path.
    pub path: &'a str,
    /// Value of the signature header, if present.
    pub signature: Option<&'a str>,
    /// Raw request body.
    pub body: &'a [u8],
}

/// Host-level response for a delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON response body.
    pub body: Value,
}

/// Maps deliveries to responses for one configured secret and route.
#[derive(Debug, Clone)]
pub struct WebhookGate {
    secret: WebhookSecret,
    route: String,
}

impl WebhookGate {
    /// Creates a gate accepting `POST <route>` signed with `secret`.
    pub fn new(secret: WebhookSecret, route: impl Into<String>) -> Self {
        Self {
            secret,
            route: route.into(),
        }
    }

    /// Decides the response for a delivery.
    ///
    /// 404 for any other method or route, 401 for a missing (or empty) or
    /// invalid signature, 200 with the parsed body otherwise. A body that is not
    /// JSON is echoed back as `{"raw": <text>}`.
    pub fn handle(&self, delivery: &WebhookDelivery<'_>) -> WebhookResponse {
        if delivery.method != "POST" || delivery.path != self.route {
            return WebhookResponse {
                status: 404,
                body: json!({"error": "Endpoint not found"}),
            };
        }
        if delivery.signature.map_or(true, str::is_empty) {
            return WebhookResponse {
                status: 401,
                body: json!({"error": "Missing signature"}),
            };
        }
        if !verify_signature(self.secret.expose(), delivery.body, delivery.signature) {
            tracing::warn!(path = delivery.path, "webhook signature verification failed");
            return WebhookResponse {
                status: 401,
                body: json!({"error": "Invalid signature"}),
            };
        }

        let parsed = serde_json::from_slice::<Value>(delivery.body)
            .unwrap_or_else(|_| json!({"raw": String::from_utf8_lossy(delivery.body)}));
        tracing::info!(bytes = delivery.body.len(), "verified CAP delivery received");
        WebhookResponse {
            status: 200,
            body: json!({
                "status": "ok",
                "verified": true,
                "received": true,
                "body": parsed,
            }),
        }
    }
}
