//! Request/response bodies exchanged with the crypto service.
//! These map directly to JSON bodies on the wire.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::party::Party;

// ── Opaque blobs ─────────────────────────────────────────────────────────────

/// Ciphertext as produced by the service. Never inspected, only echoed back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Ciphertext(pub serde_json::Value);

/// Signature blob produced when a message is sealed by its sender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SignatureBlob(pub serde_json::Value);

// ── /generate_keys ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireKey {
    #[serde(deserialize_with = "opaque_integer")]
    pub e: String,
    #[serde(deserialize_with = "opaque_integer")]
    pub n: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateKeysResponse {
    #[serde(rename = "Alice")]
    pub alice: WireKey,
    #[serde(rename = "Bob")]
    pub bob: WireKey,
}

// ── /encrypt ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptRequest {
    pub sender: Party,
    pub receiver: Party,
    pub message: String,
    pub with_signature: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncryptResponse {
    pub encrypted_data: Ciphertext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_data: Option<SignatureBlob>,
    #[serde(default)]
    pub hex_view: String,
    #[serde(default)]
    pub detailed_logs: Vec<String>,
}

// ── /decrypt ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecryptRequest {
    pub receiver: Party,
    pub sender: Party,
    pub encrypted_data: Ciphertext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_data: Option<SignatureBlob>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecryptResponse {
    pub original_message: String,
    /// `None` when no signature was checked.
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default)]
    pub detailed_logs: Vec<String>,
}

// ── Common ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Accepts `"65537"` as well as `65537`; the service is free to send either.
/// Integers keep every digit (moduli routinely exceed 64 bits).
fn opaque_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) if is_integer_text(&n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected an integer or a string, got {other}"
        ))),
    }
}

fn is_integer_text(n: &serde_json::Number) -> bool {
    let text = n.to_string();
    let digits = text.strip_prefix('-').unwrap_or(&text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
