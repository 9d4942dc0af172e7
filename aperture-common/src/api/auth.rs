//! Admin API authentication via timestamp and hash validation
//!
//! Mutating requests carry a `timestamp` (unix epoch ms) and a `hash`
//! (SHA-256 over the canonical JSON body concatenated with the shared
//! secret). The secret is an i64 stored in the settings table; the
//! special value 0 disables auth checking entirely.
//!
//! This module contains only pure functions and database operations;
//! the HTTP middleware lives in the server crate.

use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum accepted timestamp age in milliseconds
const MAX_PAST_MS: i64 = 1000;
/// Maximum accepted clock skew into the future in milliseconds
const MAX_FUTURE_MS: i64 = 1;

/// Placeholder substituted for the hash field before hashing
const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Authentication error types
#[derive(Debug, Clone)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    InvalidHash { provided: String, calculated: String },

    /// Timestamp field missing from request
    MissingTimestamp,

    /// Hash field missing from request
    MissingHash,

    /// Database error loading shared secret
    DatabaseError(String),

    /// Failed to parse request body
    ParseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::InvalidTimestamp { reason, .. } => {
                write!(f, "Invalid timestamp: {}", reason)
            }
            ApiAuthError::InvalidHash { .. } => write!(f, "Invalid hash"),
            ApiAuthError::MissingTimestamp => write!(f, "Missing timestamp field"),
            ApiAuthError::MissingHash => write!(f, "Missing hash field"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
            ApiAuthError::ParseError(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

/// Load the shared secret from the settings table, generating and
/// storing one on first use.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'api_shared_secret'")
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate a crypto-random non-zero secret and persist it.
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('api_shared_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Validate a request timestamp.
///
/// The window is asymmetric: up to 1000ms in the past (processing
/// delay), at most 1ms in the future (clock drift only).
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;

    let diff = now - timestamp;

    if diff > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_MS),
        });
    }

    if diff < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Calculate the request hash.
///
/// The hash field is replaced by a dummy value, the body is rendered
/// as canonical JSON (sorted keys, no whitespace), the shared secret
/// is appended as a decimal string, and the SHA-256 digest of the
/// result is returned as 64 hex characters.
pub fn calculate_hash(json_value: &Value, shared_secret: i64) -> String {
    let mut value = json_value.clone();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("hash".to_string(), Value::String(DUMMY_HASH.to_string()));
    }

    let canonical = to_canonical_json(&value);
    let to_hash = format!("{}{}", canonical, shared_secret);

    let mut hasher = Sha256::new();
    hasher.update(to_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render JSON in canonical form: object keys sorted, no whitespace.
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("\"{}\":{}", k, to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Validate that a provided hash matches the calculated value.
pub fn validate_hash(
    provided_hash: &str,
    json_value: &Value,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let calculated = calculate_hash(json_value, shared_secret);

    if provided_hash != calculated {
        return Err(ApiAuthError::InvalidHash {
            provided: provided_hash.to_string(),
            calculated,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }

    #[test]
    fn test_valid_timestamp_accepted() {
        let now = now_ms();
        assert!(validate_timestamp(now).is_ok());
        assert!(validate_timestamp(now - 500).is_ok());
        assert!(validate_timestamp(now - 1000).is_ok());
    }

    #[test]
    fn test_timestamp_too_old_rejected() {
        let now = now_ms();
        assert!(validate_timestamp(now - 1001).is_err());
        assert!(validate_timestamp(now - 60_000).is_err());
    }

    #[test]
    fn test_timestamp_future_rejected() {
        let now = now_ms();
        assert!(validate_timestamp(now + 1).is_ok());
        assert!(validate_timestamp(now + 100).is_err());
    }

    #[test]
    fn test_hash_is_deterministic_and_secret_sensitive() {
        let body = json!({
            "title": "Dunes at dusk",
            "timestamp": 1730000000000i64,
            "hash": "dummy"
        });

        let hash = calculate_hash(&body, 123456789);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, calculate_hash(&body, 123456789));
        assert_ne!(hash, calculate_hash(&body, 987654321));
    }

    #[test]
    fn test_canonical_json_sorts_keys_without_whitespace() {
        let body = json!({"z": 3, "a": 1, "m": [true, null]});
        let canonical = to_canonical_json(&body);
        assert_eq!(canonical, "{\"a\":1,\"m\":[true,null],\"z\":3}");
    }

    #[test]
    fn test_canonical_json_escapes_strings() {
        let body = json!({"t": "say \"hi\"\\"});
        let canonical = to_canonical_json(&body);
        assert_eq!(canonical, "{\"t\":\"say \\\"hi\\\"\\\\\"}");
    }

    #[test]
    fn test_hash_validation_round_trip() {
        let body = json!({
            "title": "Dunes at dusk",
            "timestamp": 1730000000000i64,
            "hash": "dummy"
        });
        let secret = 42i64;

        let calculated = calculate_hash(&body, secret);
        assert!(validate_hash(&calculated, &body, secret).is_ok());
        assert!(validate_hash(DUMMY_HASH, &body, secret).is_err());
    }
}
