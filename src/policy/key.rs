//! Cache Key Derivation
//!
//! Keys are `prefix || digest`: an 8 hex character fingerprint of the
//! operation name followed by 32 hex characters of
//! `sha256(operation ":" canonical_params)`. Every key derived from one
//! operation shares the prefix, which is what operation-level invalidation
//! matches on.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Hex characters of the operation prefix.
pub const OPERATION_PREFIX_LEN: usize = 8;
/// Hex characters of the parameter digest.
pub const PARAMS_DIGEST_LEN: usize = 32;
/// Total key length.
pub const KEY_LEN: usize = OPERATION_PREFIX_LEN + PARAMS_DIGEST_LEN;

/// Derives the store key for `operation` called with `params`.
///
/// Pure: equal operations with structurally equal parameters produce equal
/// keys regardless of map key order.
pub fn derive_key<P>(operation: &str, params: &P) -> Result<String>
where
    P: Serialize + ?Sized,
{
    let canonical = canonical_json(&serde_json::to_value(params)?);

    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let mut key = operation_prefix(operation);
    key.push_str(&digest[..PARAMS_DIGEST_LEN]);
    Ok(key)
}

/// Prefix shared by every key derived from `operation`.
pub fn operation_prefix(operation: &str) -> String {
    let digest = hex::encode(Sha256::digest(operation.as_bytes()));
    digest[..OPERATION_PREFIX_LEN].to_string()
}

/// Compact JSON with object keys sorted at every depth.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Serializing a string cannot fail.
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
