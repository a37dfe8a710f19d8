//! Canonical CBOR encoding of domain records.
//!
//! Records are encoded as CBOR maps with small integer keys in ascending
//! order, definite lengths and shortest-form integers, so identical records
//! produce identical bytes on every platform. The registry state digest is
//! built from these bytes.

use ciborium::value::Value;

use crate::crypto::Blake3Hash;
use crate::error::{CoreError, Result};
use crate::record::DomainRecord;

/// Domain separator for the registry state digest.
pub const STATE_DIGEST_DOMAIN: &[u8] = b"namereg-state-v0:";

/// Record field keys (integer keys for compact encoding).
mod keys {
    pub const KEY: u64 = 0;
    pub const NAME: u64 = 1;
    pub const OWNER: u64 = 2;
    pub const CREATED_AT: u64 = 3;
    pub const EXPIRES_AT: u64 = 4;
    pub const BIO: u64 = 5;
    pub const ADDRESS: u64 = 6;
}

/// Encode a record to canonical CBOR bytes.
pub fn canonical_record_bytes(record: &DomainRecord) -> Result<Vec<u8>> {
    let value = record_to_cbor_value(record);
    let mut buf = Vec::new();
    ciborium::into_writer(&value, &mut buf)
        .map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Digest of a set of records, independent of the order they are given in.
///
/// Records are sorted by key and each encoding is length-prefixed.
pub fn state_digest(records: &[DomainRecord]) -> Result<Blake3Hash> {
    let mut sorted: Vec<&DomainRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.key);

    let mut hasher = blake3::Hasher::new();
    hasher.update(STATE_DIGEST_DOMAIN);
    hasher.update(&(sorted.len() as u64).to_be_bytes());
    for record in sorted {
        let bytes = canonical_record_bytes(record)?;
        hasher.update(&(bytes.len() as u64).to_be_bytes());
        hasher.update(&bytes);
    }
    Ok(Blake3Hash(*hasher.finalize().as_bytes()))
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

/// Convert a record to a CBOR Value (map with integer keys, already sorted).
fn record_to_cbor_value(record: &DomainRecord) -> Value {
    let entries = vec![
        (
            Value::Integer(keys::KEY.into()),
            Value::Bytes(record.key.0.to_vec()),
        ),
        (
            Value::Integer(keys::NAME.into()),
            Value::Text(record.name.clone()),
        ),
        (
            Value::Integer(keys::OWNER.into()),
            Value::Bytes(record.owner.0.to_vec()),
        ),
        (
            Value::Integer(keys::CREATED_AT.into()),
            Value::Integer(record.created_at.into()),
        ),
        (
            Value::Integer(keys::EXPIRES_AT.into()),
            Value::Integer(record.expires_at.into()),
        ),
        (Value::Integer(keys::BIO.into()), optional_text(&record.bio)),
        (
            Value::Integer(keys::ADDRESS.into()),
            optional_text(&record.address),
        ),
    ];
    Value::Map(entries)
}
