//! Name normalization vectors.
//!
//! Every client that derives keys locally (to look records up by key) must
//! normalize names exactly like the registry does. These vectors pin the
//! default policy's behaviour; [`vectors_json`] exports them together with
//! the derived keys for other implementations.

use serde::Serialize;

use namereg_core::{NameKey, NamePolicy, NameRejection};

/// Expected outcome of normalizing one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Normalizes to this label.
    Label(&'static str),
    /// Rejected for this reason.
    Rejected(NameRejection),
}

/// A normalization test vector.
#[derive(Debug, Clone)]
pub struct NameVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Raw input.
    pub input: &'static str,
    /// Expected outcome under [`NamePolicy::default`].
    pub expected: Expected,
}

/// Get all normalization vectors.
pub fn all_vectors() -> Vec<NameVector> {
    use Expected::{Label, Rejected};

    vec![
        NameVector { name: "plain", input: "alice", expected: Label("alice") },
        NameVector { name: "suffix stripped", input: "alice.fns", expected: Label("alice") },
        NameVector { name: "case folded", input: "ALICE.FNS", expected: Label("alice") },
        NameVector { name: "mixed case suffix", input: "Bob.Fns", expected: Label("bob") },
        NameVector { name: "single char", input: "x", expected: Label("x") },
        NameVector { name: "digits", input: "007", expected: Label("007") },
        NameVector { name: "inner hyphen", input: "a-b", expected: Label("a-b") },
        NameVector { name: "underscore edge", input: "_a_", expected: Label("_a_") },
        NameVector { name: "tld as label", input: "fns", expected: Label("fns") },
        NameVector { name: "suffix stripped once", input: "fns.fns", expected: Label("fns") },
        NameVector {
            name: "max length",
            input: "abcdefghijklmnopqrstuvwxyz0123",
            expected: Label("abcdefghijklmnopqrstuvwxyz0123"),
        },
        NameVector {
            name: "max length with suffix",
            input: "abcdefghijklmnopqrstuvwxyz0123.fns",
            expected: Label("abcdefghijklmnopqrstuvwxyz0123"),
        },
        NameVector { name: "empty", input: "", expected: Rejected(NameRejection::Empty) },
        NameVector { name: "bare suffix", input: ".fns", expected: Rejected(NameRejection::Empty) },
        NameVector {
            name: "too long",
            input: "abcdefghijklmnopqrstuvwxyz01234",
            expected: Rejected(NameRejection::TooLong { len: 31, max: 30 }),
        },
        NameVector {
            name: "other tld",
            input: "alice.eth",
            expected: Rejected(NameRejection::InvalidCharacter('.')),
        },
        NameVector {
            name: "double suffix",
            input: "alice.fns.fns",
            expected: Rejected(NameRejection::InvalidCharacter('.')),
        },
        NameVector {
            name: "space",
            input: "al ice",
            expected: Rejected(NameRejection::InvalidCharacter(' ')),
        },
        NameVector {
            name: "non-ascii",
            input: "zoë",
            expected: Rejected(NameRejection::InvalidCharacter('ë')),
        },
        NameVector {
            name: "leading hyphen",
            input: "-alice",
            expected: Rejected(NameRejection::EdgeHyphen),
        },
        NameVector {
            name: "trailing hyphen",
            input: "alice-.fns",
            expected: Rejected(NameRejection::EdgeHyphen),
        },
    ]
}

/// Check one vector against the default policy.
pub fn verify_vector(vector: &NameVector) -> Result<(), String> {
    let policy = NamePolicy::default();
    let actual = policy.normalize(vector.input);

    match (vector.expected, actual) {
        (Expected::Label(label), Ok(normalized)) if normalized == label => {
            let key = policy
                .compute_key(vector.input)
                .map_err(|e| format!("{}: key derivation failed: {}", vector.name, e))?;
            if key != NameKey::derive(label) {
                return Err(format!("{}: key does not match label key", vector.name));
            }
            Ok(())
        }
        (Expected::Rejected(reason), Err(namereg_core::CoreError::InvalidName { reason: got, .. }))
            if got == reason =>
        {
            Ok(())
        }
        (expected, actual) => Err(format!(
            "{}: input {:?} expected {:?}, got {:?}",
            vector.name, vector.input, expected, actual
        )),
    }
}

/// Verify all vectors, collecting every failure.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err())
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

#[derive(Serialize)]
struct ExportedVector {
    name: &'static str,
    input: &'static str,
    label: Option<&'static str>,
    key: Option<String>,
}

/// Export the accepted vectors with their derived keys as JSON.
pub fn vectors_json() -> serde_json::Value {
    let exported: Vec<ExportedVector> = all_vectors()
        .into_iter()
        .map(|v| {
            let label = match v.expected {
                Expected::Label(label) => Some(label),
                Expected::Rejected(_) => None,
            };
            ExportedVector {
                name: v.name,
                input: v.input,
                label,
                key: label.map(|l| hex::encode(NameKey::derive(l).as_bytes())),
            }
        })
        .collect();

    serde_json::json!({ "policy": NamePolicy::default(), "vectors": exported })
}
