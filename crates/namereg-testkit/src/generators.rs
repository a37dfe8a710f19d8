//! Proptest generators for property-based testing.

use proptest::prelude::*;

use namereg_core::{Keypair, OwnerId, Timestamp, SECONDS_PER_YEAR};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random owner identity.
pub fn owner_id() -> impl Strategy<Value = OwnerId> {
    keypair().prop_map(|kp| kp.owner_id())
}

/// Generate a canonical label: 1 to 30 characters of `[a-z0-9_-]`, no
/// hyphen at either end.
pub fn valid_label() -> impl Strategy<Value = String> {
    "[a-z0-9_]([a-z0-9_-]{0,28}[a-z0-9_])?".prop_map(String::from)
}

/// Generate `(spelling, label)`: some way a user might type a name, and the
/// label it must normalize to.
pub fn name_spelling() -> impl Strategy<Value = (String, String)> {
    (valid_label(), any::<bool>(), any::<bool>()).prop_map(|(label, upper, suffix)| {
        let mut spelling = if upper {
            label.to_ascii_uppercase()
        } else {
            label.clone()
        };
        if suffix {
            spelling.push_str(if upper { ".FNS" } else { ".fns" });
        }
        (spelling, label)
    })
}

/// Generate a name the default policy must reject.
pub fn invalid_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(".fns".to_string()),
        "-[a-z0-9]{0,10}".prop_map(String::from),
        "[a-z0-9]{1,10}-".prop_map(String::from),
        "[a-z]{31,40}".prop_map(String::from),
        "[a-z]{1,5}[ !@#*/+~é][a-z]{1,5}".prop_map(String::from),
    ]
}

/// Generate a positive lease duration up to ten years.
pub fn duration() -> impl Strategy<Value = u64> {
    1u64..=10 * SECONDS_PER_YEAR
}

/// Generate a plausible `now`.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    0u64..=4_000_000_000
}

/// Parameters for one registration.
#[derive(Debug, Clone)]
pub struct RegistrationParams {
    pub keypair: Keypair,
    pub name: String,
    pub duration: u64,
    pub now: Timestamp,
}

impl Arbitrary for RegistrationParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            valid_label(),
            SECONDS_PER_YEAR..=10 * SECONDS_PER_YEAR,
            timestamp(),
        )
            .prop_map(|(seed, name, duration, now)| RegistrationParams {
                keypair: Keypair::from_seed(&seed),
                name,
                duration,
                now,
            })
            .boxed()
    }
}
