//! Registry configuration.
//!
//! Everything has a default, so an empty JSON object is a complete config:
//!
//! ```json
//! {
//!   "name_policy": { "max_length": 30, "tld": "fns" },
//!   "prices": [1000000, 500000, 200000, 100000, 50000, 20000, 10000, 5000, 2000, 1000],
//!   "min_rent_secs": 31536000,
//!   "renewal_grace_secs": 7776000,
//!   "admin": "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
//! }
//! ```

use serde::{Deserialize, Serialize};

use namereg_core::{NamePolicy, OwnerId, PriceTable, SECONDS_PER_YEAR};

use crate::error::{RegistryError, Result};

/// Default minimum registration length: one year.
pub const DEFAULT_MIN_RENT_SECS: u64 = SECONDS_PER_YEAR;

/// Default renewal grace after expiry: 90 days.
pub const DEFAULT_RENEWAL_GRACE_SECS: u64 = 90 * 24 * 60 * 60;

/// Configuration for the Registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Name normalization rules.
    pub name_policy: NamePolicy,

    /// Per-second rent by label length.
    pub prices: PriceTable,

    /// Shortest accepted registration, in seconds. Renewals are exempt.
    pub min_rent_secs: u64,

    /// How long after expiry the previous owner may still renew.
    pub renewal_grace_secs: u64,

    /// Identity allowed to change prices and the minimum duration.
    #[serde(with = "owner_hex")]
    pub admin: Option<OwnerId>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name_policy: NamePolicy::default(),
            prices: PriceTable::default(),
            min_rent_secs: DEFAULT_MIN_RENT_SECS,
            renewal_grace_secs: DEFAULT_RENEWAL_GRACE_SECS,
            admin: None,
        }
    }
}

impl RegistryConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RegistryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RegistryError::Config(e.to_string()))
    }

    /// Check cross-field constraints the types cannot express.
    pub fn validate(&self) -> Result<()> {
        let max = self.name_policy.max_length;
        // Names must stay shorter than a hex key so lookups are unambiguous.
        if max == 0 || max >= 64 {
            return Err(RegistryError::Config(format!(
                "max_length must be between 1 and 63, got {}",
                max
            )));
        }

        if let Some(tld) = &self.name_policy.tld {
            let well_formed = !tld.is_empty()
                && tld
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if !well_formed {
                return Err(RegistryError::Config(format!("invalid tld {:?}", tld)));
            }
        }

        Ok(())
    }
}

/// Admin identity as an optional hex string, validated on the way in.
mod owner_hex {
    use namereg_core::OwnerId;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(owner: &Option<OwnerId>, s: S) -> Result<S::Ok, S::Error> {
        match owner {
            Some(owner) => s.serialize_some(&owner.to_hex()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OwnerId>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|hex| OwnerId::from_hex(&hex).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namereg_core::Keypair;

    #[test]
    fn test_empty_object_is_default() {
        let config = RegistryConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.min_rent_secs, 31_536_000);
        assert_eq!(config.renewal_grace_secs, 7_776_000);
        assert_eq!(config.name_policy.tld.as_deref(), Some("fns"));
    }

    #[test]
    fn test_json_round_trip_with_admin() {
        let admin = Keypair::from_seed(&[9; 32]).owner_id();
        let config = RegistryConfig {
            admin: Some(admin),
            min_rent_secs: 60,
            ..RegistryConfig::default()
        };

        let json = config.to_json_string().unwrap();
        assert!(json.contains(&admin.to_hex()));
        assert_eq!(RegistryConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        // Increasing price table.
        let err = RegistryConfig::from_json_str(r#"{"prices": [1, 2]}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));

        // Admin that is not a curve point.
        let err = RegistryConfig::from_json_str(r#"{"admin": "zz"}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));

        let err =
            RegistryConfig::from_json_str(r#"{"name_policy": {"max_length": 64}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));

        let err =
            RegistryConfig::from_json_str(r#"{"name_policy": {"tld": "f.ns"}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));

        let err = RegistryConfig::from_json_str(r#"{"colour": "blue"}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn test_no_tld_policy() {
        let config =
            RegistryConfig::from_json_str(r#"{"name_policy": {"tld": null}}"#).unwrap();
        assert_eq!(config.name_policy.tld, None);
        assert_eq!(config.name_policy.max_length, 30);
    }
}
