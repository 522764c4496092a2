//! Versioned redaction of license attributes for unprivileged readers.
//!
//! Redaction is allowlist-based: a key is disclosed only if the active
//! policy names it. Keys added to [`License::attributes`](crate::License::attributes)
//! later stay hidden until a new policy version lists them.

use crate::license::{AttributeMap, Feature, keys};

/// Base keys disclosed by [`RedactionPolicy::V1`]. Feature flags are added on top.
const V1_BASE_KEYS: [&str; 4] = [keys::IS_LICENSED, keys::IS_TRIAL, keys::COMPANY, keys::USERS];

/// A fixed, versioned allowlist of attributes safe for any reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RedactionPolicy {
    /// Licensing state, company, seat count and feature flags.
    #[default]
    V1,
}

impl RedactionPolicy {
    /// The policy applied by default.
    pub const CURRENT: Self = Self::V1;

    /// Returns the numeric version of this policy.
    #[must_use]
    pub fn version(&self) -> u32 {
        match self {
            Self::V1 => 1,
        }
    }

    /// Returns true if `key` may be shown to an unprivileged reader.
    #[must_use]
    pub fn is_disclosable(&self, key: &str) -> bool {
        match self {
            Self::V1 => {
                V1_BASE_KEYS.contains(&key)
                    || Feature::ALL.iter().any(|f| f.attribute_name() == key)
            }
        }
    }

    /// Projects `attributes` onto the allowlist.
    #[must_use]
    pub fn sanitize(&self, attributes: &AttributeMap) -> AttributeMap {
        attributes
            .iter()
            .filter(|(k, _)| self.is_disclosable(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
