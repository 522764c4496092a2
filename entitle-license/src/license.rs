//! The validated license entity and its attribute map.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute name → value mapping handed to clients.
pub type AttributeMap = BTreeMap<String, String>;

/// Attribute keys produced by [`License::attributes`].
pub mod keys {
    pub const IS_LICENSED: &str = "IsLicensed";
    pub const ID: &str = "Id";
    pub const ISSUED_AT: &str = "IssuedAt";
    pub const STARTS_AT: &str = "StartsAt";
    pub const EXPIRES_AT: &str = "ExpiresAt";
    pub const NAME: &str = "Name";
    pub const EMAIL: &str = "Email";
    pub const COMPANY: &str = "Company";
    pub const SKU_NAME: &str = "SkuName";
    pub const SKU_SHORT_NAME: &str = "SkuShortName";
    pub const IS_TRIAL: &str = "IsTrial";
    pub const USERS: &str = "Users";
}

/// A capability a license can switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Ldap,
    LdapGroups,
    Mfa,
    GoogleOauth,
    Office365Oauth,
    Saml,
    Compliance,
    Cluster,
    Metrics,
    Elasticsearch,
    DataRetention,
    MessageExport,
    CustomPermissionsSchemes,
    GuestAccounts,
}

impl Feature {
    /// Every known feature, in attribute order.
    pub const ALL: [Feature; 14] = [
        Feature::Ldap,
        Feature::LdapGroups,
        Feature::Mfa,
        Feature::GoogleOauth,
        Feature::Office365Oauth,
        Feature::Saml,
        Feature::Compliance,
        Feature::Cluster,
        Feature::Metrics,
        Feature::Elasticsearch,
        Feature::DataRetention,
        Feature::MessageExport,
        Feature::CustomPermissionsSchemes,
        Feature::GuestAccounts,
    ];

    /// Returns the attribute key this feature is exposed under.
    #[must_use]
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Self::Ldap => "LDAP",
            Self::LdapGroups => "LDAPGroups",
            Self::Mfa => "MFA",
            Self::GoogleOauth => "GoogleOAuth",
            Self::Office365Oauth => "Office365OAuth",
            Self::Saml => "SAML",
            Self::Compliance => "Compliance",
            Self::Cluster => "Cluster",
            Self::Metrics => "Metrics",
            Self::Elasticsearch => "Elasticsearch",
            Self::DataRetention => "DataRetention",
            Self::MessageExport => "MessageExport",
            Self::CustomPermissionsSchemes => "CustomPermissionsSchemes",
            Self::GuestAccounts => "GuestAccounts",
        }
    }
}

/// The licensee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
}

/// Capacity and feature flags granted by a license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    /// Seat count, or None for unlimited.
    #[serde(default)]
    pub users: Option<u32>,
    /// Features switched on.
    #[serde(default)]
    pub enabled: BTreeSet<Feature>,
}

/// The decoded license payload (matches the signing service's JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePayload {
    pub id: String,
    /// Issued-at timestamp (seconds since epoch).
    pub issued_at: i64,
    /// Start of the validity window; defaults to `issued_at`.
    #[serde(default)]
    pub starts_at: Option<i64>,
    /// End of the validity window, or None for perpetual.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub customer: Customer,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub sku_name: String,
    #[serde(default)]
    pub sku_short_name: String,
    #[serde(default)]
    pub is_trial: bool,
}

/// A license whose signature has been verified.
///
/// Only [`crate::SignedLicenseValidator`] (or another validator) constructs
/// these from raw bytes; there is no partially-validated form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// The raw key string as uploaded (trimmed).
    raw: String,
    /// Decoded payload.
    payload: LicensePayload,
}

impl License {
    pub(crate) fn new(raw: String, payload: LicensePayload) -> Self {
        Self { raw, payload }
    }

    /// Returns the raw key string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the decoded payload.
    #[must_use]
    pub fn payload(&self) -> &LicensePayload {
        &self.payload
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.payload.id
    }

    /// Returns the start of the validity window (seconds since epoch).
    #[must_use]
    pub fn starts_at_secs(&self) -> i64 {
        self.payload.starts_at.unwrap_or(self.payload.issued_at)
    }

    /// Returns the expiration timestamp (seconds since epoch), or None for perpetual.
    #[must_use]
    pub fn expires_at_secs(&self) -> Option<i64> {
        self.payload.expires_at
    }

    #[must_use]
    pub fn is_started_at(&self, now: i64) -> bool {
        now >= self.starts_at_secs()
    }

    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.payload.expires_at.is_some_and(|exp| now > exp)
    }

    /// Returns the licensed seat count, or None for unlimited.
    #[must_use]
    pub fn seats(&self) -> Option<u32> {
        self.payload.features.users
    }

    #[must_use]
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.payload.features.enabled.contains(&feature)
    }

    /// Returns the full, unredacted attribute map.
    #[must_use]
    pub fn attributes(&self) -> AttributeMap {
        let p = &self.payload;
        let mut map = AttributeMap::new();
        map.insert(keys::IS_LICENSED.into(), "true".into());
        map.insert(keys::ID.into(), p.id.clone());
        map.insert(keys::ISSUED_AT.into(), p.issued_at.to_string());
        map.insert(keys::STARTS_AT.into(), self.starts_at_secs().to_string());
        map.insert(
            keys::EXPIRES_AT.into(),
            p.expires_at.map(|e| e.to_string()).unwrap_or_default(),
        );
        map.insert(keys::NAME.into(), p.customer.name.clone());
        map.insert(keys::EMAIL.into(), p.customer.email.clone());
        map.insert(keys::COMPANY.into(), p.customer.company.clone());
        map.insert(keys::SKU_NAME.into(), p.sku_name.clone());
        map.insert(keys::SKU_SHORT_NAME.into(), p.sku_short_name.clone());
        map.insert(keys::IS_TRIAL.into(), p.is_trial.to_string());
        map.insert(
            keys::USERS.into(),
            p.features.users.map(|u| u.to_string()).unwrap_or_default(),
        );
        for feature in Feature::ALL {
            map.insert(
                feature.attribute_name().into(),
                self.has_feature(feature).to_string(),
            );
        }
        map
    }
}
