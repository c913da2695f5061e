use serde::{Deserialize, Serialize};

use crate::clients::UiccAppType;

/// Per-attempt configuration for the EAP-AKA peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EapAkaConfig {
    /// Identity given in the outer EAP-Response/Identity. Used as the MAC
    /// and key derivation identity unless an AKA-Identity round replaces it.
    pub eap_identity: Vec<u8>,
    pub sub_id: i32,
    pub app_type: UiccAppType,
    #[serde(default)]
    pub supports_eap_aka_prime: bool,
    /// Log identities, challenges and keys verbatim instead of fingerprints.
    #[serde(default)]
    pub log_sensitive: bool,
}

impl EapAkaConfig {
    pub fn new(eap_identity: impl Into<Vec<u8>>, sub_id: i32, app_type: UiccAppType) -> Self {
        Self {
            eap_identity: eap_identity.into(),
            sub_id,
            app_type,
            supports_eap_aka_prime: false,
            log_sensitive: false,
        }
    }

    pub fn with_eap_aka_prime_support(mut self, supported: bool) -> Self {
        self.supports_eap_aka_prime = supported;
        self
    }

    /// Reads `EAP_AKA_IDENTITY`, `EAP_AKA_SUB_ID`, `EAP_AKA_APP_TYPE`,
    /// `EAP_AKA_SUPPORTS_AKA_PRIME` and `EAP_AKA_LOG_SENSITIVE`, loading a
    /// `.env` file first if one exists. Returns `None` without an identity.
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let eap_identity = lookup("EAP_AKA_IDENTITY")?;
        if eap_identity.is_empty() {
            return None;
        }

        let sub_id = lookup("EAP_AKA_SUB_ID")
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .unwrap_or(0);

        let app_type = lookup("EAP_AKA_APP_TYPE")
            .and_then(|s| UiccAppType::parse(&s))
            .unwrap_or(UiccAppType::Usim);

        let flag = |key: &str| {
            lookup(key)
                .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false)
        };

        Some(Self {
            eap_identity: eap_identity.into_bytes(),
            sub_id,
            app_type,
            supports_eap_aka_prime: flag("EAP_AKA_SUPPORTS_AKA_PRIME"),
            log_sensitive: flag("EAP_AKA_LOG_SENSITIVE"),
        })
    }
}
