// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use base64::engine::general_purpose;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::{CapabilityBits, CapsHash};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoIdentity {
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The successful answer to a XEP-0030 disco#info query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoInfo {
    #[serde(default)]
    pub identities: Vec<DiscoIdentity>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl DiscoInfo {
    pub fn new(
        identities: impl IntoIterator<Item = DiscoIdentity>,
        features: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            identities: identities.into_iter().collect(),
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    pub fn capabilities(&self) -> CapabilityBits {
        CapabilityBits::from_features(&self.features)
    }

    /// Computes the 'ver' attribute a resource advertising this disco#info would publish.
    pub fn verification_hash(&self, algorithm: CapsHash) -> String {
        match algorithm {
            CapsHash::Sha1 => {
                general_purpose::STANDARD.encode(Sha1::digest(self.ver_string().as_bytes()))
            }
        }
    }

    /// XEP-0115 §5.1 verification string (without extended service discovery forms).
    fn ver_string(&self) -> String {
        let mut identities: Vec<String> = self
            .identities
            .iter()
            .map(|identity| {
                format!(
                    "{}/{}/{}/{}<",
                    identity.category,
                    identity.kind,
                    identity.lang.as_deref().unwrap_or_default(),
                    identity.name.as_deref().unwrap_or_default()
                )
            })
            .collect();
        identities.sort();

        let mut features: Vec<&str> = self.features.iter().map(String::as_str).collect();
        features.sort();
        features.dedup();

        let mut string = identities.concat();
        for feature in features {
            string.push_str(feature);
            string.push('<');
        }
        string
    }
}

impl DiscoIdentity {
    pub fn new(category: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            kind: kind.into(),
            lang: None,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::ns;

    use super::*;

    #[test]
    fn test_xep_0115_simple_generation_example() {
        let info = DiscoInfo::new(
            [DiscoIdentity::new("client", "pc").with_name("Exodus 0.9.1")],
            [
                "http://jabber.org/protocol/disco#info",
                "http://jabber.org/protocol/disco#items",
                "http://jabber.org/protocol/muc",
                "http://jabber.org/protocol/caps",
            ],
        );

        assert_eq!(
            info.ver_string(),
            "client/pc//Exodus 0.9.1<http://jabber.org/protocol/caps<http://jabber.org/protocol/disco#info<http://jabber.org/protocol/disco#items<http://jabber.org/protocol/muc<"
        );
        assert_eq!(
            info.verification_hash(CapsHash::Sha1),
            "QgayPKawpkPSDYmwT/WM94uAlu0="
        );
    }

    #[test]
    fn test_capabilities() {
        let info = DiscoInfo::new(Vec::new(), [ns::MUC, ns::DISCO_INFO, ns::TUBES]);
        assert_eq!(
            info.capabilities(),
            CapabilityBits::MUC | CapabilityBits::TUBES
        );
    }
}
