// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::ns;

/// The set of protocol features a resource supports, as far as the connection manager cares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityBits(u32);

impl CapabilityBits {
    pub const NONE: Self = Self(0);
    pub const CHAT_STATES: Self = Self(1 << 0);
    pub const JINGLE: Self = Self(1 << 1);
    pub const JINGLE_AUDIO: Self = Self(1 << 2);
    pub const JINGLE_VIDEO: Self = Self(1 << 3);
    pub const GOOGLE_VOICE: Self = Self(1 << 4);
    pub const GOOGLE_VIDEO: Self = Self(1 << 5);
    pub const GOOGLE_TRANSPORT_P2P: Self = Self(1 << 6);
    pub const TUBES: Self = Self(1 << 7);
    pub const FILE_TRANSFER: Self = Self(1 << 8);
    pub const SI: Self = Self(1 << 9);
    pub const IBB: Self = Self(1 << 10);
    pub const BYTESTREAMS: Self = Self(1 << 11);
    pub const MUC: Self = Self(1 << 12);
    pub const XHTML_IM: Self = Self(1 << 13);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if every bit set in `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Maps disco feature namespaces to capability bits. Namespaces we don't know about are
    /// ignored.
    pub fn from_features<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        features
            .into_iter()
            .filter_map(|feature| Self::from_feature(feature.as_ref()))
            .fold(Self::NONE, |caps, bit| caps | bit)
    }

    fn from_feature(feature: &str) -> Option<Self> {
        let bit = match feature {
            ns::CHAT_STATES => Self::CHAT_STATES,
            ns::JINGLE => Self::JINGLE,
            ns::JINGLE_RTP_AUDIO => Self::JINGLE_AUDIO,
            ns::JINGLE_RTP_VIDEO => Self::JINGLE_VIDEO,
            ns::GOOGLE_VOICE => Self::GOOGLE_VOICE,
            ns::GOOGLE_VIDEO => Self::GOOGLE_VIDEO,
            ns::GOOGLE_TRANSPORT_P2P => Self::GOOGLE_TRANSPORT_P2P,
            ns::TUBES => Self::TUBES,
            ns::FILE_TRANSFER => Self::FILE_TRANSFER,
            ns::SI => Self::SI,
            ns::IBB => Self::IBB,
            ns::BYTESTREAMS => Self::BYTESTREAMS,
            ns::MUC => Self::MUC,
            ns::XHTML_IM => Self::XHTML_IM,
            _ => return None,
        };
        Some(bit)
    }
}

impl BitOr for CapabilityBits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CapabilityBits {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl BitAnd for CapabilityBits {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Debug for CapabilityBits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CapabilityBits({:#06x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_features() {
        let caps = CapabilityBits::from_features([
            ns::JINGLE,
            ns::JINGLE_RTP_AUDIO,
            "urn:example:unknown",
            ns::CHAT_STATES,
        ]);

        assert_eq!(
            caps,
            CapabilityBits::JINGLE | CapabilityBits::JINGLE_AUDIO | CapabilityBits::CHAT_STATES
        );
        assert!(caps.contains(CapabilityBits::JINGLE | CapabilityBits::JINGLE_AUDIO));
        assert!(!caps.contains(CapabilityBits::JINGLE_VIDEO));
    }

    #[test]
    fn test_unknown_features_yield_no_caps() {
        let caps = CapabilityBits::from_features(["urn:example:one", "urn:example:two"]);
        assert!(caps.is_empty());
        assert!(caps.contains(CapabilityBits::NONE));
    }

    #[test]
    fn test_bit_ops() {
        let mut caps = CapabilityBits::TUBES;
        caps |= CapabilityBits::IBB;
        assert_eq!(caps & CapabilityBits::IBB, CapabilityBits::IBB);
        assert_eq!(caps.bits(), (1 << 7) | (1 << 10));
        assert_eq!(CapabilityBits::from_bits(caps.bits()), caps);
    }
}
