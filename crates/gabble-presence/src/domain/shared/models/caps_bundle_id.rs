// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use gabble_utils::id_string;

id_string!(
    /// `CapsBundleId` identifies an XEP-0115 capability bundle, concatenating a 'node' URL
    /// and a 'ver' (or legacy 'ext') string, separated by '#'.
    /// https://xmpp.org/extensions/xep-0115.html
    CapsBundleId
);

impl CapsBundleId {
    pub fn new(node: impl AsRef<str>, ver: impl AsRef<str>) -> Self {
        Self(format!("{}#{}", node.as_ref(), ver.as_ref()))
    }

    /// The node URL, i.e. everything before the last '#'.
    pub fn node(&self) -> &str {
        self.0.rsplit_once('#').map(|(node, _)| node).unwrap_or(&self.0)
    }

    /// The 'ver' part, i.e. everything after the last '#'. Empty if the identifier carries none.
    pub fn ver(&self) -> &str {
        self.0.rsplit_once('#').map(|(_, ver)| ver).unwrap_or_default()
    }
}
