// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

// See all at: https://xmpp.org/registrar/namespaces.html

/// XEP-0085: Chat State Notifications
pub const CHAT_STATES: &str = "http://jabber.org/protocol/chatstates";

/// XEP-0166: Jingle
pub const JINGLE: &str = "urn:xmpp:jingle:1";

/// XEP-0167: Jingle RTP Sessions (audio)
pub const JINGLE_RTP_AUDIO: &str = "urn:xmpp:jingle:apps:rtp:audio";

/// XEP-0167: Jingle RTP Sessions (video)
pub const JINGLE_RTP_VIDEO: &str = "urn:xmpp:jingle:apps:rtp:video";

/// Google Talk voice
pub const GOOGLE_VOICE: &str = "http://www.google.com/xmpp/protocol/voice/v1";

/// Google Talk video
pub const GOOGLE_VIDEO: &str = "http://www.google.com/xmpp/protocol/video/v1";

/// Google Talk P2P transport
pub const GOOGLE_TRANSPORT_P2P: &str = "http://www.google.com/transport/p2p";

/// Telepathy tubes
pub const TUBES: &str = "http://telepathy.freedesktop.org/xmpp/tubes";

/// XEP-0096: SI File Transfer
pub const FILE_TRANSFER: &str = "http://jabber.org/protocol/si/profile/file-transfer";

/// XEP-0095: Stream Initiation
pub const SI: &str = "http://jabber.org/protocol/si";

/// XEP-0047: In-Band Bytestreams
pub const IBB: &str = "http://jabber.org/protocol/ibb";

/// XEP-0065: SOCKS5 Bytestreams
pub const BYTESTREAMS: &str = "http://jabber.org/protocol/bytestreams";

/// XEP-0045: Multi-User Chat
pub const MUC: &str = "http://jabber.org/protocol/muc";

/// XEP-0071: XHTML-IM
pub const XHTML_IM: &str = "http://jabber.org/protocol/xhtml-im";

/// XEP-0115: Entity Capabilities
pub const CAPS: &str = "http://jabber.org/protocol/caps";

/// XEP-0030: Service Discovery
pub const DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";
