// gabble-presence/gabble-presence-replay
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;

use anyhow::{Context, Result};
use jid::{BareJid, FullJid};
use serde::Deserialize;

use gabble_presence::domain::capabilities::models::{DiscoError, DiscoIdentity, DiscoInfo};
use gabble_presence::domain::shared::models::{CapsBundleId, StatusRank};

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptLine {
    Presence {
        jid: BareJid,
        #[serde(default)]
        resource: Option<String>,
        status: StatusRank,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        priority: i8,
        #[serde(default)]
        bundles: Vec<CapsBundleId>,
        #[serde(default)]
        caps_hash: Option<String>,
    },
    /// A chat message (or any other non-presence stanza) from `jid`.
    Message {
        jid: BareJid,
        #[serde(default)]
        resource: Option<String>,
        #[serde(default)]
        bundles: Vec<CapsBundleId>,
    },
    Nickname {
        jid: BareJid,
        nickname: Option<String>,
    },
    Avatar {
        jid: BareJid,
        avatar_hash: Option<String>,
    },
    Forget {
        jid: BareJid,
    },
    Reset,
    /// How `target` answers disco#info requests about `node`. Without `error`, the answer
    /// carries `identities` and `features`.
    DiscoReply {
        target: FullJid,
        node: CapsBundleId,
        #[serde(default)]
        identities: Vec<DiscoIdentity>,
        #[serde(default)]
        features: Vec<String>,
        #[serde(default)]
        error: Option<ReplyError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyError {
    Timeout,
    Cancelled,
    ServiceUnavailable,
}

pub type ScriptedReplies = HashMap<(String, CapsBundleId), Result<DiscoInfo, DiscoError>>;

#[derive(Debug, Default)]
pub struct Script {
    /// Everything but the disco replies, in script order.
    pub steps: Vec<ScriptLine>,
    pub replies: ScriptedReplies,
}

impl Script {
    /// Parses a JSON-lines script. Blank lines are skipped.
    pub fn parse(source: &str) -> Result<Self> {
        let mut script = Script::default();

        for (idx, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parsed: ScriptLine = serde_json::from_str(line)
                .with_context(|| format!("Invalid script line {}", idx + 1))?;

            match parsed {
                ScriptLine::DiscoReply {
                    target,
                    node,
                    identities,
                    features,
                    error,
                } => {
                    let result = match error {
                        Some(ReplyError::Timeout) => Err(DiscoError::Timeout),
                        Some(ReplyError::Cancelled) => Err(DiscoError::Cancelled),
                        Some(ReplyError::ServiceUnavailable) => Err(DiscoError::Unknown {
                            msg: "service-unavailable".to_string(),
                        }),
                        None => Ok(DiscoInfo::new(identities, features)),
                    };
                    script.replies.insert((target.to_string(), node), result);
                }
                step => script.steps.push(step),
            }
        }

        Ok(script)
    }
}
