// gabble-presence/gabble-presence-replay
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::{env, fs};

use anyhow::{anyhow, Context, Result};
use jid::BareJid;
use tokio::sync::mpsc;
use tracing::metadata::LevelFilter;
use tracing::{info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use gabble_presence::domain::handles::repos::HandleRepository;
use gabble_presence::domain::shared::models::ContactHandle;
use gabble_presence::infra::disco::ChannelDiscoService;
use gabble_presence::infra::handles::InMemoryHandleRepository;
use gabble_presence::{
    run_event_loop, LivenessEvent, PresenceCache, PresenceCacheConfig, PresenceCacheDelegate,
    PresenceCacheEvent, PresenceCacheInput, PresenceEvent,
};

use crate::script::{Script, ScriptLine};

mod disco_responder;
mod script;

const USAGE: &str = "Usage: gabble-presence-replay <script.jsonl> [config.json]";

struct LoggingDelegate {}

impl PresenceCacheDelegate for LoggingDelegate {
    fn handle_event(&self, event: PresenceCacheEvent) {
        info!("{:?}", event);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dot_env()?;
    enable_logging()?;

    let mut args = env::args().skip(1);
    let script_path = args.next().ok_or(anyhow!(USAGE))?;
    let config = match args.next() {
        Some(path) => load_config(&path)?,
        None => PresenceCacheConfig::default(),
    };

    let source = fs::read_to_string(&script_path)
        .with_context(|| format!("Cannot read script at {}", script_path))?;
    let script = Script::parse(&source)?;

    let repo = Arc::new(InMemoryHandleRepository::new());
    let (disco, disco_requests) = ChannelDiscoService::new();
    let responder = tokio::spawn(disco_responder::answer_requests(
        disco_requests,
        script.replies,
    ));

    let mut cache = PresenceCache::builder()
        .set_config(config)
        .set_handle_repository(repo.clone())
        .set_disco_service(disco)
        .set_delegate(Some(Box::new(LoggingDelegate {})))
        .build()?;

    let mut contacts = HashMap::<BareJid, ContactHandle>::new();
    let (sender, inputs) = mpsc::unbounded_channel();

    for step in script.steps {
        let input = to_input(step, |jid| {
            *contacts
                .entry(jid.clone())
                .or_insert_with(|| repo.ensure(jid))
        });
        if let Some(input) = input {
            sender.send(input)?;
        }
    }
    drop(sender);

    run_event_loop(&mut cache, inputs).await;

    for (jid, handle) in contacts.iter() {
        match cache.get(*handle) {
            Some(presence) => println!(
                "{}: {} {:?} caps={:?}",
                jid,
                presence.status(),
                presence.status_message().unwrap_or_default(),
                presence.capabilities()
            ),
            None => println!("{}: (not cached)", jid),
        }
    }

    drop(cache);
    responder.await?;

    Ok(())
}

fn to_input(
    step: ScriptLine,
    mut handle: impl FnMut(&BareJid) -> ContactHandle,
) -> Option<PresenceCacheInput> {
    let input = match step {
        ScriptLine::Presence {
            jid,
            resource,
            status,
            message,
            priority,
            bundles,
            caps_hash,
        } => PresenceCacheInput::Presence(PresenceEvent {
            handle: handle(&jid),
            resource,
            status,
            message,
            priority,
            bundle_ids: bundles,
            caps_hash,
        }),
        ScriptLine::Message {
            jid,
            resource,
            bundles,
        } => PresenceCacheInput::Liveness(LivenessEvent {
            handle: handle(&jid),
            resource,
            bundle_ids: bundles,
        }),
        ScriptLine::Nickname { jid, nickname } => PresenceCacheInput::Nickname {
            handle: handle(&jid),
            nickname,
        },
        ScriptLine::Avatar { jid, avatar_hash } => PresenceCacheInput::Avatar {
            handle: handle(&jid),
            avatar_hash,
        },
        ScriptLine::Forget { jid } => PresenceCacheInput::Forget {
            handle: handle(&jid),
        },
        ScriptLine::Reset => PresenceCacheInput::Reset,
        ScriptLine::DiscoReply { .. } => return None,
    };
    Some(input)
}

fn load_config(path: &str) -> Result<PresenceCacheConfig> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Cannot read config at {}", path))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid config at {}", path))
}

fn load_dot_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn enable_logging() -> Result<()> {
    let max_level = match env::var("GABBLE_LOG_LEVEL") {
        Ok(level) => Level::from_str(&level)
            .map_err(|_| anyhow!("Invalid GABBLE_LOG_LEVEL '{}'", level))?,
        Err(_) => Level::INFO,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(LevelFilter::from_level(max_level)))
        .init();

    Ok(())
}
