// gabble-presence/gabble-presence-replay
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use tokio::sync::mpsc;
use tracing::{debug, warn};

use gabble_presence::domain::capabilities::models::DiscoError;
use gabble_presence::infra::disco::DiscoRequest;

use crate::script::ScriptedReplies;

/// Answers disco#info requests from `replies` until the cache goes away. Requests nobody scripted
/// an answer for time out.
pub async fn answer_requests(
    mut requests: mpsc::UnboundedReceiver<DiscoRequest>,
    replies: ScriptedReplies,
) {
    while let Some(request) = requests.recv().await {
        let key = (request.target.to_string(), request.node.clone());

        let result = match replies.get(&key) {
            Some(result) => result.clone(),
            None => {
                warn!(
                    "No reply scripted for {} about {}. Letting it time out.",
                    request.target, request.node
                );
                Err(DiscoError::Timeout)
            }
        };

        debug!("Answering {} about {}.", request.target, request.node);
        request.respond(result);
    }
}
