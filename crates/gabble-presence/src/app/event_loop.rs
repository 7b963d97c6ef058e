// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::PresenceCacheInput;
use crate::presence_cache::{DiscoCompletion, PresenceCache};

enum Step {
    Input(PresenceCacheInput),
    InputClosed,
    Disco(DiscoCompletion),
}

/// Feeds `inputs` and the results of the disco#info requests they cause into `cache`, one at a
/// time. Once `inputs` is closed, outstanding requests are still waited for. Returns when there is
/// nothing left to process.
pub async fn run_event_loop(
    cache: &mut PresenceCache,
    mut inputs: mpsc::UnboundedReceiver<PresenceCacheInput>,
) {
    let mut inputs_open = true;

    loop {
        let has_pending_requests = cache.has_pending_requests();

        let step = tokio::select! {
            input = inputs.recv(), if inputs_open => match input {
                Some(input) => Step::Input(input),
                None => Step::InputClosed,
            },
            Some(completion) = cache.next_disco_completion(), if has_pending_requests => {
                Step::Disco(completion)
            },
            else => break,
        };

        match step {
            Step::Input(input) => cache.handle_input(input),
            Step::InputClosed => {
                debug!(
                    "Input closed. Waiting for {} outstanding disco#info request(s).",
                    cache.pending_request_count()
                );
                inputs_open = false;
            }
            Step::Disco(completion) => cache.on_disco_result(completion),
        }
    }

    info!("Presence cache event loop finished.");
}
