// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::time::Duration;

use jid::FullJid;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::domain::capabilities::models::{DiscoError, DiscoInfo};
use crate::domain::capabilities::services::{DiscoFuture, DiscoService};
use crate::domain::shared::models::CapsBundleId;

/// A disco#info query handed to whatever talks to the XMPP server.
#[derive(Debug)]
pub struct DiscoRequest {
    pub target: FullJid,
    pub node: CapsBundleId,
    pub timeout: Duration,
    responder: oneshot::Sender<Result<DiscoInfo, DiscoError>>,
}

impl DiscoRequest {
    /// Delivers the answer. Answers to requests the cache no longer waits for are dropped.
    pub fn respond(self, result: Result<DiscoInfo, DiscoError>) {
        if self.responder.send(result).is_err() {
            debug!(
                "Dropping disco#info answer from {} for {}. Request was cancelled.",
                self.target, self.node
            );
        }
    }

    /// Returns true if the requester has gone away.
    pub fn is_cancelled(&self) -> bool {
        self.responder.is_closed()
    }
}

/// `DiscoService` that forwards every request over a channel and waits for the answer to come
/// back through the request's responder.
#[derive(Clone)]
pub struct ChannelDiscoService {
    sender: mpsc::UnboundedSender<DiscoRequest>,
}

impl ChannelDiscoService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DiscoRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DiscoService for ChannelDiscoService {
    fn request_disco_info(
        &self,
        target: &FullJid,
        node: &CapsBundleId,
        timeout: Duration,
    ) -> DiscoFuture {
        let (responder, response) = oneshot::channel();

        let sent = self
            .sender
            .send(DiscoRequest {
                target: target.clone(),
                node: node.clone(),
                timeout,
                responder,
            })
            .is_ok();

        Box::pin(async move {
            if !sent {
                return Err(DiscoError::Cancelled);
            }

            match tokio::time::timeout(timeout, response).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(DiscoError::Cancelled),
                Err(_) => Err(DiscoError::Timeout),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::ns;

    use super::*;

    fn target() -> FullJid {
        FullJid::from_str("romeo@montague.lit/orchard").unwrap()
    }

    #[tokio::test]
    async fn test_forwards_request_and_answer() {
        let (service, mut requests) = ChannelDiscoService::new();
        let node = CapsBundleId::from("http://example.org/caps#1.0");

        let response = service.request_disco_info(&target(), &node, Duration::from_secs(5));

        let request = requests.try_recv().unwrap();
        assert_eq!(request.target, target());
        assert_eq!(request.node, node);
        request.respond(Ok(DiscoInfo::new(Vec::new(), [ns::JINGLE])));

        assert_eq!(
            response.await,
            Ok(DiscoInfo::new(Vec::new(), [ns::JINGLE]))
        );
    }

    #[tokio::test]
    async fn test_times_out() {
        let (service, _requests) = ChannelDiscoService::new();
        let node = CapsBundleId::from("http://example.org/caps#1.0");

        let response = service.request_disco_info(&target(), &node, Duration::from_millis(10));
        assert_eq!(response.await, Err(DiscoError::Timeout));
    }

    #[tokio::test]
    async fn test_dropped_request_cancels() {
        let (service, mut requests) = ChannelDiscoService::new();
        let node = CapsBundleId::from("http://example.org/caps#1.0");

        let response = service.request_disco_info(&target(), &node, Duration::from_secs(5));
        drop(requests.try_recv().unwrap());
        assert_eq!(response.await, Err(DiscoError::Cancelled));

        drop(requests);
        let response = service.request_disco_info(&target(), &node, Duration::from_secs(5));
        assert_eq!(response.await, Err(DiscoError::Cancelled));
    }

    #[tokio::test]
    async fn test_dropping_future_cancels_request() {
        let (service, mut requests) = ChannelDiscoService::new();
        let node = CapsBundleId::from("http://example.org/caps#1.0");

        let response = service.request_disco_info(&target(), &node, Duration::from_secs(5));
        let request = requests.try_recv().unwrap();
        assert!(!request.is_cancelled());

        drop(response);
        assert!(request.is_cancelled());
    }
}
