// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::config::PresenceCacheConfig;
use crate::domain::capabilities::services::{DiscoService, DynDiscoService};
use crate::domain::handles::repos::DynHandleRepository;
use crate::infra::handles::InMemoryHandleRepository;
use crate::presence_cache::PresenceCache;
use crate::presence_cache_event::PresenceCacheDelegate;

pub struct PresenceCacheBuilder {
    config: PresenceCacheConfig,
    handle_repo: DynHandleRepository,
    disco_service: Option<DynDiscoService>,
    delegate: Option<Box<dyn PresenceCacheDelegate>>,
}

impl PresenceCacheBuilder {
    pub(crate) fn new() -> Self {
        PresenceCacheBuilder {
            config: Default::default(),
            handle_repo: Arc::new(InMemoryHandleRepository::new()),
            disco_service: None,
            delegate: None,
        }
    }

    pub fn set_config(mut self, config: PresenceCacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_handle_repository(mut self, repo: DynHandleRepository) -> Self {
        self.handle_repo = repo;
        self
    }

    pub fn set_disco_service<D: DiscoService + 'static>(mut self, disco_service: D) -> Self {
        let disco_service: DynDiscoService = Arc::new(disco_service);
        self.disco_service = Some(disco_service);
        self
    }

    pub fn set_delegate(mut self, delegate: Option<Box<dyn PresenceCacheDelegate>>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn build(self) -> Result<PresenceCache> {
        let disco_service = self.disco_service.ok_or(anyhow!(
            "PresenceCache needs a DiscoService. Provide one before calling build()."
        ))?;

        if self.config.trust_threshold == 0 {
            return Err(anyhow!("The capability trust threshold must be at least 1."));
        }

        Ok(PresenceCache::new(
            self.config,
            self.handle_repo,
            disco_service,
            self.delegate,
        ))
    }
}
