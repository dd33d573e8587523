//! API client module for the consultation platform

pub mod admin;
pub mod appointments;
pub mod client;
pub mod consultations;
pub mod dashboard;
pub mod lawyers;
pub mod payments;

use anyhow::Result;

use crate::auth::SessionContext;
use crate::config::Config;
use client::ApiClient;

/// Loaded config, restored session and a client carrying its token.
pub struct Connection {
    pub config: Config,
    pub session: SessionContext,
    pub client: ApiClient,
    pub backend_url: String,
}

impl Connection {
    /// Load config and restore the stored session.
    ///
    /// A stored session that fails to restore is cleared on disk.
    pub fn open(backend_override: Option<&str>) -> Result<Self> {
        let mut config = Config::load()?;
        let had_session = config.auth_token.is_some() || config.user_data.is_some();

        let session = SessionContext::restore(&mut config);
        if had_session && !session.is_authenticated() {
            config.save()?;
        }

        let backend_url = config.backend_url(backend_override);
        let client = ApiClient::for_session(backend_url.clone(), &session);
        Ok(Self {
            config,
            session,
            client,
            backend_url,
        })
    }

    /// Rebuild the client after the session changed.
    pub fn refresh_client(&mut self) {
        self.client = ApiClient::for_session(self.backend_url.clone(), &self.session);
    }
}
