//! Configuration resolution and backend selection.
//!
//! Precedence: command-line flags, then `PADEL_*` environment variables
//! (both via clap), then the saved configuration file.

mod backend;
pub mod storage;

use anyhow::{Context, Result};

use padel_core::sync::{DEFAULT_PAGE_SIZE, SyncConfig};
use padel_core::{AccessToken, BackendUrl};

use crate::cli::GlobalArgs;

pub use backend::CliBackend;

/// Fully resolved settings for one invocation.
#[derive(Debug)]
pub struct Settings {
    pub backend: BackendUrl,
    pub token: Option<AccessToken>,
    pub sync: SyncConfig,
}

impl Settings {
    pub fn resolve(global: &GlobalArgs) -> Result<Self> {
        let stored = storage::load_config()?;
        Self::merge(global, stored)
    }

    fn merge(global: &GlobalArgs, stored: storage::StoredConfig) -> Result<Self> {
        let backend = global
            .backend
            .clone()
            .or(stored.backend)
            .context("No backend configured. Run 'padel configure --backend <url>' or set PADEL_BACKEND.")?;
        let backend = BackendUrl::new(&backend).context("Invalid backend URL")?;

        let token = global.token.clone().or(stored.token).map(AccessToken::new);

        let mut sync = SyncConfig::default()
            .with_page_size(global.page_size.or(stored.page_size).unwrap_or(DEFAULT_PAGE_SIZE));
        if let Some(policy) = stored.push_policy {
            sync = sync.with_push_policy(policy);
        }
        if let Some(position) = stored.insert_position {
            sync = sync.with_insert_position(position);
        }
        if let Some(order) = stored.apply_order {
            sync = sync.with_apply_order(order);
        }

        Ok(Self {
            backend,
            token,
            sync,
        })
    }
}
