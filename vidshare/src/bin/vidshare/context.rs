use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vidshare::{Client, StoreBackend, VidshareConfig, store::AnyStore};

use crate::output::OutputManager;

/// Configuration resolved for one CLI invocation
pub struct CliContext {
    pub config_path: PathBuf,
    pub config: VidshareConfig,
}

impl CliContext {
    /// Load `path` if it exists, otherwise run with defaults (memory backend).
    pub fn load(path: &Path) -> Result<Self> {
        let config = VidshareConfig::load_or_default(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Ok(Self {
            config_path: path.to_path_buf(),
            config,
        })
    }

    pub fn has_config_file(&self) -> bool {
        self.config_path.exists()
    }

    pub fn backend(&self) -> StoreBackend {
        self.config.store.backend
    }

    /// Connect to the configured backend.
    pub async fn client(&self, output: &OutputManager) -> Result<Client<AnyStore>> {
        if !self.has_config_file() {
            output.verbose(&format!(
                "{} not found, using defaults",
                self.config_path.display()
            ));
        }
        if self.backend() == StoreBackend::Redis {
            output.progress("Connecting to Redis");
        }
        let client = Client::from_config(&self.config)
            .await
            .with_context(|| format!("Failed to open the {} store", self.backend()))?;
        output.clear_line();
        output.verbose(&format!("Using {} store", self.backend()));
        Ok(client)
    }

    /// Nothing written to the memory backend outlives the process.
    pub fn warn_if_ephemeral(&self, output: &OutputManager) {
        if self.backend() == StoreBackend::Memory {
            output.warning("memory backend: data is discarded when this command exits");
        }
    }
}
