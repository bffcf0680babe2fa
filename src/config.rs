//! Settings: global enable flag, turbo period and toggle combos.
//!
//! Stored as pretty-printed JSON. The interceptors read the live settings
//! through a [`SharedConfig`] handle once per poll step, so edits take effect
//! on the next poll.

use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::combo::Combo;
use crate::error::ConfigError;

/// Maximum number of toggle combos that can be configured.
pub const MAX_TOGGLE_COMBOS: usize = 3;

/// Default number of held poll steps between synthetic level flips.
pub const DEFAULT_PERIOD: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurboConfig {
    pub enabled: bool,
    /// Poll steps a turbo button must stay held before its level flips.
    pub period: u8,
    pub combos: Vec<Combo>,
}

impl Default for TurboConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: DEFAULT_PERIOD,
            combos: vec![Combo::default_toggle()],
        }
    }
}

impl TurboConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        if self.combos.len() > MAX_TOGGLE_COMBOS {
            return Err(ConfigError::TooManyCombos(self.combos.len()));
        }
        Ok(())
    }
}

/// Live settings shared by the interceptors and whoever edits them.
pub type SharedConfig = Arc<RwLock<TurboConfig>>;

pub fn shared(config: TurboConfig) -> SharedConfig {
    Arc::new(RwLock::new(config))
}

/// Read the live settings. A poisoned lock still holds valid settings.
pub fn read(config: &SharedConfig) -> RwLockReadGuard<'_, TurboConfig> {
    config.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn load(path: &Path) -> Result<TurboConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: TurboConfig = serde_json::from_str(&data)?;
    config.validate()?;
    Ok(config)
}

pub fn save(path: &Path, config: &TurboConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load settings, falling back to defaults.
///
/// A missing file is created with the defaults. A broken file is left in
/// place (so the user can fix it) and defaults are used for this session.
pub fn load_or_init(path: &Path) -> TurboConfig {
    if !path.exists() {
        let config = TurboConfig::default();
        match save(path, &config) {
            Ok(()) => info!("[CFG] Wrote default settings to {}", path.display()),
            Err(e) => error!("[CFG] Failed to write default settings: {e}"),
        }
        return config;
    }
    match load(path) {
        Ok(config) => {
            info!(
                "[CFG] Loaded settings: enabled={}, period={}, {} combo(s)",
                config.enabled,
                config.period,
                config.combos.len()
            );
            config
        }
        Err(e) => {
            warn!("[CFG] {e}; using defaults");
            TurboConfig::default()
        }
    }
}
