//! Plugin lifecycle: owns the settings and both interceptors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{self, SharedConfig};
use crate::error::ConfigError;
use crate::notify::Notifier;
use crate::pad::{VpadInterceptor, WpadInterceptor};

pub struct Plugin {
    config: SharedConfig,
    settings_path: PathBuf,
    vpad: VpadInterceptor,
    wpad: WpadInterceptor,
}

impl Plugin {
    /// Load settings (creating the file with defaults if needed) and set up
    /// both interceptors with zeroed channel state. Never fails: a broken
    /// settings file is logged and defaults are used.
    pub fn init(settings_path: impl Into<PathBuf>, notifier: Arc<dyn Notifier>) -> Self {
        let settings_path = settings_path.into();
        let config = config::shared(config::load_or_init(&settings_path));
        info!("[PLUGIN] Initialized, settings at {}", settings_path.display());
        Self {
            vpad: VpadInterceptor::new(config.clone(), notifier.clone()),
            wpad: WpadInterceptor::new(config.clone(), notifier),
            config,
            settings_path,
        }
    }

    /// Re-read the settings file. Keeps the current settings if it is
    /// missing or broken.
    pub fn on_application_start(&mut self) {
        match config::load(&self.settings_path) {
            Ok(cfg) => {
                info!("[PLUGIN] Application start, turbo {}", if cfg.enabled { "on" } else { "off" });
                *self.config.write().unwrap_or_else(|e| e.into_inner()) = cfg;
            }
            Err(e) => warn!("[PLUGIN] Application start, keeping current settings: {e}"),
        }
    }

    /// Turbo assignments never outlive the application that made them.
    pub fn on_application_end(&mut self) {
        info!("[PLUGIN] Application end, clearing turbo state");
        self.reset_channels();
    }

    /// Disarm every turbo button on every channel of both families.
    pub fn reset_all_turbos(&mut self) {
        info!("[PLUGIN] Resetting all turbos");
        self.reset_channels();
    }

    fn reset_channels(&mut self) {
        self.vpad.reset();
        self.wpad.reset();
    }

    pub fn save_settings(&self) -> Result<(), ConfigError> {
        let cfg = config::read(&self.config).clone();
        config::save(&self.settings_path, &cfg)?;
        info!("[PLUGIN] Settings saved to {}", self.settings_path.display());
        Ok(())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.config.write().unwrap_or_else(|e| e.into_inner()).enabled = enabled;
        info!("[PLUGIN] Turbo {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn config(&self) -> SharedConfig {
        Arc::clone(&self.config)
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn vpad(&self) -> &VpadInterceptor {
        &self.vpad
    }

    pub fn vpad_mut(&mut self) -> &mut VpadInterceptor {
        &mut self.vpad
    }

    pub fn wpad(&self) -> &WpadInterceptor {
        &self.wpad
    }

    pub fn wpad_mut(&mut self) -> &mut WpadInterceptor {
        &mut self.wpad
    }
}
