//! Settings Persistence System
//!
//! Provides persistent settings for the annotation pipeline with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - Migration support for schema changes
//!
//! Storage location: {config_dir}/settings.json
//!
//! Operations never read settings ambiently. Each run loads an immutable
//! [`Configuration`] snapshot from a [`ConfigStore`] and passes it down.

mod validation;

pub use validation::{parse_service_url, validate_service_url, ALLOWED_SCHEMES};

use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};
use crate::types::AnnotationKind;

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Default annotation service URL
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000/";

/// Default frontmatter property for generated tags
pub const DEFAULT_PROPERTY_NAME: &str = "tags";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Models offered by the annotation service, as `(id, display name)`
pub const KNOWN_MODELS: &[(&str, &str)] = &[
    ("groq:llama3-8b-8192", "Groq Llama3 8 Billion"),
    ("groq:llama3-70b-8192", "Groq Llama3 70 Billion"),
];

/// Returns the display name for a known model id
pub fn model_display_name(model: &str) -> Option<&'static str> {
    KNOWN_MODELS
        .iter()
        .find(|(id, _)| *id == model)
        .map(|(_, name)| *name)
}

// =============================================================================
// Persisted Settings
// =============================================================================

/// Persisted settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Annotation service base URL
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional API key for the annotation service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Frontmatter property that receives generated tags
    #[serde(default = "default_property_name")]
    pub metadata_property_name: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_model() -> String {
    KNOWN_MODELS[0].0.to_string()
}

fn default_property_name() -> String {
    DEFAULT_PROPERTY_NAME.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            service_url: default_service_url(),
            model: default_model(),
            api_key: None,
            metadata_property_name: default_property_name(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppSettings {
    /// Normalizes settings to a valid state.
    ///
    /// Loaded settings may be hand-edited; anything unusable falls back to
    /// its default rather than failing the next operation.
    pub fn normalize(&mut self) {
        self.service_url = self.service_url.trim().to_string();
        if parse_service_url(&self.service_url).is_err() {
            warn!(
                "Invalid service URL in settings, resetting to {}",
                DEFAULT_SERVICE_URL
            );
            self.service_url = default_service_url();
        }

        self.model = self.model.trim().to_string();
        if self.model.is_empty() {
            self.model = default_model();
        }

        self.api_key = self
            .api_key
            .take()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        self.metadata_property_name = self.metadata_property_name.trim().to_string();
        if self.metadata_property_name.is_empty() {
            self.metadata_property_name = default_property_name();
        }

        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 600);
    }

    /// Checks values a user is about to persist.
    ///
    /// Unlike [`AppSettings::normalize`], this rejects instead of repairing.
    pub fn validate(&self) -> CoreResult<()> {
        validate_service_url(&self.service_url)?;

        if self.metadata_property_name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "metadata property name cannot be empty".to_string(),
            ));
        }
        if self.metadata_property_name.contains(':') || self.metadata_property_name.contains('\n')
        {
            return Err(CoreError::ValidationError(format!(
                "invalid metadata property name: {}",
                self.metadata_property_name
            )));
        }

        if model_display_name(&self.model).is_none() {
            warn!("Model '{}' is not in the known model list", self.model);
        }

        Ok(())
    }

    /// Produces the immutable per-operation configuration
    pub fn configuration(&self) -> Configuration {
        Configuration {
            service_base_url: self.service_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            metadata_property_name: self.metadata_property_name.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

// =============================================================================
// Per-Operation Configuration
// =============================================================================

/// Immutable configuration snapshot used by a single operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub service_base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub metadata_property_name: String,
    pub request_timeout_secs: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        AppSettings::default().configuration()
    }
}

impl Configuration {
    /// Resolves the endpoint for a request kind against the base URL.
    ///
    /// Fails with [`CoreError::InvalidServiceUrl`] instead of guessing a host.
    pub fn endpoint(&self, kind: AnnotationKind) -> CoreResult<Url> {
        let base = parse_service_url(&self.service_base_url)?;
        base.join(kind.endpoint_path())
            .map_err(|e| CoreError::InvalidServiceUrl(format!("{}: {}", self.service_base_url, e)))
    }

    /// API key, if one is configured and non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn with_service_url(mut self, url: &str) -> Self {
        self.service_base_url = url.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_property_name(mut self, name: &str) -> Self {
        self.metadata_property_name = name.to_string();
        self
    }
}

// =============================================================================
// Config Store
// =============================================================================

/// Load/save capability over the persisted settings
pub trait ConfigStore: Send + Sync {
    /// Loads settings, falling back to defaults
    fn load(&self) -> AppSettings;

    /// Validates and persists settings, returning what was stored
    fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings>;

    /// Loads an immutable configuration snapshot for one operation
    fn configuration(&self) -> Configuration {
        self.load().configuration()
    }
}

/// In-memory settings store for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    settings: Mutex<AppSettings>,
}

impl MemoryConfigStore {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> AppSettings {
        match self.settings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        settings.validate()?;
        let mut normalized = settings.clone();
        normalized.normalize();

        let mut guard = self
            .settings
            .lock()
            .map_err(|_| CoreError::Internal("settings lock poisoned".to_string()))?;
        *guard = normalized.clone();
        Ok(normalized)
    }
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Settings manager for loading, saving, and resetting settings on disk
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given config directory
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
        }
    }

    /// Default config directory (`{platform config dir}/margin`)
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("margin")
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }

    /// Reset only the service URL to its default
    pub fn reset_service_url(&self) -> CoreResult<AppSettings> {
        let mut settings = self.load();
        settings.service_url = default_service_url();
        self.save(&settings)
    }

    /// Loads settings from disk, reporting why an existing file is unusable.
    ///
    /// A missing file yields defaults.
    pub fn try_load(&self) -> CoreResult<AppSettings> {
        self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path).map_err(|e| {
                CoreError::Internal(format!(
                    "Failed to read settings file {}: {}",
                    self.settings_path.display(),
                    e
                ))
            })?;
            let mut settings = serde_json::from_str::<AppSettings>(&content).map_err(|e| {
                CoreError::ValidationError(format!("Failed to parse settings file: {}", e))
            })?;

            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = self.migrate(settings);
            }

            settings.normalize();
            Ok(settings)
        })
    }

    fn migrate(&self, mut settings: AppSettings) -> AppSettings {
        settings.version = SETTINGS_VERSION;
        settings
    }
}

impl ConfigStore for SettingsManager {
    /// Load settings from disk, returning defaults if the file doesn't exist
    fn load(&self) -> AppSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Save settings to disk using atomic write (temp file + rename)
    fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        settings.validate()?;

        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            crate::fs::atomic_write_json_pretty(&self.settings_path, &normalized)?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }
}
