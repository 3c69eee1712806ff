//! # Store Configuration
//!
//! Configuration management for the billing service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FANCY_STORE_NAME="Fancy Store"                                     │
//! │     FANCY_INVOICE_PREFIX=FANCY                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $FANCY_CONFIG, or                                                  │
//! │     ~/.config/fancy-billing/billing.toml (Linux)                       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Fancy Store, prefix FANCY, slabs 0/5/12/18/28, paisa round-off     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # billing.toml
//! [store]
//! name = "Fancy Store"
//! address = "123, MG Road, Bangalore - 560001, Karnataka, India"
//! phone = "+91 98765 43210"
//! email = "contact@fancystore.in"
//! gstin = "29ABCDE1234F1Z5"
//!
//! [billing]
//! invoice_prefix = "FANCY"
//! gst_rates = [0, 5, 12, 18, 28]
//! round_off = "nearest_rupee"   # nearest_paisa | nearest_rupee
//!
//! [database]
//! path = "/var/lib/fancy/fancy_store.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use fancy_core::validation::validate_invoice_prefix;
use fancy_core::{
    GstSlabs, InvoiceSequencer, RoundOffPolicy, SequenceError, TaxCalculator,
    DEFAULT_INVOICE_PREFIX,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "FANCY_CONFIG";

const CONFIG_FILE_NAME: &str = "billing.toml";
const DATABASE_FILE_NAME: &str = "fancy_store.db";

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Store Profile
// =============================================================================

/// Details printed in the invoice header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProfile {
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default = "default_store_address")]
    pub address: String,

    #[serde(default = "default_store_phone")]
    pub phone: String,

    #[serde(default = "default_store_email")]
    pub email: String,

    /// 15-character GST identification number. Empty when unregistered.
    #[serde(default = "default_gstin")]
    pub gstin: String,
}

fn default_store_name() -> String {
    "Fancy Store".to_string()
}

fn default_store_address() -> String {
    "123, MG Road, Bangalore - 560001, Karnataka, India".to_string()
}

fn default_store_phone() -> String {
    "+91 98765 43210".to_string()
}

fn default_store_email() -> String {
    "contact@fancystore.in".to_string()
}

fn default_gstin() -> String {
    "29ABCDE1234F1Z5".to_string()
}

impl Default for StoreProfile {
    fn default() -> Self {
        StoreProfile {
            name: default_store_name(),
            address: default_store_address(),
            phone: default_store_phone(),
            email: default_store_email(),
            gstin: default_gstin(),
        }
    }
}

// =============================================================================
// Billing Settings
// =============================================================================

/// Tax and numbering policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Fixed invoice number prefix, e.g. `FANCY` → `FANCY0001`.
    #[serde(default = "default_invoice_prefix")]
    pub invoice_prefix: String,

    /// Permitted GST rates in percent.
    #[serde(default = "default_gst_rates")]
    pub gst_rates: Vec<f64>,

    /// Grand total rounding.
    #[serde(default)]
    pub round_off: RoundOffPolicy,
}

fn default_invoice_prefix() -> String {
    DEFAULT_INVOICE_PREFIX.to_string()
}

fn default_gst_rates() -> Vec<f64> {
    vec![0.0, 5.0, 12.0, 18.0, 28.0]
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            invoice_prefix: default_invoice_prefix(),
            gst_rates: default_gst_rates(),
            round_off: RoundOffPolicy::default(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Where the SQLite file lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete billing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StoreProfile,

    #[serde(default)]
    pub billing: BillingSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$FANCY_CONFIG`, or billing.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let explicit = config_path.or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            // An explicitly named file must exist
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading billing config from file");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name must not be empty".into()));
        }

        validate_invoice_prefix(&self.billing.invoice_prefix)
            .map_err(|e| ConfigError::Invalid(format!("billing.invoice_prefix: {e}")))?;

        if self.billing.gst_rates.is_empty() {
            return Err(ConfigError::Invalid("billing.gst_rates must not be empty".into()));
        }

        if let Some(bad) = self
            .billing
            .gst_rates
            .iter()
            .find(|r| !r.is_finite() || **r < 0.0 || **r > 100.0)
        {
            return Err(ConfigError::Invalid(format!(
                "billing.gst_rates: {bad} is not a percentage between 0 and 100"
            )));
        }

        let gstin = self.store.gstin.trim();
        if !gstin.is_empty() && (gstin.len() != 15 || !gstin.chars().all(|c| c.is_ascii_alphanumeric())) {
            return Err(ConfigError::Invalid(format!(
                "store.gstin must be 15 letters or digits, got '{gstin}'"
            )));
        }

        Ok(())
    }

    /// Applies `FANCY_*` environment variable overrides.
    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup.
    ///
    /// Tax settings that fail to parse are an error; the default slabs are
    /// never kept silently.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(name) = var("FANCY_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(address) = var("FANCY_STORE_ADDRESS") {
            self.store.address = address;
        }

        if let Some(phone) = var("FANCY_STORE_PHONE") {
            self.store.phone = phone;
        }

        if let Some(email) = var("FANCY_STORE_EMAIL") {
            self.store.email = email;
        }

        if let Some(gstin) = var("FANCY_GSTIN") {
            self.store.gstin = gstin;
        }

        if let Some(prefix) = var("FANCY_INVOICE_PREFIX") {
            debug!(prefix = %prefix, "Overriding invoice prefix from environment");
            self.billing.invoice_prefix = prefix;
        }

        if let Some(rates) = var("FANCY_GST_RATES") {
            self.billing.gst_rates = rates
                .split(',')
                .map(|r| r.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|e| ConfigError::Invalid(format!("FANCY_GST_RATES '{rates}': {e}")))?;
        }

        if let Some(policy) = var("FANCY_ROUND_OFF") {
            self.billing.round_off = policy
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("FANCY_ROUND_OFF '{policy}': {e}")))?;
        }

        if let Some(path) = var("FANCY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The configured database file, or the platform default.
    ///
    /// - **Linux**: `~/.local/share/fancy-billing/fancy_store.db`
    /// - **macOS**: `~/Library/Application Support/in.fancystore.billing/fancy_store.db`
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    /// Permitted GST slabs.
    pub fn slabs(&self) -> GstSlabs {
        GstSlabs::from_percentages(&self.billing.gst_rates)
    }

    /// Calculator for the configured slabs and round-off.
    pub fn calculator(&self) -> TaxCalculator {
        TaxCalculator::new(self.slabs(), self.billing.round_off)
    }

    /// Sequencer for the configured prefix.
    pub fn sequencer(&self) -> Result<InvoiceSequencer, SequenceError> {
        InvoiceSequencer::new(self.billing.invoice_prefix.clone())
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("in", "fancystore", "billing")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fancy_core::TaxRate;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.store.name, "Fancy Store");
        assert_eq!(config.billing.invoice_prefix, "FANCY");
        assert_eq!(config.billing.round_off, RoundOffPolicy::NearestPaisa);
        assert!(config.validate().is_ok());
        assert_eq!(config.slabs(), GstSlabs::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            [store]
            name = "Fancy Store Jayanagar"

            [billing]
            round_off = "nearest_rupee"
            gst_rates = [5, 18]
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Fancy Store Jayanagar");
        assert_eq!(config.store.gstin, "29ABCDE1234F1Z5");
        assert_eq!(config.billing.invoice_prefix, "FANCY");
        assert_eq!(config.billing.round_off, RoundOffPolicy::NearestRupee);
        assert!(config.slabs().contains(TaxRate::from_bps(1800)));
        assert!(!config.slabs().contains(TaxRate::from_bps(1200)));
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = StoreConfig::default();
        config.apply_overrides(lookup(&[
            ("FANCY_INVOICE_PREFIX", "FS-"),
            ("FANCY_ROUND_OFF", "rupee"),
            ("FANCY_GST_RATES", "0, 12, 18"),
            ("FANCY_DB_PATH", "/tmp/store.db"),
        ]))
        .unwrap();

        assert_eq!(config.billing.invoice_prefix, "FS-");
        assert_eq!(config.billing.round_off, RoundOffPolicy::NearestRupee);
        assert_eq!(config.billing.gst_rates, vec![0.0, 12.0, 18.0]);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/store.db"));
        assert_eq!(config.sequencer().unwrap().format_number(7), "FS-0007");
    }

    #[test]
    fn test_malformed_tax_env_values_are_rejected() {
        let mut config = StoreConfig::default();
        let err = config
            .apply_overrides(lookup(&[("FANCY_GST_RATES", "5,abc")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("FANCY_GST_RATES")));

        let err = config
            .apply_overrides(lookup(&[("FANCY_ROUND_OFF", "banker")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("FANCY_ROUND_OFF")));

        assert_eq!(config.billing.round_off, RoundOffPolicy::NearestPaisa);
        assert_eq!(config.billing.gst_rates, default_gst_rates());
    }

    #[test]
    fn test_validation() {
        let mut config = StoreConfig::default();

        config.billing.invoice_prefix = "INV2024".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.billing.invoice_prefix = "FANCY".to_string();
        config.billing.gst_rates = vec![5.0, 120.0];
        assert!(config.validate().is_err());

        config.billing.gst_rates = vec![];
        assert!(config.validate().is_err());

        config.billing.gst_rates = default_gst_rates();
        config.store.gstin = "29ABC".to_string();
        assert!(config.validate().is_err());

        config.store.gstin = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("fancy-billing-does-not-exist.toml");
        let err = StoreConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&StoreConfig::default()).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[billing]"));
        assert!(toml_str.contains("nearest_paisa"));
    }
}
