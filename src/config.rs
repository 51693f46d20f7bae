//! Per-run configuration and its validation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_PKCS12_CERT_FILE_NAME: &str = "certP12";
pub const DEFAULT_CERT_FILE_NAME: &str = "cert";
pub const DEFAULT_KEY_FILE_NAME: &str = "key";
pub const DEFAULT_COMMON_NAME: &str = "localhost";
pub const DEFAULT_VALIDITY_DAYS: u32 = 3650;
pub const DEFAULT_KEY_BITS: u32 = 2048;

/// Settings for one certificate generation run.
///
/// Built fresh for each invocation; nothing here is shared between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory that holds the bundle, certificate and key. Must already exist.
    pub certificate_folder: Option<PathBuf>,
    /// Register the certificate with the trusted root store (Windows only).
    pub install_cert_windows: bool,
    pub pkcs12_cert_file_name: String,
    pub cert_file_name: String,
    pub key_file_name: String,
    /// Subject common name. Also used as the bundle's file name suffix.
    pub common_name: String,
    pub validity_days: u32,
    pub key_bits: u32,
    /// Password protecting the PKCS#12 bundle. Empty by default.
    pub pkcs12_password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            certificate_folder: None,
            install_cert_windows: true,
            pkcs12_cert_file_name: DEFAULT_PKCS12_CERT_FILE_NAME.to_string(),
            cert_file_name: DEFAULT_CERT_FILE_NAME.to_string(),
            key_file_name: DEFAULT_KEY_FILE_NAME.to_string(),
            common_name: DEFAULT_COMMON_NAME.to_string(),
            validity_days: DEFAULT_VALIDITY_DAYS,
            key_bits: DEFAULT_KEY_BITS,
            pkcs12_password: String::new(),
        }
    }
}

impl Config {
    pub fn new(certificate_folder: impl Into<PathBuf>) -> Self {
        Self {
            certificate_folder: Some(certificate_folder.into()),
            ..Self::default()
        }
    }

    pub fn with_install_cert_windows(self, install: bool) -> Self {
        Self {
            install_cert_windows: install,
            ..self
        }
    }

    pub fn with_pkcs12_cert_file_name(self, name: impl Into<String>) -> Self {
        Self {
            pkcs12_cert_file_name: name.into(),
            ..self
        }
    }

    pub fn with_cert_file_name(self, name: impl Into<String>) -> Self {
        Self {
            cert_file_name: name.into(),
            ..self
        }
    }

    pub fn with_key_file_name(self, name: impl Into<String>) -> Self {
        Self {
            key_file_name: name.into(),
            ..self
        }
    }

    pub fn with_common_name(self, common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..self
        }
    }

    pub fn with_validity_days(self, days: u32) -> Self {
        Self {
            validity_days: days,
            ..self
        }
    }

    pub fn with_key_bits(self, bits: u32) -> Self {
        Self {
            key_bits: bits,
            ..self
        }
    }

    pub fn with_pkcs12_password(self, password: impl Into<String>) -> Self {
        Self {
            pkcs12_password: password.into(),
            ..self
        }
    }

    /// The certificate folder, or `MissingField` when it was never set.
    pub fn folder(&self) -> Result<&Path, ConfigError> {
        self.certificate_folder
            .as_deref()
            .ok_or(ConfigError::MissingField("certificate_folder"))
    }
}

/// Checks that `config` can be used before anything is written to disk.
///
/// Only reads filesystem metadata, so it is safe to call any number of times.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let folder = config.folder()?;
    let metadata = fs::metadata(folder).map_err(|source| ConfigError::FolderNotFound {
        path: folder.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::NotADirectory {
            path: folder.to_path_buf(),
        });
    }

    check_file_name("pkcs12_cert_file_name", &config.pkcs12_cert_file_name)?;
    check_file_name("cert_file_name", &config.cert_file_name)?;
    check_file_name("key_file_name", &config.key_file_name)?;
    // The common name ends up in the bundle's file name as well.
    check_file_name("common_name", &config.common_name)?;

    if config.validity_days == 0 {
        return Err(ConfigError::InvalidValue {
            field: "validity_days",
            reason: "must be at least one day".to_string(),
        });
    }
    if config.key_bits == 0 {
        return Err(ConfigError::InvalidValue {
            field: "key_bits",
            reason: "must be non-zero".to_string(),
        });
    }
    Ok(())
}

fn check_file_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(|c| c == '/' || c == '\\' || c == '\0');
    if bad {
        return Err(ConfigError::InvalidFileName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
