//! Snapshots of which certificate artifacts exist on disk.
//!
//! The certificate and key live at fixed paths derived from the configuration.
//! The PKCS#12 bundle carries a hostname suffix in its name, so it has to be
//! found by listing the folder.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};

pub const CERT_EXTENSION: &str = "crt";
pub const KEY_EXTENSION: &str = "key";
pub const PKCS12_EXTENSION: &str = "p12";

/// Existence of one artifact at the time it was inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub file_exists: bool,
    pub file_path: Option<PathBuf>,
}

impl ArtifactStatus {
    fn at(path: PathBuf) -> Self {
        Self {
            file_exists: path.is_file(),
            file_path: Some(path),
        }
    }

    fn discovered(path: Option<PathBuf>) -> Self {
        Self {
            file_exists: path.is_some(),
            file_path: path,
        }
    }

    /// The path of the artifact, if it is present on disk.
    pub fn existing_path(&self) -> Option<&Path> {
        if self.file_exists {
            self.file_path.as_deref()
        } else {
            None
        }
    }
}

/// Where an artifact triple is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No bundle yet. Leftover certificate or key files may exist.
    Missing,
    /// Bundle present, certificate or key still to be extracted.
    Pkcs12Ready,
    /// All three artifacts present.
    Complete,
}

/// Point-in-time view of the three artifacts in a certificate folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertFiles {
    pub cert: ArtifactStatus,
    pub key: ArtifactStatus,
    pub pkcs12: ArtifactStatus,
}

impl CertFiles {
    pub fn stage(&self) -> Stage {
        match (
            self.pkcs12.file_exists,
            self.cert.file_exists && self.key.file_exists,
        ) {
            (false, _) => Stage::Missing,
            (true, false) => Stage::Pkcs12Ready,
            (true, true) => Stage::Complete,
        }
    }
}

pub fn cert_path(folder: &Path, config: &Config) -> PathBuf {
    folder.join(format!("{}.{}", config.cert_file_name, CERT_EXTENSION))
}

pub fn key_path(folder: &Path, config: &Config) -> PathBuf {
    folder.join(format!("{}.{}", config.key_file_name, KEY_EXTENSION))
}

/// The path a newly generated bundle is written to.
pub fn pkcs12_path(folder: &Path, config: &Config) -> PathBuf {
    folder.join(format!(
        "{}_{}.{}",
        config.pkcs12_cert_file_name, config.common_name, PKCS12_EXTENSION
    ))
}

/// Inspects the configured folder. Never caches; every call stats the disk again.
pub fn check_cert_files(config: &Config) -> Result<CertFiles> {
    let folder = config.folder()?;
    let files = CertFiles {
        cert: ArtifactStatus::at(cert_path(folder, config)),
        key: ArtifactStatus::at(key_path(folder, config)),
        pkcs12: ArtifactStatus::discovered(find_pkcs12(folder, &config.pkcs12_cert_file_name)?),
    };
    debug!(
        cert = files.cert.file_exists,
        key = files.key.file_exists,
        pkcs12 = files.pkcs12.file_exists,
        "inspected {}",
        folder.display()
    );
    Ok(files)
}

/// Looks for `<base>_<suffix>.p12`. With several candidates the lexicographically
/// first file name wins.
fn find_pkcs12(folder: &Path, base: &str) -> Result<Option<PathBuf>> {
    let io_err = |source| Error::Io {
        path: folder.to_path_buf(),
        source,
    };
    let prefix = format!("{}_", base);
    let mut matches = Vec::new();
    for entry in fs::read_dir(folder).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let is_bundle = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with(&prefix))
            && path
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case(PKCS12_EXTENSION));
        if is_bundle && path.is_file() {
            matches.push(path);
        }
    }

    matches.sort();
    let mut matches = matches.into_iter();
    let first = matches.next();
    let ignored: Vec<_> = matches.collect();
    if let Some(chosen) = &first {
        if !ignored.is_empty() {
            warn!(
                "found {} PKCS#12 bundles, using {}, ignoring {:?}",
                ignored.len() + 1,
                chosen.display(),
                ignored
            );
        }
    }
    Ok(first)
}
