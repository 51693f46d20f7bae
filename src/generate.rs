//! Creating the PKCS#12 bundle and deriving the PEM files from it.
//!
//! A bundle is never overwritten. The PEM files are always rewritten as a pair
//! from the current bundle.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::config::Config;
use crate::error::GenerationError;
use crate::inspect::{self, CertFiles};
use crate::material::{self, CertificateMaterial};
use crate::toolchain::{BundleRequest, Toolchain};

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> GenerationError + '_ {
    move |source| GenerationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Creates a new self-signed PKCS#12 bundle in the certificate folder.
///
/// `files` must report no bundle; a bundle that already exists is never replaced.
/// Returns the path of the new bundle.
pub fn generate_pkcs12(
    toolchain: &dyn Toolchain,
    files: &CertFiles,
    config: &Config,
) -> Result<PathBuf, GenerationError> {
    if let Some(existing) = files.pkcs12.existing_path() {
        return Err(GenerationError::AlreadyExists(existing.to_path_buf()));
    }
    let folder = config.folder()?;
    let path = inspect::pkcs12_path(folder, config);
    // The snapshot may be stale.
    if path.exists() {
        return Err(GenerationError::AlreadyExists(path));
    }

    info!("generating PKCS#12 bundle {}", path.display());
    toolchain.create_pkcs12(&BundleRequest {
        path: path.clone(),
        common_name: config.common_name.clone(),
        validity_days: config.validity_days,
        key_bits: config.key_bits,
        password: config.pkcs12_password.clone(),
    })?;

    if !path.is_file() {
        return Err(GenerationError::Io {
            path,
            source: io::Error::new(
                io::ErrorKind::NotFound,
                "toolchain reported success but wrote no bundle",
            ),
        });
    }
    Ok(path)
}

/// Extracts the certificate and private key from the bundle in `files` and
/// writes both PEM files.
///
/// The pair always comes from the same bundle: a certificate or key left over
/// from an earlier bundle is replaced, each file through a temporary file that
/// is renamed into place. Returns the contents of both files.
pub fn generate_cert(
    toolchain: &dyn Toolchain,
    files: &CertFiles,
    config: &Config,
) -> Result<CertificateMaterial, GenerationError> {
    let bundle = files
        .pkcs12
        .existing_path()
        .ok_or(GenerationError::MissingBundle)?;
    let folder = config.folder()?;
    let cert_path = files
        .cert
        .file_path
        .clone()
        .unwrap_or_else(|| inspect::cert_path(folder, config));
    let key_path = files
        .key
        .file_path
        .clone()
        .unwrap_or_else(|| inspect::key_path(folder, config));

    // Extract both before touching disk so a failure leaves the folder as it was.
    let password = &config.pkcs12_password;
    let cert = material::certificate_pem(&toolchain.extract_certificate(bundle, password)?)?;
    let key = material::private_key_pem(&toolchain.extract_private_key(bundle, password)?)?;

    if files.cert.file_exists || files.key.file_exists {
        info!(
            "replacing existing PEM files with the contents of {}",
            bundle.display()
        );
    }
    replace(&cert_path, &cert, false)?;
    info!("wrote certificate {}", cert_path.display());
    replace(&key_path, &key, true)?;
    info!("wrote private key {}", key_path.display());

    read_pair(&cert_path, &key_path)
}

/// Reads the certificate and key named by `files` back from disk.
pub fn read_material(files: &CertFiles) -> Result<CertificateMaterial, GenerationError> {
    let cert = files
        .cert
        .file_path
        .as_deref()
        .ok_or(GenerationError::UnknownPath("certificate"))?;
    let key = files
        .key
        .file_path
        .as_deref()
        .ok_or(GenerationError::UnknownPath("private key"))?;
    read_pair(cert, key)
}

fn read_pair(cert: &Path, key: &Path) -> Result<CertificateMaterial, GenerationError> {
    Ok(CertificateMaterial {
        cert: fs::read_to_string(cert).map_err(io_error(cert))?,
        key: fs::read_to_string(key).map_err(io_error(key))?,
    })
}

/// Writes `contents` next to `path` and renames it over `path`.
///
/// Temporary files are created owner-only; certificates are widened to 0644.
fn replace(path: &Path, contents: &str, secret: bool) -> Result<(), GenerationError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
    file.write_all(contents.as_bytes())
        .map_err(io_error(file.path()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = if secret { 0o600 } else { 0o644 };
        fs::set_permissions(file.path(), fs::Permissions::from_mode(mode))
            .map_err(io_error(file.path()))?;
    }
    #[cfg(not(unix))]
    let _ = secret;

    file.persist(path).map_err(|e| GenerationError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
