//! Registering the generated certificate with the operating system trust store.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::InstallError;
use crate::process;

/// Platforms that need different trust store handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

pub trait TrustInstaller {
    /// Adds the certificate at `cert` to the trusted roots.
    fn install(&self, cert: &Path) -> Result<(), InstallError>;
}

impl<T: TrustInstaller + ?Sized> TrustInstaller for &T {
    fn install(&self, cert: &Path) -> Result<(), InstallError> {
        (**self).install(cert)
    }
}

impl<T: TrustInstaller + ?Sized> TrustInstaller for Box<T> {
    fn install(&self, cert: &Path) -> Result<(), InstallError> {
        (**self).install(cert)
    }
}

/// Used where there is no supported trust store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstaller;

impl TrustInstaller for NoopInstaller {
    fn install(&self, cert: &Path) -> Result<(), InstallError> {
        debug!(
            "no trust store support on this platform, skipping {}",
            cert.display()
        );
        Ok(())
    }
}

/// The Windows root store, driven through `certutil`.
#[derive(Debug, Clone)]
pub struct WindowsTrustStore {
    program: PathBuf,
}

impl Default for WindowsTrustStore {
    fn default() -> Self {
        Self {
            program: PathBuf::from("certutil"),
        }
    }
}

impl WindowsTrustStore {
    fn command(&self, cert: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(["-addstore", "Root"]).arg(cert);
        command
    }
}

impl TrustInstaller for WindowsTrustStore {
    fn install(&self, cert: &Path) -> Result<(), InstallError> {
        if !cert.is_file() {
            return Err(InstallError::CertificateNotFound(cert.to_path_buf()));
        }
        info!("adding {} to the Windows root store", cert.display());
        process::run(&mut self.command(cert))?;
        info!("certificate installed");
        Ok(())
    }
}

/// Picks the trust store integration for `platform`.
pub fn installer_for(platform: Platform) -> Box<dyn TrustInstaller> {
    match platform {
        Platform::Windows => Box::new(WindowsTrustStore::default()),
        Platform::Other => Box::new(NoopInstaller),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn certutil_adds_to_root_store() {
        let store = WindowsTrustStore::default();
        let command = store.command(Path::new("C:\\certs\\cert.crt"));

        assert_eq!(command.get_program(), "certutil");
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("-addstore"),
                OsStr::new("Root"),
                OsStr::new("C:\\certs\\cert.crt")
            ]
        );
    }

    #[test]
    fn missing_certificate_is_rejected_before_running_certutil() {
        let err = WindowsTrustStore::default()
            .install(Path::new("/nonexistent/cert.crt"))
            .unwrap_err();
        assert!(matches!(err, InstallError::CertificateNotFound(_)));
    }

    #[test]
    fn noop_always_succeeds() {
        NoopInstaller
            .install(Path::new("/nonexistent/cert.crt"))
            .unwrap();
        installer_for(Platform::Other)
            .install(Path::new("/nonexistent/cert.crt"))
            .unwrap();
    }

    #[test]
    fn current_platform_matches_target() {
        assert_eq!(Platform::current() == Platform::Windows, cfg!(windows));
    }
}
