//! The external crypto toolchain that actually creates keys and certificates.
//!
//! Generation code only talks to the [`Toolchain`] trait so it can be driven by
//! a fake in tests. [`OpensslToolchain`] shells out to the `openssl` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::GenerationError;
use crate::process;

/// Everything needed to create a self-signed PKCS#12 bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub path: PathBuf,
    pub common_name: String,
    pub validity_days: u32,
    pub key_bits: u32,
    pub password: String,
}

pub trait Toolchain {
    /// Creates a new key, self-signs a certificate for it and writes both into a
    /// PKCS#12 bundle at `request.path`.
    fn create_pkcs12(&self, request: &BundleRequest) -> Result<(), GenerationError>;

    /// Returns the toolchain's textual output containing the bundle's
    /// certificate as PEM.
    fn extract_certificate(&self, bundle: &Path, password: &str)
        -> Result<String, GenerationError>;

    /// Returns the toolchain's textual output containing the bundle's private
    /// key, unencrypted, as PEM.
    fn extract_private_key(&self, bundle: &Path, password: &str)
        -> Result<String, GenerationError>;
}

impl<T: Toolchain + ?Sized> Toolchain for &T {
    fn create_pkcs12(&self, request: &BundleRequest) -> Result<(), GenerationError> {
        (**self).create_pkcs12(request)
    }

    fn extract_certificate(
        &self,
        bundle: &Path,
        password: &str,
    ) -> Result<String, GenerationError> {
        (**self).extract_certificate(bundle, password)
    }

    fn extract_private_key(
        &self,
        bundle: &Path,
        password: &str,
    ) -> Result<String, GenerationError> {
        (**self).extract_private_key(bundle, password)
    }
}

/// Drives the `openssl` command line tool.
#[derive(Debug, Clone)]
pub struct OpensslToolchain {
    program: PathBuf,
}

impl Default for OpensslToolchain {
    fn default() -> Self {
        Self::new("openssl")
    }
}

impl OpensslToolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }

    fn stdout(&self, command: &mut Command) -> Result<String, GenerationError> {
        let output = process::run(command)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `openssl req`: a new unencrypted RSA key and a certificate self-signed with it.
    fn req_command(&self, request: &BundleRequest, key: &Path, cert: &Path) -> Command {
        let mut command = self.command();
        command
            .args(["req", "-x509", "-nodes", "-newkey"])
            .arg(format!("rsa:{}", request.key_bits))
            .arg("-keyout")
            .arg(key)
            .arg("-out")
            .arg(cert)
            .arg("-days")
            .arg(request.validity_days.to_string())
            .arg("-subj")
            .arg(format!("/CN={}", request.common_name));
        command
    }

    /// `openssl pkcs12 -export`: bundles `key` and `cert` at `request.path`.
    fn export_command(&self, request: &BundleRequest, key: &Path, cert: &Path) -> Command {
        let mut command = self.command();
        command
            .args(["pkcs12", "-export", "-inkey"])
            .arg(key)
            .arg("-in")
            .arg(cert)
            .arg("-name")
            .arg(&request.common_name)
            .arg("-out")
            .arg(&request.path)
            .arg("-passout")
            .arg(pass_arg(&request.password));
        command
    }

    fn extract_certificate_command(&self, bundle: &Path, password: &str) -> Command {
        let mut command = self.command();
        command
            .args(["pkcs12", "-clcerts", "-nokeys", "-in"])
            .arg(bundle)
            .arg("-passin")
            .arg(pass_arg(password));
        command
    }

    fn extract_private_key_command(&self, bundle: &Path, password: &str) -> Command {
        let mut command = self.command();
        command
            .args(["pkcs12", "-nocerts", "-nodes", "-in"])
            .arg(bundle)
            .arg("-passin")
            .arg(pass_arg(password));
        command
    }
}

fn pass_arg(password: &str) -> String {
    format!("pass:{}", password)
}

impl Toolchain for OpensslToolchain {
    fn create_pkcs12(&self, request: &BundleRequest) -> Result<(), GenerationError> {
        // The bare key and certificate only exist until they are bundled.
        let scratch = tempfile::tempdir().map_err(|source| GenerationError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        let key = scratch.path().join("key.pem");
        let cert = scratch.path().join("cert.pem");

        debug!(
            "creating {}-bit self-signed key pair for CN={}",
            request.key_bits, request.common_name
        );
        process::run(&mut self.req_command(request, &key, &cert))?;
        process::run(&mut self.export_command(request, &key, &cert))?;
        Ok(())
    }

    fn extract_certificate(
        &self,
        bundle: &Path,
        password: &str,
    ) -> Result<String, GenerationError> {
        self.stdout(&mut self.extract_certificate_command(bundle, password))
    }

    fn extract_private_key(
        &self,
        bundle: &Path,
        password: &str,
    ) -> Result<String, GenerationError> {
        self.stdout(&mut self.extract_private_key_command(bundle, password))
    }
}
