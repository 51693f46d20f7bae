use tracing::{debug, info};

use crate::config::{validate_config, Config};
use crate::error::Result;
use crate::generate::{generate_cert, generate_pkcs12, read_material};
use crate::inspect::{check_cert_files, Stage};
use crate::install::{installer_for, Platform, TrustInstaller};
use crate::material::CertificateMaterial;
use crate::toolchain::{OpensslToolchain, Toolchain};

/// Runs the whole lifecycle: validate, inspect, generate what is missing,
/// optionally install, and hand back the PEM material.
///
/// Assumes a single writer per certificate folder.
pub struct AutoSelfSign<T = OpensslToolchain, I = Box<dyn TrustInstaller>> {
    toolchain: T,
    installer: I,
}

impl AutoSelfSign {
    /// OpenSSL from `PATH` and the trust store of the running platform.
    pub fn new() -> Self {
        Self::with(OpensslToolchain::default(), installer_for(Platform::current()))
    }
}

impl Default for AutoSelfSign {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Toolchain, I: TrustInstaller> AutoSelfSign<T, I> {
    pub fn with(toolchain: T, installer: I) -> Self {
        Self {
            toolchain,
            installer,
        }
    }

    pub fn run(&self, config: &Config) -> Result<CertificateMaterial> {
        validate_config(config)?;

        let mut files = check_cert_files(config)?;
        let material = match files.stage() {
            Stage::Complete => {
                debug!("all certificate artifacts present, nothing to generate");
                read_material(&files)?
            }
            stage => {
                // PEM files left over from an earlier bundle are rewritten too.
                if stage == Stage::Missing {
                    generate_pkcs12(&self.toolchain, &files, config)?;
                    files = check_cert_files(config)?;
                }
                let material = generate_cert(&self.toolchain, &files, config)?;
                files = check_cert_files(config)?;
                material
            }
        };

        if config.install_cert_windows {
            if let Some(cert) = files.cert.file_path.as_deref() {
                self.installer.install(cert)?;
            }
        }
        info!("certificate material ready");
        Ok(material)
    }
}

/// Generates (or reuses) the certificate material described by `config` using
/// OpenSSL and the current platform's trust store.
pub fn auto_self_sign(config: &Config) -> Result<CertificateMaterial> {
    AutoSelfSign::new().run(config)
}
