//! Self-signed TLS certificates for local development.
//!
//! A run makes sure a certificate folder holds a PKCS#12 bundle, a PEM
//! certificate and a PEM private key, generating only what is missing, and can
//! register the certificate with the Windows root store.
//!
//! ```no_run
//! use auto_self_sign::{auto_self_sign, Config};
//!
//! let config = Config::new("/srv/dev-certs").with_install_cert_windows(false);
//! let material = auto_self_sign(&config)?;
//! assert!(material.cert.starts_with("-----BEGIN CERTIFICATE-----"));
//! # Ok::<(), auto_self_sign::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod inspect;
pub mod install;
pub mod material;
mod process;
pub mod signer;
pub mod toolchain;

pub use config::{validate_config, Config};
pub use error::{
    ConfigError, Error, ErrorExt, GenerationError, InstallError, PrettyErr, ProcessError, Result,
};
pub use generate::{generate_cert, generate_pkcs12, read_material};
pub use inspect::{check_cert_files, ArtifactStatus, CertFiles, Stage};
pub use install::{installer_for, NoopInstaller, Platform, TrustInstaller, WindowsTrustStore};
pub use material::CertificateMaterial;
pub use signer::{auto_self_sign, AutoSelfSign};
pub use toolchain::{BundleRequest, OpensslToolchain, Toolchain};
