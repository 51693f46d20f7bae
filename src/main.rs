use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auto_self_sign::{installer_for, AutoSelfSign, Config, OpensslToolchain, Platform, PrettyErr};

#[derive(StructOpt, Debug)]
#[structopt(name = "auto-self-sign")]
struct Opt {
    /// Folder holding the bundle, certificate and key
    #[structopt(parse(from_os_str), short = "f", long = "folder")]
    folder: Option<PathBuf>,
    /// Do not add the certificate to the Windows root store
    #[structopt(long = "no-install")]
    no_install: bool,
    /// Subject common name, also used in the bundle's file name
    #[structopt(long = "common-name", default_value = "localhost")]
    common_name: String,
    /// Certificate validity in days
    #[structopt(long = "days", default_value = "3650")]
    days: u32,
    /// RSA key size in bits
    #[structopt(long = "key-bits", default_value = "2048")]
    key_bits: u32,
    /// Base name of the PEM certificate
    #[structopt(long = "cert-name", default_value = "cert")]
    cert_name: String,
    /// Base name of the PEM private key
    #[structopt(long = "key-name", default_value = "key")]
    key_name: String,
    /// Base name of the PKCS#12 bundle
    #[structopt(long = "p12-name", default_value = "certP12")]
    p12_name: String,
    /// Password protecting the PKCS#12 bundle
    #[structopt(long = "password", default_value = "")]
    password: String,
    /// OpenSSL executable
    #[structopt(parse(from_os_str), long = "openssl", default_value = "openssl")]
    openssl: PathBuf,
    /// Write the certificate and key to stdout
    #[structopt(long = "print")]
    print: bool,
}

fn main() {
    let opt = Opt::from_args();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = if let Err(e) = run(opt) {
        eprintln!("ERROR: {}", PrettyErr::new(&*e));
        1
    } else {
        0
    };
    ::std::process::exit(code);
}

/// The platform data directory, created on first use.
fn default_folder() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "auto-self-sign")
        .context("no home directory to keep certificates in")?;
    let folder = dirs.data_dir().join("certs");
    fs::create_dir_all(&folder).context("failed to create certificate directory")?;
    Ok(folder)
}

fn run(options: Opt) -> Result<()> {
    let folder = match options.folder {
        Some(folder) => folder,
        None => default_folder()?,
    };
    let config = Config::new(&folder)
        .with_install_cert_windows(!options.no_install)
        .with_common_name(options.common_name)
        .with_validity_days(options.days)
        .with_key_bits(options.key_bits)
        .with_cert_file_name(options.cert_name)
        .with_key_file_name(options.key_name)
        .with_pkcs12_cert_file_name(options.p12_name)
        .with_pkcs12_password(options.password);

    let signer = AutoSelfSign::with(
        OpensslToolchain::new(options.openssl),
        installer_for(Platform::current()),
    );
    let material = signer
        .run(&config)
        .with_context(|| format!("failed to prepare certificates in {}", folder.display()))?;
    info!("certificates ready in {}", folder.display());

    if options.print {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(material.cert.as_bytes())
            .context("failed to write certificate")?;
        out.write_all(material.key.as_bytes())
            .context("failed to write private key")?;
    }
    Ok(())
}
