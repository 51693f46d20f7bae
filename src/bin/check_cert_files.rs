use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use auto_self_sign::{check_cert_files, validate_config, ArtifactStatus, Config, PrettyErr};

/// Report which certificate artifacts exist without generating anything
#[derive(StructOpt, Debug)]
#[structopt(name = "check-cert-files")]
struct Opt {
    /// Folder holding the bundle, certificate and key
    #[structopt(parse(from_os_str), short = "f", long = "folder")]
    folder: PathBuf,
    #[structopt(long = "cert-name", default_value = "cert")]
    cert_name: String,
    #[structopt(long = "key-name", default_value = "key")]
    key_name: String,
    #[structopt(long = "p12-name", default_value = "certP12")]
    p12_name: String,
}

fn describe(name: &str, status: &ArtifactStatus) {
    let path = status
        .file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let state = if status.file_exists { "present" } else { "missing" };
    println!("{:<8} {:<8} {}", name, state, path);
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

fn run(options: Opt) -> Result<()> {
    let config = Config::new(options.folder)
        .with_cert_file_name(options.cert_name)
        .with_key_file_name(options.key_name)
        .with_pkcs12_cert_file_name(options.p12_name);

    validate_config(&config)?;
    let files = check_cert_files(&config).context("failed to inspect certificate folder")?;
    describe("pkcs12", &files.pkcs12);
    describe("cert", &files.cert);
    describe("key", &files.key);
    println!("stage    {:?}", files.stage());
    Ok(())
}
