use err_derive::Error;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Formats an error followed by every cause in its source chain.
pub struct PrettyErr<'a>(&'a (dyn StdError + 'static));

impl<'a> PrettyErr<'a> {
    pub fn new(err: &'a (dyn StdError + 'static)) -> Self {
        PrettyErr(err)
    }
}

impl<'a> fmt::Display for PrettyErr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)?;
        let mut x: &dyn StdError = self.0;
        while let Some(cause) = x.source() {
            f.write_str(": ")?;
            fmt::Display::fmt(&cause, f)?;
            x = cause;
        }
        Ok(())
    }
}

pub trait ErrorExt {
    fn pretty(&self) -> PrettyErr<'_>;
}

impl<E: StdError + 'static> ErrorExt for E {
    fn pretty(&self) -> PrettyErr<'_> {
        PrettyErr(self)
    }
}

/// Top-level error returned by the orchestration entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "invalid configuration")]
    Config(#[error(source)] #[error(from)] ConfigError),
    #[error(display = "certificate generation failed")]
    Generation(#[error(source)] #[error(from)] GenerationError),
    #[error(display = "certificate installation failed")]
    Install(#[error(source)] #[error(from)] InstallError),
    #[error(display = "failed to access {:?}", path)]
    Io {
        path: PathBuf,
        #[error(source)]
        source: io::Error,
    },
}

/// Configuration is missing or unusable. Raised before anything touches disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(display = "missing required field: {}", _0)]
    MissingField(&'static str),
    #[error(display = "Cert directory {:?} does not exist.", path)]
    FolderNotFound {
        path: PathBuf,
        #[error(source)]
        source: io::Error,
    },
    #[error(display = "Cert directory {:?} is not a directory.", path)]
    NotADirectory { path: PathBuf },
    #[error(display = "invalid file name for {}: {:?}", field, value)]
    InvalidFileName { field: &'static str, value: String },
    #[error(display = "invalid value for {}: {}", field, reason)]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(display = "unusable configuration")]
    Config(#[error(source)] #[error(from)] ConfigError),
    #[error(display = "refusing to overwrite existing artifact {:?}", _0)]
    AlreadyExists(PathBuf),
    #[error(display = "no PKCS#12 bundle available to extract from")]
    MissingBundle,
    #[error(display = "no path recorded for the {}", _0)]
    UnknownPath(&'static str),
    #[error(display = "crypto toolchain failed")]
    Toolchain(#[error(source)] #[error(from)] ProcessError),
    #[error(display = "toolchain output contained no {} block", _0)]
    MalformedOutput(&'static str),
    #[error(display = "failed to access {:?}", path)]
    Io {
        path: PathBuf,
        #[error(source)]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(display = "certificate not found: {:?}", _0)]
    CertificateNotFound(PathBuf),
    #[error(display = "trust store command failed")]
    Command(#[error(source)] #[error(from)] ProcessError),
}

/// An external command could not be started or exited unsuccessfully.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(display = "failed to run {}", program)]
    Spawn {
        program: String,
        #[error(source)]
        source: io::Error,
    },
    #[error(display = "{} exited with {}: {}", program, status, stderr)]
    Status {
        program: String,
        status: String,
        stderr: String,
    },
}
