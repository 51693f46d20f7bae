use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use auto_self_sign::material::{certificate_pem, private_key_pem};
use auto_self_sign::{
    BundleRequest, CertificateMaterial, GenerationError, InstallError, ProcessError, Toolchain,
    TrustInstaller,
};
use pkcs8::der::asn1::AnyRef;
use pkcs8::der::Encode;
use pkcs8::{AlgorithmIdentifierRef, ObjectIdentifier, PrivateKeyInfo};

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Stands in for OpenSSL. The "bundle" it writes is a text file holding the
/// password followed by PEM blocks laid out the way `openssl pkcs12` prints them.
#[derive(Default)]
pub struct FakeToolchain {
    pub calls: RefCell<Vec<&'static str>>,
}

impl FakeToolchain {
    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    fn open(&self, bundle: &Path, password: &str) -> Result<String, GenerationError> {
        let contents = fs::read_to_string(bundle).map_err(|source| GenerationError::Io {
            path: bundle.to_path_buf(),
            source,
        })?;
        let mut parts = contents.splitn(2, '\n');
        let stored = parts.next().unwrap_or_default();
        if stored != format!("password={}", password) {
            return Err(ProcessError::Status {
                program: "openssl".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Mac verify error: invalid password?".to_string(),
            }
            .into());
        }
        Ok(parts.next().unwrap_or_default().to_string())
    }
}

/// A PKCS#8 wrapped RSA key whose body names the bundle it belongs to.
fn rsa_key_pem(serial: usize) -> String {
    let body = format!("pkcs1 key body {}", serial);
    let info = PrivateKeyInfo::new(
        AlgorithmIdentifierRef {
            oid: RSA_ENCRYPTION,
            parameters: Some(AnyRef::NULL),
        },
        body.as_bytes(),
    );
    pem::encode(&pem::Pem::new("PRIVATE KEY", info.to_der().unwrap()))
}

impl Toolchain for FakeToolchain {
    fn create_pkcs12(&self, request: &BundleRequest) -> Result<(), GenerationError> {
        self.calls.borrow_mut().push("create_pkcs12");
        let serial = self.count("create_pkcs12");
        let cert = rcgen::generate_simple_self_signed(vec![request.common_name.clone()]).unwrap();
        let contents = format!(
            "password={}\nBag Attributes\n    friendlyName: {}\n{}\nBag Attributes\n{}",
            request.password,
            request.common_name,
            cert.cert.pem(),
            rsa_key_pem(serial)
        );
        fs::write(&request.path, contents).unwrap();
        Ok(())
    }

    fn extract_certificate(&self, bundle: &Path, password: &str) -> Result<String, GenerationError> {
        self.calls.borrow_mut().push("extract_certificate");
        self.open(bundle, password)
    }

    fn extract_private_key(&self, bundle: &Path, password: &str) -> Result<String, GenerationError> {
        self.calls.borrow_mut().push("extract_private_key");
        self.open(bundle, password)
    }
}

/// The PEM pair `generate_cert` should derive from the bundle at `bundle`.
pub fn expected_material(bundle: &Path, password: &str) -> CertificateMaterial {
    let output = FakeToolchain::default().open(bundle, password).unwrap();
    CertificateMaterial {
        cert: certificate_pem(&output).unwrap(),
        key: private_key_pem(&output).unwrap(),
    }
}

/// Records every certificate it is asked to trust, optionally failing.
#[derive(Default)]
pub struct RecordingInstaller {
    pub installed: RefCell<Vec<PathBuf>>,
    pub fail: bool,
}

impl TrustInstaller for RecordingInstaller {
    fn install(&self, cert: &Path) -> Result<(), InstallError> {
        self.installed.borrow_mut().push(cert.to_path_buf());
        if self.fail {
            return Err(ProcessError::Status {
                program: "certutil".to_string(),
                status: "exit code: 5".to_string(),
                stderr: "Access is denied.".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
