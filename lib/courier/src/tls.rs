//! Process-wide TLS trust.
//!
//! By default connectors trust the Mozilla roots bundled in `webpki-roots`.
//! [`TrustCertificate`] and [`TrustKeystore`] replace that trust for every
//! [`crate::HyperConnector`] created afterwards. The replacement can be
//! installed once per process.
//!
//! Keys must be unencrypted PEM (PKCS#8, PKCS#1 or SEC1).

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use courier_core::{Error, Result};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use tracing::info;

static INSTALLED: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// Client configuration used for new connectors.
pub(crate) fn client_config() -> ClientConfig {
    INSTALLED
        .get()
        .map_or_else(default_client_config, |config| ClientConfig::clone(config))
}

/// Whether a custom trust has been installed.
#[must_use]
pub fn is_installed() -> bool {
    INSTALLED.get().is_some()
}

fn default_client_config() -> ClientConfig {
    let root_store: RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

fn install(config: ClientConfig, source: &Path) -> Result<()> {
    INSTALLED
        .set(Arc::new(config))
        .map_err(|_| Error::tls("a TLS trust configuration is already installed"))?;
    info!(source = %source.display(), "installed TLS trust");
    Ok(())
}

fn pem_error(path: &Path, err: &rustls::pki_types::pem::Error) -> Error {
    Error::tls(format!("cannot read {}: {err}", path.display()))
}

/// Trust a single PEM certificate.
///
/// # Example
///
/// ```ignore
/// use courier::tls::TrustCertificate;
///
/// TrustCertificate::new("/opt/nifi/conf/nifi-cert.pem").trust()?;
/// ```
#[derive(Debug, Clone)]
pub struct TrustCertificate {
    certificate: PathBuf,
}

impl TrustCertificate {
    /// Trust the certificate stored at `certificate`.
    pub fn new(certificate: impl Into<PathBuf>) -> Self {
        Self {
            certificate: certificate.into(),
        }
    }

    /// Build the client configuration without installing it.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let certificate = CertificateDer::from_pem_file(&self.certificate)
            .map_err(|err| pem_error(&self.certificate, &err))?;

        let mut roots = RootCertStore::empty();
        roots.add(certificate).map_err(|err| {
            Error::tls(format!("invalid certificate {}: {err}", self.certificate.display()))
        })?;

        Ok(ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth())
    }

    /// Install the trust process-wide.
    pub fn trust(&self) -> Result<()> {
        install(self.client_config()?, &self.certificate)
    }
}

/// Trust every certificate of a PEM bundle and authenticate with it.
///
/// The bundle's chain is presented as the client identity together with the
/// private key.
#[derive(Debug, Clone)]
pub struct TrustKeystore {
    bundle: PathBuf,
    key: PathBuf,
}

impl TrustKeystore {
    /// Use the certificates in `bundle` and the private key in `key`.
    ///
    /// Both may point to the same file.
    pub fn new(bundle: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            bundle: bundle.into(),
            key: key.into(),
        }
    }

    /// Build the client configuration without installing it.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let chain = CertificateDer::pem_file_iter(&self.bundle)
            .map_err(|err| pem_error(&self.bundle, &err))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| pem_error(&self.bundle, &err))?;
        if chain.is_empty() {
            return Err(Error::tls(format!(
                "no certificate found in {}",
                self.bundle.display()
            )));
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(chain.iter().cloned());
        if added == 0 {
            return Err(Error::tls(format!(
                "no valid certificate in {}",
                self.bundle.display()
            )));
        }
        if ignored > 0 {
            info!(bundle = %self.bundle.display(), ignored, "skipped unparsable certificates");
        }

        let key =
            PrivateKeyDer::from_pem_file(&self.key).map_err(|err| pem_error(&self.key, &err))?;

        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_client_auth_cert(chain, key)
            .map_err(|err| Error::tls(err.to_string()))
    }

    /// Install the trust process-wide.
    pub fn trust(&self) -> Result<()> {
        install(self.client_config()?, &self.bundle)
    }
}
