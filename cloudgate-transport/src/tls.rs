//! Peer certificate verification.
//!
//! Chain validation is delegated to webpki against the web PKI roots (plus an
//! optional PEM bundle); hostname matching uses the certificate's subject CN and
//! DNS subjectAltNames, where any name containing `*` is a wildcard pattern and
//! each `*` stands for one non-empty, dot-free run of characters.

use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;

use log::{debug, trace, warn};
use regex::Regex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::server::ParsedCertificate;
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, OtherError, RootCertStore,
    SignatureScheme,
};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::*;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};

/// Names a certificate vouches for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertIdentity {
    /// First subject common name, if any.
    pub common_name: Option<String>,
    /// DNS-type subjectAltName entries; empty when the extension is absent.
    pub alt_names: Vec<String>,
}

/// The leaf certificate could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("Certificate parsing failed: {0}")]
pub struct CertificateParseError(String);

impl CertIdentity {
    /// Build an identity from explicit names.
    pub fn new(common_name: Option<&str>, alt_names: &[&str]) -> Self {
        Self {
            common_name: common_name.map(String::from),
            alt_names: alt_names.iter().map(|name| (*name).to_string()).collect(),
        }
    }

    /// Extract CN and DNS alt names from a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> std::result::Result<Self, CertificateParseError> {
        let (_, cert) =
            X509Certificate::from_der(der).map_err(|e| CertificateParseError(e.to_string()))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(String::from);

        let alt_names = cert
            .subject_alternative_name()
            .ok()
            .flatten()
            .map(|ext| {
                ext.value
                    .general_names
                    .iter()
                    .filter_map(|name| match name {
                        GeneralName::DNSName(dns) => Some((*dns).to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            common_name,
            alt_names,
        })
    }
}

/// Whether `name` is a wildcard pattern.
pub fn is_wildcard_name(name: &str) -> bool {
    name.contains('*')
}

/// Translate a wildcard pattern into an anchored regex.
///
/// Literal parts are escaped; each `*` becomes `[^.]+`.
pub fn wildcard_to_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^.]+");
    Regex::new(&format!("^{body}$"))
}

/// Check `host` against the certificate identity.
///
/// Names are compared ASCII case-insensitively.
pub fn verify_hostname(host: &str, identity: &CertIdentity) -> bool {
    let host = host.to_ascii_lowercase();
    identity
        .common_name
        .iter()
        .chain(identity.alt_names.iter())
        .any(|name| name_matches(&host, &name.to_ascii_lowercase()))
}

fn name_matches(host: &str, name: &str) -> bool {
    if is_wildcard_name(name) {
        wildcard_to_regex(name).is_ok_and(|re| re.is_match(host))
    } else {
        host == name
    }
}

/// Reported through rustls when the chain is trusted but names don't match.
#[derive(Debug, thiserror::Error)]
#[error("certificate does not match host {host} (cn={common_name:?}, alt_names={alt_names:?})")]
pub struct HostnameMismatch {
    /// Host the client asked for.
    pub host: String,
    /// Certificate CN.
    pub common_name: Option<String>,
    /// Certificate DNS alt names.
    pub alt_names: Vec<String>,
}

/// rustls verifier: webpki chain validation plus [`verify_hostname`].
#[derive(Debug)]
pub struct HostnameVerifier {
    roots: RootCertStore,
    provider: Arc<CryptoProvider>,
}

impl HostnameVerifier {
    /// Verifier trusting `roots`, using `provider` for signature checks.
    pub fn new(roots: RootCertStore, provider: Arc<CryptoProvider>) -> Self {
        Self { roots, provider }
    }
}

impl ServerCertVerifier for HostnameVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let cert = ParsedCertificate::try_from(end_entity)?;
        verify_server_cert_signed_by_trust_anchor(
            &cert,
            &self.roots,
            intermediates,
            now,
            self.provider.signature_verification_algorithms.all,
        )?;
        trace!("[TLS] Chain verified, checking host name");

        let host = server_name.to_str();
        let identity = CertIdentity::from_der(end_entity.as_ref()).map_err(|e| {
            warn!("[TLS] {e}");
            rustls::Error::InvalidCertificate(CertificateError::BadEncoding)
        })?;

        if verify_hostname(&host, &identity) {
            Ok(ServerCertVerified::assertion())
        } else {
            warn!(
                "[TLS] Host {host} not in certificate (cn={:?}, alt_names={:?})",
                identity.common_name, identity.alt_names
            );
            Err(rustls::Error::InvalidCertificate(CertificateError::Other(
                OtherError(Arc::new(HostnameMismatch {
                    host: host.into_owned(),
                    common_name: identity.common_name,
                    alt_names: identity.alt_names,
                })),
            )))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Web PKI roots plus every certificate in `ca_bundle`.
pub(crate) fn root_store(ca_bundle: Option<&Path>) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(path) = ca_bundle {
        let bundle_error =
            |e: &dyn std::fmt::Display| Error::Configuration(format!("CA bundle {}: {e}", path.display()));

        let mut added = 0usize;
        for cert in CertificateDer::pem_file_iter(path).map_err(|e| bundle_error(&e))? {
            let cert = cert.map_err(|e| bundle_error(&e))?;
            roots.add(cert).map_err(|e| bundle_error(&e))?;
            added += 1;
        }
        debug!("[TLS] Loaded {added} trust root(s) from {}", path.display());
    }

    Ok(roots)
}

/// Client TLS configuration with the hostname verifier installed.
///
/// The CA bundle is read here, once per connection.
pub(crate) fn client_config(config: &ConnectionConfig) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let roots = root_store(config.effective_ca_bundle().as_deref())?;
    let verifier = Arc::new(HostnameVerifier::new(roots, Arc::clone(&provider)));

    let tls = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Configuration(format!("TLS setup failed: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    Ok(tls)
}

/// Find a rustls error anywhere in a source chain.
///
/// TLS failures surface wrapped in `io::Error`, whose `source()` skips the
/// wrapped error itself, so those are unwrapped explicitly.
pub(crate) fn find_tls_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(inner) = e
            .downcast_ref::<std::io::Error>()
            .and_then(std::io::Error::get_ref)
            && let Some(tls) = inner.downcast_ref::<rustls::Error>()
        {
            return Some(tls);
        }
        current = e.source();
    }
    None
}
