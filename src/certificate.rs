use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::ParsedExtension;

use crate::error::CertificateError;

/// Structural summary of a decoded client certificate. No chain or
/// signature validation happens here; kubectl does its own TLS handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub common_name: String,
    pub issuer: String,
    pub is_ca: bool,
    pub not_after: DateTime<Utc>,
}

impl ClientCertificate {
    /// A certificate is considered expired from the exact `not_after`
    /// instant onwards.
    pub fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.not_after
    }
}

/// Decodes a base64-wrapped PEM certificate, as stored under
/// `client-certificate-data` in a kubeconfig.
pub fn decode(b64_pem: &str) -> Result<ClientCertificate, CertificateError> {
    let pem_bytes = BASE64_STANDARD.decode(b64_pem)?;

    let (_, pem) = parse_x509_pem(&pem_bytes).map_err(|_| CertificateError::NoPemBlock)?;
    let (_, certificate) = parse_x509_certificate(&pem.contents)
        .map_err(|e| CertificateError::MalformedCertificate(e.to_string()))?;

    let not_after = Utc
        .timestamp_opt(certificate.validity().not_after.timestamp(), 0)
        .single()
        .ok_or_else(|| {
            CertificateError::MalformedCertificate("validity period out of range".to_owned())
        })?;

    let common_name = certificate
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_owned();

    let is_ca = certificate
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => Some(bc.ca),
            _ => None,
        })
        .unwrap_or(false);

    Ok(ClientCertificate {
        common_name,
        issuer: certificate.issuer().to_string(),
        is_ca,
        not_after,
    })
}
