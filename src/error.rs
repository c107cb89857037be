use thiserror::Error;

/// Errors terminating a krenew invocation. None of these are recoverable:
/// the wrapped command is never launched once any of them surfaces.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration parse error: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("configuration serialize error: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("current-context {0:?} does not match any context in the kubeconfig")]
    ContextNotFound(String),
    #[error("context references user {0:?} which does not exist in the kubeconfig")]
    UserNotFound(String),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("failed to run {command}: {source}")]
    CommandExec {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("client certificate data is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("could not find any PEM data in client certificate")]
    NoPemBlock,
    #[error("malformed X.509 certificate: {0}")]
    MalformedCertificate(String),
}

#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Vault username/password login failed: {0}")]
    AuthenticationFailed(String),
    #[error("Vault certificate issuance failed: {0}")]
    IssuanceFailed(String),
    #[error("Vault issuance response is missing the certificate or private key")]
    MalformedIssuanceResponse,
}
