use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Client credentials as embedded in a kubeconfig user entry: base64-wrapped
/// PEM certificate and private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Credentials {
    pub client_certificate_data: String,
    pub client_key_data: String,
}

/// Exchanges a long-lived username/password for a short-lived client
/// certificate. Implementations other than Vault can be swapped in without
/// touching the refresh flow.
#[async_trait]
pub trait CredentialProvider {
    async fn exchange_username_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Credentials, AuthError>;
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues Kubernetes client certificates from a HashiCorp Vault PKI mount.
/// One login and one issuance call per exchange; the session token is used
/// once and discarded.
pub struct VaultProvider {
    client: Client,
    address: String,
    pki_mount: String,
    pki_role: String,
    common_name: String,
    ttl: String,
}

impl VaultProvider {
    pub fn new(
        address: String,
        pki_mount: String,
        pki_role: String,
        common_name: String,
        ttl: String,
    ) -> Self {
        VaultProvider {
            client: Client::new(),
            address,
            pki_mount,
            pki_role,
            common_name,
            ttl,
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .post(format!(
                "{}/v1/auth/userpass/login/{}",
                self.address, username
            ))
            .timeout(REQUEST_TIMEOUT)
            .json(&LoginRequest { password })
            .send()
            .await
            .map_err(|e| AuthError::AuthenticationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::AuthenticationFailed(format!(
                "login returned {}",
                response.status()
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::AuthenticationFailed(e.to_string()))?;

        body.auth
            .and_then(|auth| auth.client_token)
            .ok_or_else(|| {
                AuthError::AuthenticationFailed("login response contained no token".to_owned())
            })
    }

    async fn issue(&self, token: &str) -> Result<IssuedCertificate, AuthError> {
        let response = self
            .client
            .post(format!(
                "{}/v1/{}/issue/{}",
                self.address, self.pki_mount, self.pki_role
            ))
            .timeout(REQUEST_TIMEOUT)
            .header("X-Vault-Token", token)
            .json(&IssueRequest {
                common_name: &self.common_name,
                ttl: &self.ttl,
            })
            .send()
            .await
            .map_err(|e| AuthError::IssuanceFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::IssuanceFailed(format!(
                "issuance returned {}",
                response.status()
            )));
        }

        let body: IssueResponse = response
            .json()
            .await
            .map_err(|_| AuthError::MalformedIssuanceResponse)?;

        let data = body.data.ok_or(AuthError::MalformedIssuanceResponse)?;
        match (data.certificate, data.private_key) {
            (Some(certificate), Some(private_key)) => Ok(IssuedCertificate {
                certificate,
                private_key,
            }),
            _ => Err(AuthError::MalformedIssuanceResponse),
        }
    }
}

#[async_trait]
impl CredentialProvider for VaultProvider {
    async fn exchange_username_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Credentials, AuthError> {
        let token = self.login(username, password).await?;
        let issued = self.issue(&token).await?;

        Ok(Credentials {
            client_certificate_data: BASE64_STANDARD.encode(issued.certificate),
            client_key_data: BASE64_STANDARD.encode(issued.private_key),
        })
    }
}

struct IssuedCertificate {
    certificate: String,
    private_key: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
}

#[derive(Serialize)]
struct IssueRequest<'a> {
    common_name: &'a str,
    ttl: &'a str,
}

#[derive(Deserialize)]
struct IssueResponse {
    data: Option<IssueData>,
}

#[derive(Deserialize)]
struct IssueData {
    certificate: Option<String>,
    private_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(address: String) -> VaultProvider {
        VaultProvider::new(
            address,
            "pki/k8s".to_owned(),
            "kubernetes-admin".to_owned(),
            "kubernetes-admin".to_owned(),
            "5m".to_owned(),
        )
    }

    #[tokio::test]
    async fn exchanges_credentials_for_certificate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/userpass/login/operator"))
            .and(body_json(json!({"password": "hunter2"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"auth": {"client_token": "s.abc123"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/pki/k8s/issue/kubernetes-admin"))
            .and(header("X-Vault-Token", "s.abc123"))
            .and(body_json(json!({"common_name": "kubernetes-admin", "ttl": "5m"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"certificate": "X", "private_key": "Y"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let credentials = provider(server.uri())
            .exchange_username_password("operator", "hunter2")
            .await
            .expect("exchange");

        assert_eq!(credentials.client_certificate_data, BASE64_STANDARD.encode("X"));
        assert_eq!(credentials.client_key_data, BASE64_STANDARD.encode("Y"));
        server.verify().await;
    }

    #[tokio::test]
    async fn rejected_login_short_circuits_before_issuance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/userpass/login/operator"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({"errors": ["invalid username or password"]})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/pki/k8s/issue/kubernetes-admin"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .exchange_username_password("operator", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::AuthenticationFailed(_)));
        server.verify().await;
    }

    #[tokio::test]
    async fn login_response_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/userpass/login/operator"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"auth": null})))
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .exchange_username_password("operator", "hunter2")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn issuance_response_missing_key_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/userpass/login/operator"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"auth": {"client_token": "s.abc123"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/pki/k8s/issue/kubernetes-admin"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"certificate": "X"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .exchange_username_password("operator", "hunter2")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedIssuanceResponse));
        server.verify().await;
    }

    #[tokio::test]
    async fn failed_issuance_is_an_issuance_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/userpass/login/operator"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"auth": {"client_token": "s.abc123"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/pki/k8s/issue/kubernetes-admin"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"errors": ["unknown role"]})),
            )
            .mount(&server)
            .await;

        let err = provider(server.uri())
            .exchange_username_password("operator", "hunter2")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::IssuanceFailed(_)));
    }
}
