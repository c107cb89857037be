use std::path::Path;

use chrono::{DateTime, Utc};

use crate::certificate;
use crate::error::Error;
use crate::kubeconfig::KubeConfig;
use crate::vault::CredentialProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The active certificate has not expired; nothing was touched.
    StillValid,
    /// A fresh certificate was obtained and spliced into the kubeconfig.
    Refreshed,
}

/// Loads the kubeconfig, refreshes the active user's certificate if it has
/// expired, and persists the result. Persistence only happens on a refresh;
/// any failure along the way is fatal so a half-done refresh never reaches
/// the wrapped command.
pub async fn run<F>(
    kubeconfig_path: &Path,
    vault_username: &str,
    vault_password: &str,
    provider_for: F,
) -> Result<RefreshOutcome, Error>
where
    F: FnOnce(&str) -> Box<dyn CredentialProvider>,
{
    let mut config = KubeConfig::from_file(kubeconfig_path)?;
    let outcome = refresh_user(
        &mut config,
        Utc::now(),
        vault_username,
        vault_password,
        provider_for,
    )
    .await?;

    if outcome == RefreshOutcome::Refreshed {
        config.save_to(kubeconfig_path)?;
    }

    Ok(outcome)
}

/// In-memory refresh step. Resolves the active context and user, inspects
/// the user's certificate, and on expiry exchanges the Vault operator
/// credentials for a new one. `provider_for` receives the resolved user
/// name, which becomes the certificate common name.
pub async fn refresh_user<F>(
    config: &mut KubeConfig,
    now: DateTime<Utc>,
    vault_username: &str,
    vault_password: &str,
    provider_for: F,
) -> Result<RefreshOutcome, Error>
where
    F: FnOnce(&str) -> Box<dyn CredentialProvider>,
{
    let user_name = config.current_context()?.context.user.clone();
    let user_index = config.user_index(&user_name)?;

    // An undecodable certificate is fatal: its validity cannot be assumed
    // either way.
    let current = certificate::decode(&config.users[user_index].user.client_certificate_data)?;
    if !current.has_expired_at(now) {
        return Ok(RefreshOutcome::StillValid);
    }

    let provider = provider_for(&user_name);
    let credentials = provider
        .exchange_username_password(vault_username, vault_password)
        .await?;

    config.users[user_index].user = credentials;
    Ok(RefreshOutcome::Refreshed)
}
