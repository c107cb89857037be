use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Wrapper settings, loaded from a YAML file (`~/.krenew.yaml` by default;
/// the path comes in from the CLI so tests can point elsewhere).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub vault_address: String,
    pub vault_username: String,
    pub vault_password: String,
    pub vault_pki_role: String,
    pub vault_pki_mount: String,
    pub kubernetes_pki_ttl: String,
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(Error::Parse)
    }
}
