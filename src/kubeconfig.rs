use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::vault::Credentials;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub cluster: ClusterDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub context: ContextDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDetail {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub user: Credentials,
}

/// In-memory form of a `~/.kube/config` file. Field names mirror kubectl's
/// own reader, so a rewritten file stays loadable by the wrapped command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub current_context: String,
    // A freshly initialized kubeconfig may omit any of the entry lists;
    // resolution reports the missing entry rather than the parser.
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub users: Vec<User>,
    /// Opaque slot kubectl owns, carried through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<serde_yaml::Value>,
}

impl KubeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Error> {
        serde_yaml::from_str(contents).map_err(Error::Parse)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).map_err(Error::Serialize)
    }

    /// Rewrites the file in full, replacing the prior content. No locking:
    /// a second krenew racing on the same path may lose its update.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn current_context(&self) -> Result<&Context, Error> {
        self.contexts
            .iter()
            .find(|context| context.name == self.current_context)
            .ok_or_else(|| Error::ContextNotFound(self.current_context.clone()))
    }

    /// Position of the named user, kept so a refreshed credential can be
    /// spliced back into the same slot.
    pub fn user_index(&self, name: &str) -> Result<usize, Error> {
        self.users
            .iter()
            .position(|user| user.name == name)
            .ok_or_else(|| Error::UserNotFound(name.to_owned()))
    }
}
