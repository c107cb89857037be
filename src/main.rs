extern crate async_trait;
extern crate base64;
extern crate chrono;
extern crate clap;
extern crate home;
extern crate reqwest;
extern crate serde;
extern crate serde_json;
extern crate serde_yaml;
extern crate thiserror;
extern crate tokio;
extern crate x509_parser;

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

mod certificate;
mod error;
mod kubeconfig;
mod kubernetes;
mod refresh;
mod settings;
mod vault;

use error::Error;
use kubernetes::{get_default_kubeconfig, get_default_settings};
use refresh::RefreshOutcome;
use settings::Settings;
use vault::VaultProvider;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, env, default_value = get_default_kubeconfig().into_os_string())]
    kubeconfig: PathBuf,

    #[clap(long, env = "KRENEW_CONFIG", default_value = get_default_settings().into_os_string())]
    config: PathBuf,

    /// Command to execute once credentials are fresh.
    #[clap(long, default_value = "kubectl")]
    executable: String,

    /// Arguments forwarded verbatim to the wrapped command.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    arguments: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()
        .unwrap()
        .block_on(run(cli));

    match result {
        Ok(code) => exit(code),
        Err(err) => {
            eprintln!("krenew: {err}");
            exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32, Error> {
    let settings = Settings::from_file(&cli.config)?;

    let outcome = refresh::run(
        &cli.kubeconfig,
        &settings.vault_username,
        &settings.vault_password,
        |common_name| {
            Box::new(VaultProvider::new(
                settings.vault_address.clone(),
                settings.vault_pki_mount.clone(),
                settings.vault_pki_role.clone(),
                common_name.to_owned(),
                settings.kubernetes_pki_ttl.clone(),
            ))
        },
    )
    .await?;

    match outcome {
        RefreshOutcome::Refreshed => eprintln!("[krenew] Refreshed Kubernetes credentials"),
        RefreshOutcome::StillValid => {
            eprintln!("[krenew] Current Kubernetes credentials are still valid")
        }
    }

    // The refreshed kubeconfig is on disk before the wrapped command starts.
    let status = tokio::process::Command::new(&cli.executable)
        .args(&cli.arguments)
        .status()
        .await
        .map_err(|source| Error::CommandExec {
            command: cli.executable.clone(),
            source,
        })?;

    Ok(status.code().unwrap_or(1))
}
