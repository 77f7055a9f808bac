use std::{fs, path::PathBuf};

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use intent_dispatch::types::{fingerprint, FingerprintDomain, Intent};
use intent_signer::{address_of, signing_key_from_hex};
use tracing_subscriber::EnvFilter;

mod report;
mod scenario;

/// Well-known development keys; never use them for anything of value.
const DEV_CONTROLLER_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_OTHER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

/// Local simulator and tooling for the intent dispatcher.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a JSON scenario against a fresh local host and write a report.
    Simulate {
        /// Scenario file (dispatcher config, funding, batches).
        #[arg(long)]
        scenario: PathBuf,

        /// Where to write the JSON report.
        #[arg(long, default_value = "simulation-report.json")]
        report: PathBuf,

        /// Controller private key (hex string, 0x...).
        #[arg(long, env = "CONTROLLER_KEY")]
        controller_key: Option<String>,

        /// Key used for intents marked `"signer": "other"`.
        #[arg(long, env = "OTHER_KEY")]
        other_key: Option<String>,
    },
    /// Print the fingerprint of an intent read from a JSON file.
    Fingerprint {
        #[arg(long)]
        intent: PathBuf,

        /// Bind to this dispatcher (requires --chain-id).
        #[arg(long, requires = "chain_id")]
        dispatcher: Option<Address>,

        #[arg(long, requires = "dispatcher")]
        chain_id: Option<u64>,
    },
    /// Print the controller address of a private key.
    Address {
        #[arg(long, env = "CONTROLLER_KEY")]
        key: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Simulate {
            scenario,
            report,
            controller_key,
            other_key,
        } => simulate(scenario, report, controller_key, other_key),
        Command::Fingerprint {
            intent: intent_path,
            dispatcher,
            chain_id,
        } => {
            let raw = fs::read_to_string(&intent_path)
                .with_context(|| format!("failed reading {}", intent_path.display()))?;
            let intent: Intent = serde_json::from_str(&raw).with_context(|| {
                format!("failed parsing intent JSON in {}", intent_path.display())
            })?;
            let domain = match (dispatcher, chain_id) {
                (Some(dispatcher), Some(chain_id)) => Some(FingerprintDomain {
                    dispatcher,
                    chain_id,
                }),
                _ => None,
            };
            println!("{}", fingerprint(&intent, domain.as_ref()));
            Ok(())
        }
        Command::Address { key } => {
            let key = signing_key_from_hex(&key).context("invalid private key")?;
            println!("{}", address_of(&key));
            Ok(())
        }
    }
}

fn simulate(
    scenario_path: PathBuf,
    report_path: PathBuf,
    controller_key: Option<String>,
    other_key: Option<String>,
) -> Result<()> {
    let raw = fs::read_to_string(&scenario_path)
        .with_context(|| format!("failed reading {}", scenario_path.display()))?;
    let scenario: scenario::Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing scenario JSON in {}", scenario_path.display()))?;
    if scenario.batches.is_empty() {
        bail!("scenario {} has no batches", scenario_path.display());
    }

    let controller_key = controller_key.unwrap_or_else(|| {
        tracing::warn!("no controller key given, using the development key");
        DEV_CONTROLLER_KEY.to_string()
    });
    let other_key = other_key.unwrap_or_else(|| DEV_OTHER_KEY.to_string());
    let keys = scenario::Keys {
        controller: signing_key_from_hex(&controller_key).context("invalid controller key")?,
        other: signing_key_from_hex(&other_key).context("invalid other key")?,
    };

    let report = scenario::run(&scenario, &keys)?;
    report::write_json_atomic(&report_path, &report)?;

    let committed = report.batches.iter().filter(|b| b.committed).count();
    println!(
        "Ran {} batches ({} committed); report written to {}",
        report.batches.len(),
        committed,
        report_path.display()
    );
    Ok(())
}
