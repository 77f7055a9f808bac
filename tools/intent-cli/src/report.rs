use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::{Context, Result};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_at: String,
    pub chain_id: u64,
    pub dispatcher: Address,
    pub account: Address,
    pub controller: Address,
    pub batches: Vec<BatchReport>,
    #[serde(rename = "final")]
    pub final_state: FinalState,
}

impl Report {
    pub fn new(
        chain_id: u64,
        dispatcher: Address,
        account: Address,
        controller: Address,
        batches: Vec<BatchReport>,
        final_state: FinalState,
    ) -> Self {
        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            generated_at,
            chain_id,
            dispatcher,
            account,
            controller,
            batches,
            final_state,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub index: usize,
    /// False when the whole batch reverted.
    pub committed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub intents: Vec<IntentReport>,
}

#[derive(Debug, Serialize)]
pub struct IntentReport {
    pub fingerprint: B256,
    pub sequence: U256,
    pub executed: bool,
    /// Action output when executed, revert payload otherwise.
    pub output: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FinalState {
    pub sequence: U256,
    pub controller: Address,
    pub resource_balance: U256,
    pub vault_shares: U256,
    pub vault_allowance: U256,
}

/// Write `value` as pretty JSON through a sibling temp file, so readers never see a partial file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising report JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
