//! Commit history of a gCTS repository.
//!
//! Two read-only queries against the ABAP system:
//! - `getHistory`: transports applied to the repository, most recent first
//! - `getCommit`: commits known to the repository, newest first

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::debug;

use crate::config::RepositoryRef;
use crate::decode::{decode_json, ensure_success, Diagnostics};
use crate::error::Result;
use crate::transport::{HttpRequest, HttpSender};

/// One completed pull/deploy recorded by the ABAP system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportHistoryEntry {
    pub rid: String,
    /// `yyyymmddhhmmss` as an integer.
    pub checkout_time: i64,
    pub from_commit: String,
    pub to_commit: String,
    pub caller: String,
    pub request: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TransportHistoryEntry {
    /// `checkout_time` as a timestamp, if it is well formed.
    pub fn checked_out_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.checkout_time.to_string(), "%Y%m%d%H%M%S").ok()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryResponse {
    result: Vec<TransportHistoryEntry>,
    #[serde(flatten)]
    diagnostics: Diagnostics,
}

/// Fetch the transport history, most recent entry first.
pub async fn fetch_history(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
) -> Result<Vec<TransportHistoryEntry>> {
    let url = repo.action_url("getHistory");
    let response = sender.send(HttpRequest::get(&url)).await?;
    ensure_success(&response, &url)?;

    let body: HistoryResponse = decode_json(&response)?;
    debug!(
        repository = %repo.repository,
        entries = body.result.len(),
        errors = body.diagnostics.error_log.len(),
        "fetched transport history"
    );
    Ok(body.result)
}

/// A commit as listed by the ABAP system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommitRecord {
    pub id: String,
    pub author: Option<String>,
    pub author_mail: Option<String>,
    pub message: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommitListResponse {
    commits: Vec<CommitRecord>,
}

/// Fetch the commit list of the repository's remote, newest first.
pub async fn fetch_commits(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
) -> Result<Vec<CommitRecord>> {
    let url = repo.action_url("getCommit");
    let response = sender.send(HttpRequest::get(&url)).await?;
    ensure_success(&response, &url)?;

    let body: CommitListResponse = decode_json(&response)?;
    debug!(
        repository = %repo.repository,
        commits = body.commits.len(),
        "fetched commit list"
    );
    Ok(body.commits)
}
