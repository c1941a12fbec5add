//! Deploying a commit to the local repository.
//!
//! [`deploy_commit`] is the `pullByCommit` call itself. The rollback flow does
//! not call it directly: it hands the resolved commit to a [`DeployInvoker`],
//! which by default re-invokes the `gcts deploy-commit` executable.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{Credentials, RepositoryRef};
use crate::decode::{decode_json, ensure_success, Diagnostics};
use crate::error::{GctsError, Result};
use crate::transport::{HttpRequest, HttpSender};

/// What the ABAP system reports after a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeployOutcome {
    /// Transport request that recorded the pull.
    pub trkorr: String,
    pub from_commit: String,
    pub to_commit: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeployResponse {
    #[serde(flatten)]
    outcome: DeployOutcome,
    #[serde(flatten)]
    diagnostics: Diagnostics,
}

/// Pull `commit` into the local repository, or the remote head when `None`.
pub async fn deploy_commit(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
    commit: Option<&str>,
) -> Result<DeployOutcome> {
    let mut url = repo.action_url("pullByCommit");
    if let Some(commit) = commit.filter(|c| !c.is_empty()) {
        url.push_str("&request=");
        url.push_str(commit);
    }

    let response = sender.send(HttpRequest::get(&url)).await?;
    ensure_success(&response, &url)?;

    let outcome = match decode_json::<DeployResponse>(&response) {
        Ok(body) => {
            for entry in &body.diagnostics.error_log {
                warn!(code = %entry.code, message = %entry.message, "pull reported an error log entry");
            }
            body.outcome
        }
        Err(e) => {
            warn!(error = %e, "could not decode pullByCommit response");
            DeployOutcome::default()
        }
    };

    info!(
        repository = %repo.repository,
        to_commit = %outcome.to_commit,
        from_commit = %outcome.from_commit,
        "successfully deployed commit"
    );
    Ok(outcome)
}

/// Named arguments of a deploy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployArgs {
    pub repo: RepositoryRef,
    pub credentials: Credentials,
    pub commit: String,
}

impl DeployArgs {
    pub fn new(repo: &RepositoryRef, credentials: &Credentials, commit: &str) -> Self {
        DeployArgs {
            repo: repo.clone(),
            credentials: credentials.clone(),
            commit: commit.to_string(),
        }
    }

    /// Argument list for the `deploy-commit` subcommand.
    pub fn to_cli_args(&self) -> Vec<String> {
        vec![
            "deploy-commit".to_string(),
            "--username".to_string(),
            self.credentials.username.clone(),
            "--password".to_string(),
            self.credentials.password.clone(),
            "--host".to_string(),
            self.repo.host.clone(),
            "--client".to_string(),
            self.repo.client.clone(),
            "--repository".to_string(),
            self.repo.repository.clone(),
            "--commit".to_string(),
            self.commit.clone(),
        ]
    }
}

/// Carries out the deploy of a resolved commit.
#[async_trait]
pub trait DeployInvoker: Send + Sync {
    async fn deploy(&self, args: &DeployArgs) -> Result<()>;
}

/// Runs `<executable> deploy-commit ...` as a child process.
#[derive(Debug, Clone)]
pub struct ProcessDeployer {
    executable: PathBuf,
}

impl ProcessDeployer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        ProcessDeployer {
            executable: executable.into(),
        }
    }

    /// Re-invoke the currently running executable.
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    pub fn executable(&self) -> &std::path::Path {
        &self.executable
    }
}

#[async_trait]
impl DeployInvoker for ProcessDeployer {
    async fn deploy(&self, args: &DeployArgs) -> Result<()> {
        debug!(executable = %self.executable.display(), commit = %args.commit, "invoking deploy");

        let output = Command::new(&self.executable)
            .args(args.to_cli_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                GctsError::DeployFailed(format!(
                    "failed to run {}: {e}",
                    self.executable.display()
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            info!(target: "gcts::deploy", "{}", line);
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(GctsError::DeployFailed(format!(
                "{} ({})",
                output.status,
                stderr.trim()
            )))
        }
    }
}

/// Deploys in-process through an [`HttpSender`] that is already authenticated.
pub struct SenderDeployer<'a> {
    sender: &'a dyn HttpSender,
}

impl<'a> SenderDeployer<'a> {
    pub fn new(sender: &'a dyn HttpSender) -> Self {
        SenderDeployer { sender }
    }
}

#[async_trait]
impl DeployInvoker for SenderDeployer<'_> {
    async fn deploy(&self, args: &DeployArgs) -> Result<()> {
        deploy_commit(self.sender, &args.repo, Some(&args.commit))
            .await
            .map(|_| ())
            .map_err(|e| GctsError::DeployFailed(e.to_string()))
    }
}
