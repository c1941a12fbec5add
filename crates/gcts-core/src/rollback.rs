//! Rollback target resolution.
//!
//! Exactly one strategy is chosen up front, in this order of precedence:
//!
//! 1. an explicit commit given by the caller, returned without any request;
//! 2. when the repository's remote lives on a recognized hosting provider,
//!    the newest commit whose provider status is `success`;
//! 3. otherwise the `fromCommit` of the most recent transport history entry.
//!
//! A failure inside the chosen strategy is final; the next strategy is never
//! tried as a fallback.

use tracing::info;

use crate::config::{Credentials, RepositoryRef};
use crate::deploy::{DeployArgs, DeployInvoker};
use crate::error::{GctsError, Result};
use crate::history::{fetch_commits, fetch_history};
use crate::hosting::{find_last_successful_commit, HostedRepository};
use crate::observer::{GctsObserver, TracingObserver};
use crate::repository::fetch_repository;
use crate::transport::HttpSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackStrategy {
    /// Commit supplied by the caller.
    Explicit,
    /// First commit with a successful status on the hosting provider.
    CommitStatus,
    /// `fromCommit` of the latest transport.
    History,
}

impl std::fmt::Display for RollbackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RollbackStrategy::Explicit => "explicit",
            RollbackStrategy::CommitStatus => "commit_status",
            RollbackStrategy::History => "history",
        };
        f.write_str(name)
    }
}

/// A resolved rollback target and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub commit: String,
    pub strategy: RollbackStrategy,
}

/// Resolves rollback targets for gCTS repositories.
pub struct RollbackResolver<'a> {
    abap: &'a dyn HttpSender,
    provider: &'a dyn HttpSender,
    provider_token: Option<String>,
    observer: &'a dyn GctsObserver,
}

impl<'a> RollbackResolver<'a> {
    /// `abap` talks to the ABAP system, `provider` to the hosting provider's API.
    pub fn new(abap: &'a dyn HttpSender, provider: &'a dyn HttpSender) -> Self {
        RollbackResolver {
            abap,
            provider,
            provider_token: None,
            observer: &TracingObserver,
        }
    }

    /// Token sent with hosting-provider status queries.
    pub fn with_provider_token(mut self, token: Option<String>) -> Self {
        self.provider_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn GctsObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Determine the commit `repo` should be rolled back to.
    pub async fn resolve(
        &self,
        repo: &RepositoryRef,
        explicit_commit: Option<&str>,
    ) -> Result<ResolvedTarget> {
        if let Some(commit) = explicit_commit.filter(|c| !c.is_empty()) {
            self.observer
                .strategy_selected(&repo.repository, RollbackStrategy::Explicit);
            return Ok(self.resolved(repo, commit, RollbackStrategy::Explicit));
        }

        let descriptor = fetch_repository(self.abap, repo).await?;
        match HostedRepository::from_remote_url(&descriptor.url)? {
            Some(hosted) => {
                self.observer
                    .strategy_selected(&repo.repository, RollbackStrategy::CommitStatus);
                let commits = fetch_commits(self.abap, repo).await?;
                let commit = find_last_successful_commit(
                    self.provider,
                    &hosted,
                    &commits,
                    self.provider_token.as_deref(),
                    self.observer,
                )
                .await?;
                Ok(self.resolved(repo, &commit, RollbackStrategy::CommitStatus))
            }
            None => {
                self.observer
                    .strategy_selected(&repo.repository, RollbackStrategy::History);
                let history = fetch_history(self.abap, repo).await?;
                let commit = history
                    .first()
                    .map(|entry| entry.from_commit.as_str())
                    .filter(|commit| !commit.is_empty())
                    .ok_or(GctsError::NoRollbackCommit)?;
                Ok(self.resolved(repo, commit, RollbackStrategy::History))
            }
        }
    }

    /// Resolve the target, then deploy it through `deployer`.
    ///
    /// A deploy failure is reported as [`GctsError::DeployFailed`], never as a
    /// resolution error.
    pub async fn rollback(
        &self,
        repo: &RepositoryRef,
        credentials: &Credentials,
        explicit_commit: Option<&str>,
        deployer: &dyn DeployInvoker,
    ) -> Result<ResolvedTarget> {
        let target = self.resolve(repo, explicit_commit).await?;

        let args = DeployArgs::new(repo, credentials, &target.commit);
        deployer.deploy(&args).await.map_err(|e| match e {
            GctsError::DeployFailed(_) => e,
            other => GctsError::DeployFailed(other.to_string()),
        })?;

        info!(
            repository = %repo.repository,
            commit = %target.commit,
            "rollback was successful"
        );
        Ok(target)
    }

    fn resolved(
        &self,
        repo: &RepositoryRef,
        commit: &str,
        strategy: RollbackStrategy,
    ) -> ResolvedTarget {
        self.observer
            .commit_resolved(&repo.repository, commit, strategy);
        ResolvedTarget {
            commit: commit.to_string(),
            strategy,
        }
    }
}
