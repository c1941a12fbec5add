//! Commit status lookups on a code-hosting provider.
//!
//! When a repository's remote lives on a recognized provider, the rollback
//! target is the newest commit whose combined build/check status is
//! `success`. Statuses are read once at query time, never polled.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::decode::{decode_json, ensure_success};
use crate::error::{GctsError, Result};
use crate::history::CommitRecord;
use crate::observer::GctsObserver;
use crate::transport::{HttpRequest, HttpSender};

/// Status state that marks a commit as a valid rollback target.
pub const SUCCESS_STATE: &str = "success";

/// A recognized code-hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostingProvider {
    GitHub,
}

impl HostingProvider {
    pub const ALL: [HostingProvider; 1] = [HostingProvider::GitHub];

    /// Host name of the web/git remote.
    pub fn domain(&self) -> &'static str {
        match self {
            HostingProvider::GitHub => "github.com",
        }
    }

    /// Base URL of the provider's REST API.
    pub fn api_base(&self) -> &'static str {
        match self {
            HostingProvider::GitHub => "https://api.github.com",
        }
    }

    /// Provider whose domain equals `host` exactly.
    pub fn from_host(host: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|provider| host.eq_ignore_ascii_case(provider.domain()))
    }
}

impl std::fmt::Display for HostingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.domain())
    }
}

/// A repository on a hosting provider, e.g. `github.com/octo/abap-demo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRepository {
    pub provider: HostingProvider,
    /// `owner/name`, without leading slash or `.git` suffix.
    pub path: String,
}

impl HostedRepository {
    /// Recognize `remote_url` as a provider repository.
    ///
    /// Accepts URL remotes (`https://`, `ssh://`, ...) and scp-like remotes
    /// (`git@github.com:owner/name.git`). Returns `Ok(None)` for an empty URL
    /// or a host no provider claims, and an error when the URL cannot be
    /// parsed at all.
    pub fn from_remote_url(remote_url: &str) -> Result<Option<Self>> {
        let remote_url = remote_url.trim();
        if remote_url.is_empty() {
            return Ok(None);
        }

        let parsed = match scp_like_to_ssh(remote_url) {
            Some(ssh_url) => Url::parse(&ssh_url)?,
            None => Url::parse(remote_url)?,
        };
        let Some(provider) = parsed.host_str().and_then(HostingProvider::from_host) else {
            return Ok(None);
        };

        let path = parsed.path().trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        if path.is_empty() {
            return Err(GctsError::Config(format!(
                "remote url {remote_url} does not name a repository"
            )));
        }

        Ok(Some(HostedRepository {
            provider,
            path: path.to_string(),
        }))
    }

    /// Combined status endpoint for one commit.
    pub fn status_url(&self, commit: &str) -> String {
        format!(
            "{}/repos/{}/commits/{}/status",
            self.provider.api_base(),
            self.path,
            commit
        )
    }
}

/// Rewrite `[user@]host:path` as `ssh://[user@]host/path`.
///
/// Anything with a scheme, or without a `host:` part, is left alone.
fn scp_like_to_ssh(remote_url: &str) -> Option<String> {
    if remote_url.contains("://") {
        return None;
    }
    let (authority, path) = remote_url.split_once(':')?;
    if authority.is_empty() || authority.contains('/') || path.is_empty() {
        return None;
    }
    Some(format!("ssh://{authority}/{}", path.trim_start_matches('/')))
}

/// Combined status of one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommitStatus {
    pub state: String,
    pub sha: String,
}

impl CommitStatus {
    pub fn is_success(&self) -> bool {
        self.state == SUCCESS_STATE
    }
}

/// Query the combined status of `commit`.
pub async fn fetch_commit_status(
    sender: &dyn HttpSender,
    repository: &HostedRepository,
    commit: &str,
    token: Option<&str>,
) -> Result<CommitStatus> {
    let url = repository.status_url(commit);
    let mut request = HttpRequest::get(&url).header("Accept", "application/vnd.github+json");
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        request = request.header("Authorization", &format!("token {token}"));
    }

    let response = sender.send(request).await?;
    ensure_success(&response, &url)?;
    decode_json(&response)
}

/// Return the first commit in `commits` whose status is `success`.
///
/// `commits` is expected newest first. Probing stops at the first success;
/// any failed status query aborts the scan.
pub async fn find_last_successful_commit(
    sender: &dyn HttpSender,
    repository: &HostedRepository,
    commits: &[CommitRecord],
    token: Option<&str>,
    observer: &dyn GctsObserver,
) -> Result<String> {
    for commit in commits {
        let status = fetch_commit_status(sender, repository, &commit.id, token).await?;
        observer.commit_status_observed(&commit.id, &status.state);
        if status.is_success() {
            return Ok(commit.id.clone());
        }
        debug!(commit = %commit.id, state = %status.state, "skipping commit");
    }

    Err(GctsError::NoSuccessfulCommit {
        provider: repository.provider.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedSender;
    use crate::observer::NoopObserver;

    fn hosted() -> HostedRepository {
        HostedRepository {
            provider: HostingProvider::GitHub,
            path: "octo/abap-demo".to_string(),
        }
    }

    fn commits(ids: &[&str]) -> Vec<CommitRecord> {
        ids.iter()
            .map(|id| CommitRecord {
                id: id.to_string(),
                ..CommitRecord::default()
            })
            .collect()
    }

    #[test]
    fn test_github_https_url_is_recognized() {
        let repo = HostedRepository::from_remote_url("https://github.com/octo/abap-demo.git")
            .unwrap()
            .unwrap();
        assert_eq!(repo.provider, HostingProvider::GitHub);
        assert_eq!(repo.path, "octo/abap-demo");
        assert_eq!(
            repo.status_url("c1"),
            "https://api.github.com/repos/octo/abap-demo/commits/c1/status"
        );
    }

    #[test]
    fn test_scp_like_remote_is_recognized() {
        let repo = HostedRepository::from_remote_url("git@github.com:octo/abap-demo.git")
            .unwrap()
            .unwrap();
        assert_eq!(repo.provider, HostingProvider::GitHub);
        assert_eq!(repo.path, "octo/abap-demo");
    }

    #[test]
    fn test_ssh_url_remote_is_recognized() {
        let repo = HostedRepository::from_remote_url("ssh://git@github.com/octo/abap-demo.git")
            .unwrap()
            .unwrap();
        assert_eq!(repo.provider, HostingProvider::GitHub);
        assert_eq!(repo.path, "octo/abap-demo");
    }

    #[test]
    fn test_scp_like_remote_on_other_host_is_not_a_provider() {
        assert!(
            HostedRepository::from_remote_url("git@git.example.com:octo/abap-demo.git")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_other_hosts_are_not_providers() {
        assert!(
            HostedRepository::from_remote_url("https://gitlab.example.com/octo/abap-demo.git")
                .unwrap()
                .is_none()
        );
        // Exact domain match only.
        assert!(
            HostedRepository::from_remote_url("https://github.com.evil.example/octo/x")
                .unwrap()
                .is_none()
        );
        assert!(HostedRepository::from_remote_url("").unwrap().is_none());
    }

    #[test]
    fn test_unparsable_url_is_an_error() {
        let err = HostedRepository::from_remote_url("not a url").unwrap_err();
        assert!(matches!(err, GctsError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_scan_stops_at_first_success() {
        let sender = ScriptedSender::new()
            .respond(200, r#"{"state": "failure"}"#)
            .respond(200, r#"{"state": "success"}"#)
            .respond(200, r#"{"state": "success"}"#);

        let found = find_last_successful_commit(
            &sender,
            &hosted(),
            &commits(&["c1", "c2", "c3"]),
            None,
            &NoopObserver,
        )
        .await
        .unwrap();

        assert_eq!(found, "c2");
        assert_eq!(sender.call_count(), 2);
        assert!(sender.requests()[1].url.ends_with("/commits/c2/status"));
    }

    #[tokio::test]
    async fn test_scan_exhausted_fails() {
        let sender = ScriptedSender::new()
            .respond(200, r#"{"state": "pending"}"#)
            .respond(200, r#"{"state": "failure"}"#);

        let err = find_last_successful_commit(
            &sender,
            &hosted(),
            &commits(&["c1", "c2"]),
            None,
            &NoopObserver,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GctsError::NoSuccessfulCommit { .. }));
    }

    #[tokio::test]
    async fn test_scan_aborts_on_failed_status_query() {
        let sender = ScriptedSender::new()
            .respond(404, r#"{"message": "Not Found"}"#)
            .respond(200, r#"{"state": "success"}"#);

        let err = find_last_successful_commit(
            &sender,
            &hosted(),
            &commits(&["c1", "c2"]),
            None,
            &NoopObserver,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GctsError::Http { status: 404, .. }));
        assert_eq!(sender.call_count(), 1);
    }

    #[tokio::test]
    async fn test_status_query_sends_token() {
        let sender = ScriptedSender::new().respond(200, r#"{"state": "success"}"#);
        fetch_commit_status(&sender, &hosted(), "c1", Some("ghp_abc"))
            .await
            .unwrap();
        assert_eq!(
            sender.requests()[0].header_value("authorization"),
            Some("token ghp_abc")
        );
    }
}
