//! Repository-level calls: descriptor lookup, create and clone.
//!
//! Create and clone translate one documented "already done" answer of the
//! ABAP system into a successful no-op instead of an error.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RepositoryRef;
use crate::decode::{decode_json, ensure_success, Diagnostics};
use crate::error::{GctsError, Result};
use crate::transport::{HttpRequest, HttpSender};

/// `errorLog` code reported when the repository is already cloned.
pub const ALREADY_CLONED_CODE: &str = "GCTS.CLIENT.1420";

/// `exception` text reported when the repository already exists.
pub const ALREADY_EXISTS_EXCEPTION: &str = "Repository already exists";

/// One key/value of a repository's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfigEntry {
    pub key: String,
    pub value: String,
    pub category: String,
}

/// Remote repository descriptor as stored on the ABAP system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryDescriptor {
    pub rid: String,
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub vsid: String,
    pub status: String,
    pub branch: String,
    /// URL of the remote git repository.
    pub url: String,
    pub current_commit: String,
    pub config: Vec<RepositoryConfigEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DescriptorResponse {
    result: RepositoryDescriptor,
}

/// Fetch the descriptor of `repo`.
pub async fn fetch_repository(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
) -> Result<RepositoryDescriptor> {
    let url = repo.repository_url();
    let response = sender.send(HttpRequest::get(&url)).await?;
    ensure_success(&response, &url)?;

    let body: DescriptorResponse = decode_json(&response)?;
    Ok(body.result)
}

/// Parameters for creating a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    /// `SOURCE` or `TARGET`.
    pub role: String,
    /// Repository type, e.g. `GIT`.
    pub kind: String,
    /// Virtual SID of the transport layer.
    pub vsid: String,
    /// URL of the remote git repository.
    pub remote_url: String,
}

impl Default for CreateOptions {
    fn default() -> Self {
        CreateOptions {
            role: "SOURCE".to_string(),
            kind: "GIT".to_string(),
            vsid: String::new(),
            remote_url: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    repository: &'a str,
    data: CreateData<'a>,
}

#[derive(Debug, Serialize)]
struct CreateData<'a> {
    rid: &'a str,
    name: &'a str,
    role: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    vsid: &'a str,
    url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateResponse {
    #[serde(flatten)]
    diagnostics: Diagnostics,
}

impl CreateResponse {
    fn exception_message(&self) -> Option<&str> {
        self.diagnostics
            .exception
            .as_ref()
            .map(|exception| exception.message.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Create `repo` on the ABAP system.
pub async fn create_repository(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
    options: &CreateOptions,
) -> Result<CreateOutcome> {
    let payload = CreateRequest {
        repository: &repo.repository,
        data: CreateData {
            rid: &repo.repository,
            name: &repo.repository,
            role: &options.role,
            kind: &options.kind,
            vsid: &options.vsid,
            url: &options.remote_url,
        },
    };

    let url = repo.repositories_url();
    let request = HttpRequest::post(&url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .body(serde_json::to_vec(&payload)?);
    let response = sender.send(request).await?;

    let body = match decode_json::<CreateResponse>(&response) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "could not decode create repository response");
            CreateResponse::default()
        }
    };

    if response.is_success() {
        info!(repository = %repo.repository, "successfully created the local repository");
        return Ok(CreateOutcome::Created);
    }

    if response.status == 500 && body.exception_message() == Some(ALREADY_EXISTS_EXCEPTION) {
        info!(repository = %repo.repository, "the repository already exists locally");
        return Ok(CreateOutcome::AlreadyExists);
    }

    if let Some(exception) = body.exception_message() {
        warn!(repository = %repo.repository, exception = %exception, "creating the repository failed");
    }
    Err(GctsError::Http {
        status: response.status,
        url,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOutcome {
    Cloned,
    AlreadyCloned,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CloneResponse {
    #[serde(flatten)]
    diagnostics: Diagnostics,
}

/// Clone the remote git repository into `repo`.
pub async fn clone_repository(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
) -> Result<CloneOutcome> {
    let url = repo.action_url("clone");
    let request = HttpRequest::post(&url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json");
    let response = sender.send(request).await?;

    if response.is_success() {
        info!(
            repository = %repo.repository,
            "successfully cloned the git repository to the local repository"
        );
        return Ok(CloneOutcome::Cloned);
    }

    let body: CloneResponse = decode_json(&response)?;
    if response.status == 500 && body.diagnostics.find_error_code(ALREADY_CLONED_CODE).is_some() {
        info!(repository = %repo.repository, "the repository has already been cloned");
        return Ok(CloneOutcome::AlreadyCloned);
    }

    Err(GctsError::Http {
        status: response.status,
        url,
    })
}
