//! Package enumeration for a repository.

use serde::Deserialize;
use tracing::debug;

use crate::config::RepositoryRef;
use crate::decode::{decode_json, ensure_success};
use crate::error::Result;
use crate::transport::{HttpRequest, HttpSender};

/// Object type of an ABAP package.
pub const PACKAGE_TYPE: &str = "DEVC";

/// One entry of the `getObjects` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepositoryObject {
    pub pgmid: String,
    pub object: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectsResponse {
    objects: Vec<RepositoryObject>,
}

/// List the repository's objects as reported by the ABAP system.
pub async fn list_objects(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
) -> Result<Vec<RepositoryObject>> {
    let url = repo.action_url("getObjects");
    let response = sender.send(HttpRequest::get(&url)).await?;
    ensure_success(&response, &url)?;

    let body: ObjectsResponse = decode_json(&response)?;
    Ok(body.objects)
}

/// Names of the repository's packages, in listing order.
pub async fn list_packages(sender: &dyn HttpSender, repo: &RepositoryRef) -> Result<Vec<String>> {
    let packages: Vec<String> = list_objects(sender, repo)
        .await?
        .into_iter()
        .filter(|object| object.kind == PACKAGE_TYPE)
        .map(|object| object.object)
        .collect();

    debug!(repository = %repo.repository, packages = packages.len(), "listed packages");
    Ok(packages)
}
