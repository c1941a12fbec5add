//! Connection settings for a gCTS repository on an ABAP system.

use crate::error::{GctsError, Result};

/// Environment variable holding the ABAP system base URL.
pub const ENV_HOST: &str = "GCTS_HOST";
/// Environment variable holding the SAP client (tenant).
pub const ENV_CLIENT: &str = "GCTS_CLIENT";
/// Environment variable holding the repository name.
pub const ENV_REPOSITORY: &str = "GCTS_REPOSITORY";
pub const ENV_USERNAME: &str = "GCTS_USERNAME";
pub const ENV_PASSWORD: &str = "GCTS_PASSWORD";

/// Identifies one local repository on one ABAP system client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    /// Base URL including scheme and port, e.g. `http://abap.example.com:50000`.
    pub host: String,
    /// SAP client, e.g. `000`.
    pub client: String,
    /// Repository id as known to gCTS.
    pub repository: String,
}

impl RepositoryRef {
    pub fn new(host: &str, client: &str, repository: &str) -> Self {
        RepositoryRef {
            host: host.trim_end_matches('/').to_string(),
            client: client.to_string(),
            repository: repository.to_string(),
        }
    }

    /// Read `GCTS_HOST`, `GCTS_CLIENT` and `GCTS_REPOSITORY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            &required_env(ENV_HOST)?,
            &required_env(ENV_CLIENT)?,
            &required_env(ENV_REPOSITORY)?,
        ))
    }

    /// `{host}/sap/bc/cts_abapvcs/repository?sap-client={client}`
    pub fn repositories_url(&self) -> String {
        format!(
            "{}/sap/bc/cts_abapvcs/repository?sap-client={}",
            self.host, self.client
        )
    }

    /// `{host}/sap/bc/cts_abapvcs/repository/{repository}?sap-client={client}`
    pub fn repository_url(&self) -> String {
        format!(
            "{}/sap/bc/cts_abapvcs/repository/{}?sap-client={}",
            self.host, self.repository, self.client
        )
    }

    /// Repository-scoped action endpoint such as `getHistory` or `clone`.
    pub fn action_url(&self, action: &str) -> String {
        format!(
            "{}/sap/bc/cts_abapvcs/repository/{}/{}?sap-client={}",
            self.host, self.repository, action, self.client
        )
    }

    /// ABAP Development Tools endpoint below `/sap/bc/adt`.
    pub fn adt_url(&self, path: &str) -> String {
        format!(
            "{}/sap/bc/adt/{}?sap-client={}",
            self.host,
            path.trim_start_matches('/'),
            self.client
        )
    }
}

/// Basic-auth credentials for the ABAP system.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Read `GCTS_USERNAME` and `GCTS_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            &required_env(ENV_USERNAME)?,
            &required_env(ENV_PASSWORD)?,
        ))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(GctsError::Config(format!("{name} is not set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("http://testHost.com:50000/", "000", "testRepo")
    }

    #[test]
    fn test_trailing_slash_is_dropped_from_host() {
        assert_eq!(repo().host, "http://testHost.com:50000");
    }

    #[test]
    fn test_action_url() {
        assert_eq!(
            repo().action_url("getHistory"),
            "http://testHost.com:50000/sap/bc/cts_abapvcs/repository/testRepo/getHistory?sap-client=000"
        );
    }

    #[test]
    fn test_repository_url() {
        assert_eq!(
            repo().repository_url(),
            "http://testHost.com:50000/sap/bc/cts_abapvcs/repository/testRepo?sap-client=000"
        );
    }

    #[test]
    fn test_adt_url() {
        assert_eq!(
            repo().adt_url("/core/discovery"),
            "http://testHost.com:50000/sap/bc/adt/core/discovery?sap-client=000"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("testUser", "s3cret");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("testUser"));
        assert!(!printed.contains("s3cret"));
    }
}
