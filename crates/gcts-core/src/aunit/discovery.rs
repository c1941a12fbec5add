//! ADT discovery handshake.
//!
//! The only purpose of the discovery call is to obtain the anti-forgery
//! (CSRF) token that every later state-changing ADT call must carry. The
//! token is mandatory: there is no anonymous path.

use tracing::debug;

use crate::config::RepositoryRef;
use crate::decode::ensure_success;
use crate::error::{GctsError, Result};
use crate::transport::{HttpRequest, HttpSender};

/// Header carrying the CSRF token in both directions.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Short-lived anti-forgery token from one discovery handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CsrfToken(<redacted>)")
    }
}

/// Perform the discovery GET and return the issued token.
pub async fn discover(sender: &dyn HttpSender, repo: &RepositoryRef) -> Result<CsrfToken> {
    let url = repo.adt_url("core/discovery");
    let request = HttpRequest::get(&url)
        .header("Accept", "application/atomsvc+xml")
        .header(CSRF_HEADER, "fetch")
        .header("saml2", "disabled");

    let response = sender.send(request).await?;
    ensure_success(&response, &url)?;

    match response.header(CSRF_HEADER).map(str::trim) {
        Some(token) if !token.is_empty() && !token.eq_ignore_ascii_case("fetch") => {
            debug!(host = %repo.host, "received csrf token");
            Ok(CsrfToken(token.to_string()))
        }
        _ => Err(GctsError::MissingCsrfToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedSender;
    use crate::transport::HttpResponse;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("http://testHost.com:50000", "000", "testRepo")
    }

    #[tokio::test]
    async fn test_discover_reads_token_header() {
        let sender = ScriptedSender::new()
            .push(HttpResponse::new(200, "<service/>").with_header("X-Csrf-Token", "ZRlb5Q=="));

        let token = discover(&sender, &repo()).await.unwrap();
        assert_eq!(token.as_str(), "ZRlb5Q==");

        let request = &sender.requests()[0];
        assert_eq!(
            request.url,
            "http://testHost.com:50000/sap/bc/adt/core/discovery?sap-client=000"
        );
        assert_eq!(request.header_value("x-csrf-token"), Some("fetch"));
        assert_eq!(request.header_value("accept"), Some("application/atomsvc+xml"));
        assert_eq!(request.header_value("saml2"), Some("disabled"));
    }

    #[tokio::test]
    async fn test_missing_token_header_fails() {
        let sender = ScriptedSender::new().respond(200, "<service/>");
        let err = discover(&sender, &repo()).await.unwrap_err();
        assert!(matches!(err, GctsError::MissingCsrfToken));
    }

    #[tokio::test]
    async fn test_empty_token_fails() {
        let sender =
            ScriptedSender::new().push(HttpResponse::new(200, "").with_header("x-csrf-token", ""));
        let err = discover(&sender, &repo()).await.unwrap_err();
        assert!(matches!(err, GctsError::MissingCsrfToken));
    }

    #[tokio::test]
    async fn test_unauthorized_discovery_fails() {
        let sender = ScriptedSender::new()
            .push(HttpResponse::new(401, "").with_header("x-csrf-token", "Required"));
        let err = discover(&sender, &repo()).await.unwrap_err();
        assert!(matches!(err, GctsError::Http { status: 401, .. }));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = CsrfToken("secret".to_string());
        assert!(!format!("{:?}", token).contains("secret"));
    }
}
