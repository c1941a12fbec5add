//! ABAP Unit test runs for every package of a repository.
//!
//! Packages run one after another in listing order. Within a package every
//! method is reported; across packages the run stops at the first package
//! with a failing method.

use quick_xml::escape::escape;
use tracing::info;

use crate::aunit::discovery::{discover, CsrfToken, CSRF_HEADER};
use crate::aunit::packages::list_packages;
use crate::aunit::result::{PackageVerdict, RunResult, RUN_RESULT_ROOT};
use crate::config::RepositoryRef;
use crate::decode::{decode_xml_document, ensure_success};
use crate::error::{GctsError, Result};
use crate::observer::{GctsObserver, TracingObserver};
use crate::transport::{HttpRequest, HttpSender};

/// Content type of the run configuration / result exchange.
pub const TESTRUN_CONTENT_TYPE: &str = "application/vnd.sap.adt.abapunit.testruns.result.v1+xml";

/// Run configuration document for all tests of one package.
pub fn run_configuration(package: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<aunit:runConfiguration xmlns:aunit="http://www.sap.com/adt/aunit">
  <external>
    <coverage active="false"/>
  </external>
  <options>
    <uriType value="semantic"/>
    <testDeterminationStrategy sameProgram="true" assignedTests="false" appendAssignedTestsPreview="true"/>
    <testRiskLevels harmless="true" dangerous="true" critical="true"/>
    <testDurations short="true" medium="true" long="true"/>
  </options>
  <adtcore:objectSets xmlns:adtcore="http://www.sap.com/adt/core">
    <objectSet kind="inclusive">
      <adtcore:objectReferences>
        <adtcore:objectReference adtcore:uri="/sap/bc/adt/packages/{}"/>
      </adtcore:objectReferences>
    </objectSet>
  </adtcore:objectSets>
</aunit:runConfiguration>"#,
        escape(package)
    )
}

/// Verdicts of every package that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub packages: Vec<PackageVerdict>,
}

impl RunSummary {
    pub fn total_methods(&self) -> usize {
        self.packages.iter().map(|p| p.methods.len()).sum()
    }
}

/// Runs ABAP Unit tests package by package.
pub struct TestRunExecutor<'a> {
    sender: &'a dyn HttpSender,
    observer: &'a dyn GctsObserver,
}

impl<'a> TestRunExecutor<'a> {
    pub fn new(sender: &'a dyn HttpSender) -> Self {
        TestRunExecutor {
            sender,
            observer: &TracingObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn GctsObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Run the tests of every package in `repo`.
    ///
    /// Fails with [`GctsError::UnitTestsFailed`] for the first package that
    /// has a failing method; later packages are not run.
    pub async fn run_all(&self, repo: &RepositoryRef) -> Result<RunSummary> {
        let packages = list_packages(self.sender, repo).await?;
        let token = discover(self.sender, repo).await?;

        let mut summary = RunSummary::default();
        for package in &packages {
            let verdict = self.run_package(repo, &token, package).await?;
            if !verdict.passed() {
                return Err(GctsError::UnitTestsFailed {
                    package: verdict.package.clone(),
                    failed_methods: verdict.failed_methods(),
                });
            }
            summary.packages.push(verdict);
        }

        info!(
            repository = %repo.repository,
            packages = summary.packages.len(),
            methods = summary.total_methods(),
            "all unit tests were successful"
        );
        Ok(summary)
    }

    /// Submit one package run and reduce its result.
    pub async fn run_package(
        &self,
        repo: &RepositoryRef,
        token: &CsrfToken,
        package: &str,
    ) -> Result<PackageVerdict> {
        self.observer.package_started(package);

        let url = repo.adt_url("abapunit/testruns");
        let request = HttpRequest::post(&url)
            .header(CSRF_HEADER, token.as_str())
            .header("Accept", "application/xml")
            .header("Content-Type", TESTRUN_CONTENT_TYPE)
            .body(run_configuration(package));

        let response = self.sender.send(request).await?;
        ensure_success(&response, &url)?;

        let result: RunResult = decode_xml_document(&response, RUN_RESULT_ROOT)?;
        let verdict = result.verdict(package);
        for outcome in &verdict.methods {
            self.observer.method_result(package, outcome);
        }
        self.observer.package_finished(&verdict);
        Ok(verdict)
    }
}
