//! gCTS pipeline steps
//!
//! Talks to the gCTS (git-enabled Change and Transport System) REST API of an
//! ABAP system:
//!
//! - rollback: pick the commit to revert a repository to and deploy it
//! - aunit: run the ABAP Unit tests of every package of a repository
//! - repository / deploy: create, clone and pull-by-commit steps
//!
//! All network access goes through [`HttpSender`]; tests use the fakes in
//! [`fakes`].

pub mod aunit;
pub mod config;
pub mod decode;
pub mod deploy;
pub mod error;
pub mod fakes;
pub mod history;
pub mod hosting;
pub mod observer;
pub mod repository;
pub mod rollback;
pub mod telemetry;
pub mod transport;

pub use aunit::{
    discover, list_packages, CsrfToken, MethodOutcome, PackageVerdict, RunResult, RunSummary,
    TestRunExecutor,
};
pub use config::{Credentials, RepositoryRef};
pub use deploy::{
    deploy_commit, DeployArgs, DeployInvoker, DeployOutcome, ProcessDeployer, SenderDeployer,
};
pub use error::{GctsError, Result};
pub use history::{fetch_commits, fetch_history, CommitRecord, TransportHistoryEntry};
pub use hosting::{
    fetch_commit_status, find_last_successful_commit, CommitStatus, HostedRepository,
    HostingProvider,
};
pub use observer::{GctsObserver, NoopObserver, TracingObserver};
pub use repository::{
    clone_repository, create_repository, fetch_repository, CloneOutcome, CreateOptions,
    CreateOutcome, RepositoryDescriptor,
};
pub use rollback::{ResolvedTarget, RollbackResolver, RollbackStrategy};
pub use telemetry::init_tracing;
pub use transport::{HttpRequest, HttpResponse, HttpSender, Method, ReqwestSender, SenderOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
