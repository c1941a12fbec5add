//! ABAP Unit orchestration over the ADT REST API.
//!
//! - `discovery`: CSRF token handshake
//! - `packages`: package enumeration from the gCTS object listing
//! - `result`: run result tree and its reduction
//! - `executor`: sequential, fail-fast test runs per package

pub mod discovery;
pub mod executor;
pub mod packages;
pub mod result;

pub use discovery::{discover, CsrfToken};
pub use executor::{run_configuration, RunSummary, TestRunExecutor};
pub use packages::{list_objects, list_packages, RepositoryObject};
pub use result::{MethodOutcome, PackageVerdict, RunResult, RUN_RESULT_ROOT};
