//! gCTS pipeline steps CLI
//!
//! The `gcts` command drives a gCTS repository on an ABAP system.
//!
//! ## Commands
//!
//! - `create-repository`: Create the local repository on the ABAP system
//! - `clone-repository`: Clone the remote git repository into it
//! - `deploy-commit`: Pull a commit (or the remote head) into the repository
//! - `rollback-commit`: Resolve the rollback target and deploy it
//! - `run-unit-tests`: Run the ABAP Unit tests of every repository package

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;

use gcts_core::{
    clone_repository, create_repository, deploy_commit, CloneOutcome, CreateOptions,
    CreateOutcome, Credentials, DeployInvoker, HttpSender, ProcessDeployer, RepositoryRef,
    ReqwestSender, RollbackResolver, SenderOptions, TestRunExecutor, TracingObserver,
};

#[derive(Parser)]
#[command(name = "gcts")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "gCTS pipeline steps for ABAP systems", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Connection to one repository on one ABAP system client.
#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// ABAP system base URL including scheme and port
    #[arg(long, env = "GCTS_HOST")]
    host: String,

    /// SAP client
    #[arg(long, env = "GCTS_CLIENT")]
    client: String,

    /// Repository id on the ABAP system
    #[arg(long, env = "GCTS_REPOSITORY")]
    repository: String,

    /// User for the ABAP system
    #[arg(long, env = "GCTS_USERNAME")]
    username: String,

    /// Password for the ABAP system
    #[arg(long, env = "GCTS_PASSWORD", hide_env_values = true)]
    password: String,
}

impl ConnectionArgs {
    fn repo(&self) -> RepositoryRef {
        RepositoryRef::new(&self.host, &self.client, &self.repository)
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    fn sender(&self) -> Result<ReqwestSender> {
        let options = SenderOptions::default().with_credentials(self.credentials());
        ReqwestSender::new(options).context("Failed to create HTTP client")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the local repository on the ABAP system
    CreateRepository {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// URL of the remote git repository
        #[arg(long, env = "GCTS_REMOTE_URL")]
        remote_url: String,

        /// Repository role (SOURCE or TARGET)
        #[arg(long, default_value = "SOURCE")]
        role: String,

        /// Repository type
        #[arg(long = "type", default_value = "GIT")]
        kind: String,

        /// Virtual SID of the transport layer
        #[arg(long, env = "GCTS_VSID", default_value = "")]
        vsid: String,
    },

    /// Clone the remote git repository into the local repository
    CloneRepository {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Pull a commit into the local repository
    DeployCommit {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Commit to deploy (default: remote head)
        #[arg(long, env = "GCTS_COMMIT")]
        commit: Option<String>,
    },

    /// Roll the local repository back to a previous commit
    RollbackCommit {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Commit to roll back to (default: resolved from status or history)
        #[arg(long, env = "GCTS_COMMIT")]
        commit: Option<String>,

        /// Token for commit status queries on the hosting provider
        #[arg(long, env = "GCTS_GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,
    },

    /// Run the ABAP Unit tests of every package in the repository
    RunUnitTests {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    gcts_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::CreateRepository {
            connection,
            remote_url,
            role,
            kind,
            vsid,
        } => {
            let options = CreateOptions {
                role,
                kind,
                vsid,
                remote_url,
            };
            cmd_create(&connection.sender()?, &connection.repo(), &options).await
        }
        Commands::CloneRepository { connection } => {
            cmd_clone(&connection.sender()?, &connection.repo()).await
        }
        Commands::DeployCommit { connection, commit } => {
            cmd_deploy(&connection.sender()?, &connection.repo(), commit.as_deref()).await
        }
        Commands::RollbackCommit {
            connection,
            commit,
            github_token,
        } => {
            let provider = ReqwestSender::new(SenderOptions::default())
                .context("Failed to create HTTP client")?;
            let deployer = ProcessDeployer::current_exe()
                .context("Failed to locate the gcts executable")?;
            cmd_rollback(
                &connection.sender()?,
                &provider,
                &connection,
                commit.as_deref(),
                github_token,
                &deployer,
            )
            .await
        }
        Commands::RunUnitTests { connection } => {
            cmd_run_unit_tests(&connection.sender()?, &connection.repo()).await
        }
    }
}

async fn cmd_create(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
    options: &CreateOptions,
) -> Result<()> {
    let outcome = create_repository(sender, repo, options)
        .await
        .with_context(|| format!("Creating repository {} failed", repo.repository))?;
    match outcome {
        CreateOutcome::Created => println!("Created repository {}", repo.repository),
        CreateOutcome::AlreadyExists => {
            println!("Repository {} already exists", repo.repository)
        }
    }
    Ok(())
}

async fn cmd_clone(sender: &dyn HttpSender, repo: &RepositoryRef) -> Result<()> {
    let outcome = clone_repository(sender, repo)
        .await
        .with_context(|| format!("Cloning repository {} failed", repo.repository))?;
    match outcome {
        CloneOutcome::Cloned => println!("Cloned repository {}", repo.repository),
        CloneOutcome::AlreadyCloned => {
            println!("Repository {} was already cloned", repo.repository)
        }
    }
    Ok(())
}

async fn cmd_deploy(
    sender: &dyn HttpSender,
    repo: &RepositoryRef,
    commit: Option<&str>,
) -> Result<()> {
    let outcome = deploy_commit(sender, repo, commit)
        .await
        .context("Deploy commit failed")?;
    println!(
        "Deployed {} -> {} (previous commit {})",
        repo.repository, outcome.to_commit, outcome.from_commit
    );
    Ok(())
}

async fn cmd_rollback(
    abap: &dyn HttpSender,
    provider: &dyn HttpSender,
    connection: &ConnectionArgs,
    commit: Option<&str>,
    github_token: Option<String>,
    deployer: &dyn DeployInvoker,
) -> Result<()> {
    let repo = connection.repo();
    let target = RollbackResolver::new(abap, provider)
        .with_provider_token(github_token)
        .with_observer(&TracingObserver)
        .rollback(&repo, &connection.credentials(), commit, deployer)
        .await
        .context("Rollback commit failed")?;
    println!(
        "Rolled back {} -> {} ({})",
        repo.repository, target.commit, target.strategy
    );
    Ok(())
}

async fn cmd_run_unit_tests(sender: &dyn HttpSender, repo: &RepositoryRef) -> Result<()> {
    let summary = TestRunExecutor::new(sender)
        .with_observer(&TracingObserver)
        .run_all(repo)
        .await
        .context("Execution of unit tests failed")?;
    println!(
        "All unit tests passed: {} package(s), {} method(s)",
        summary.packages.len(),
        summary.total_methods()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcts_core::fakes::{RecordingDeployer, ScriptedSender};
    use gcts_core::{GctsError, HttpResponse};

    fn connection() -> ConnectionArgs {
        ConnectionArgs {
            host: "http://testHost.com:50000".to_string(),
            client: "000".to_string(),
            repository: "testRepo".to_string(),
            username: "testUser".to_string(),
            password: "testPassword".to_string(),
        }
    }

    const CONNECTION_FLAGS: [&str; 10] = [
        "--host",
        "http://testHost.com:50000",
        "--client",
        "000",
        "--repository",
        "testRepo",
        "--username",
        "testUser",
        "--password",
        "testPassword",
    ];

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deploy_commit_accepts_rollback_argument_list() {
        let args = gcts_core::DeployArgs::new(
            &connection().repo(),
            &connection().credentials(),
            "f1cdb6a",
        )
        .to_cli_args();
        let cli = Cli::try_parse_from(std::iter::once("gcts".to_string()).chain(args)).unwrap();
        match cli.command {
            Commands::DeployCommit { connection, commit } => {
                assert_eq!(connection.host, "http://testHost.com:50000");
                assert_eq!(connection.repository, "testRepo");
                assert_eq!(commit.as_deref(), Some("f1cdb6a"));
            }
            _ => panic!("expected deploy-commit"),
        }
    }

    #[test]
    fn test_rollback_commit_parses_optional_flags() {
        let mut argv = vec!["gcts", "--verbose", "rollback-commit"];
        argv.extend(CONNECTION_FLAGS);
        argv.extend(["--github-token", "ghp_abc"]);
        let cli = Cli::try_parse_from(argv).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::RollbackCommit { github_token, .. } => {
                assert_eq!(github_token.as_deref(), Some("ghp_abc"));
            }
            _ => panic!("expected rollback-commit"),
        }
    }

    #[test]
    fn test_create_repository_defaults() {
        let mut argv = vec!["gcts", "create-repository"];
        argv.extend(CONNECTION_FLAGS);
        argv.extend(["--remote-url", "https://github.com/octo/abap-demo.git"]);
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::CreateRepository { role, kind, .. } => {
                assert_eq!(role, "SOURCE");
                assert_eq!(kind, "GIT");
            }
            _ => panic!("expected create-repository"),
        }
    }

    #[tokio::test]
    async fn test_cmd_rollback_deploys_explicit_commit() {
        let abap = ScriptedSender::new();
        let provider = ScriptedSender::new();
        let deployer = RecordingDeployer::new();

        cmd_rollback(
            &abap,
            &provider,
            &connection(),
            Some("8aeebd1a"),
            None,
            &deployer,
        )
        .await
        .unwrap();

        assert_eq!(deployer.calls()[0].commit, "8aeebd1a");
        assert_eq!(abap.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cmd_run_unit_tests_surfaces_missing_token() {
        let sender = ScriptedSender::new()
            .respond(200, r#"{"objects": [{"object": "ZPKG", "type": "DEVC"}]}"#)
            .push(HttpResponse::new(200, ""));

        let err = cmd_run_unit_tests(&sender, &connection().repo())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GctsError>(),
            Some(GctsError::MissingCsrfToken)
        ));
    }

    #[tokio::test]
    async fn test_cmd_clone_already_cloned_succeeds() {
        let sender = ScriptedSender::new().respond(
            500,
            r#"{"errorLog": [{"code": "GCTS.CLIENT.1420"}]}"#,
        );
        cmd_clone(&sender, &connection().repo()).await.unwrap();
    }
}
