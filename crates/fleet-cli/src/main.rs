//! fleet CLI - multi-repository workspace management
//!
//! Usage:
//!   fleet project list [--branches] [--nopristine]   List projects and branches
//!   fleet project clean [--branches] [<project>...]  Restore projects to a pristine state
//!   fleet project shell-prompt [--show-name]         Succinct status for shell prompts
//!   fleet project poll [<test>...]                   Report pending remote changes
//!   fleet test list                                  List tests known to the workspace

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fleet_core::{FleetConfig, Manifest, TestMapping};
use fleet_engine::{
    cleanup, current_project_key, get_states, poll_tests, prompt_line, render_listing,
    render_poll, CleanupOptions, ListOptions, ProjectRegistry, PromptOptions, StateOptions,
};
use fleet_vcs::GitBackend;
use std::path::{Path, PathBuf};
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Environment variable overriding workspace root discovery
const ROOT_ENV: &str = "FLEET_ROOT";

#[derive(Parser)]
#[command(name = "fleet")]
#[command(author, version, about = "Multi-repository workspace management")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Workspace root (defaults to $FLEET_ROOT, then the nearest directory containing .fleet/)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the workspace projects
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Inspect the workspace tests
    Test {
        #[command(subcommand)]
        action: TestCommands,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Restore projects to their pristine state
    ///
    /// Checks out the default branch and discards all local changes. With no
    /// projects given, every project in the workspace is cleaned.
    Clean {
        /// Also delete every branch other than the default branch
        #[arg(long)]
        branches: bool,

        /// Projects to clean, by name or path
        projects: Vec<String>,
    },

    /// List existing projects and branches
    List {
        /// Show project branches
        #[arg(long)]
        branches: bool,

        /// Omit pristine projects, i.e. projects with a clean default branch and no other branches
        #[arg(long = "nopristine")]
        no_pristine: bool,
    },

    /// Print a succinct status of projects suitable for shell prompts
    ///
    /// Reports the current branch of each project that is not pristine, with
    /// `*` for uncommitted changes and `%` for untracked files.
    ShellPrompt {
        /// Check for uncommitted changes and untracked files. Turning this off
        /// hides dirty default branches.
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        check_dirty: bool,

        /// Show the name of the current project
        #[arg(long)]
        show_name: bool,
    },

    /// Report remote changes not yet present locally
    ///
    /// Polls the projects that can affect the given tests, or every project
    /// when no tests are given. Prints JSON only if changes exist.
    Poll {
        /// Tests that determine which projects to poll
        tests: Vec<String>,
    },
}

#[derive(Subcommand)]
enum TestCommands {
    /// List tests known to the workspace configuration
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries prompt and JSON output
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let root = workspace_root(cli.root)?;
    debug!("Using workspace root {}", root.display());

    match cli.command {
        Commands::Project { action } => match action {
            ProjectCommands::Clean { branches, projects } => {
                cmd_project_clean(&root, branches, projects).await
            }
            ProjectCommands::List {
                branches,
                no_pristine,
            } => cmd_project_list(&root, branches, no_pristine).await,
            ProjectCommands::ShellPrompt {
                check_dirty,
                show_name,
            } => cmd_project_shell_prompt(&root, check_dirty, show_name).await,
            ProjectCommands::Poll { tests } => cmd_project_poll(&root, tests).await,
        },
        Commands::Test { action } => match action {
            TestCommands::List => cmd_test_list(&root),
        },
    }
}

fn workspace_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = flag {
        return Ok(root);
    }
    if let Some(root) = std::env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Manifest::find_root(&cwd).ok_or_else(|| {
        anyhow!(
            "No fleet workspace found above {}; set {} or pass --root",
            cwd.display(),
            ROOT_ENV
        )
    })
}

fn load(root: &Path) -> Result<(ProjectRegistry, FleetConfig)> {
    let registry = ProjectRegistry::scan(root).context("Failed to scan workspace")?;
    let config = FleetConfig::load_or_default(root).context("Failed to load configuration")?;
    Ok((registry, config))
}

async fn cmd_project_clean(root: &Path, branches: bool, projects: Vec<String>) -> Result<()> {
    let (registry, config) = load(root)?;
    let backend = GitBackend::system(config.remote);

    let selection = registry.select(&projects);
    for (identifier, err) in &selection.errors {
        eprintln!("Error finding local project {:?}: {}.", identifier, err);
    }

    cleanup(
        &backend,
        &selection.projects,
        CleanupOptions {
            delete_branches: branches,
        },
    )
    .await?;
    Ok(())
}

async fn cmd_project_list(root: &Path, branches: bool, no_pristine: bool) -> Result<()> {
    let (registry, config) = load(root)?;
    let backend = GitBackend::system(config.remote);

    let options = StateOptions {
        check_dirty: true,
        filter_pristine: no_pristine,
    };
    let states = get_states(&backend, &registry, options).await?;

    for line in render_listing(
        &states,
        ListOptions {
            branches,
            no_pristine,
        },
    ) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_project_shell_prompt(root: &Path, check_dirty: bool, show_name: bool) -> Result<()> {
    let (registry, config) = load(root)?;
    let backend = GitBackend::system(config.remote);

    let options = StateOptions {
        check_dirty,
        filter_pristine: false,
    };
    let states = get_states(&backend, &registry, options).await?;
    let current = current_project_key(&registry)?;

    println!(
        "{}",
        prompt_line(
            &states,
            &current,
            PromptOptions {
                check_dirty,
                show_name,
            },
        )
    );
    Ok(())
}

async fn cmd_project_poll(root: &Path, tests: Vec<String>) -> Result<()> {
    let (registry, config) = load(root)?;
    let mapping = TestMapping::from_config(&config);
    let backend = GitBackend::system(config.remote);

    let update = poll_tests(&backend, &registry, &mapping, &tests).await?;
    if let Some(json) = render_poll(&update)? {
        println!("{}", json);
    }
    Ok(())
}

fn cmd_test_list(root: &Path) -> Result<()> {
    let config = FleetConfig::load_or_default(root).context("Failed to load configuration")?;
    let mapping = TestMapping::from_config(&config);
    if mapping.is_empty() {
        warn!("No tests configured under [project_tests]");
    }

    for test in mapping.test_names() {
        println!("{}", test);
    }
    Ok(())
}
