use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use project_mutator::commit::Summary;
use project_mutator::config::load_for_project;
use project_mutator::{builtin, CommitOutcome, FileDiff, Session};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "project-mutator")]
#[command(about = "Staged, reviewable edits to a project tree", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a transformation and commit the result
    Run {
        /// Registered task name (see `list`)
        task: String,

        /// Arguments passed to the task
        args: Vec<String>,

        /// Path to project root (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List available tasks
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            task,
            args,
            workspace,
            dry_run,
            diff,
        } => cmd_run(workspace, &task, &args, dry_run, diff),

        Commands::List => cmd_list(),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("PROJECT_MUTATOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve project root
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. PROJECT_MUTATOR_WORKSPACE environment variable
/// 3. Current directory
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return path
            .canonicalize()
            .with_context(|| format!("workspace not found: {}", path.display()));
    }

    if let Ok(env_path) = env::var("PROJECT_MUTATOR_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: PROJECT_MUTATOR_WORKSPACE is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    Ok(env::current_dir()?)
}

fn display_diff(diff: &FileDiff) {
    println!();
    if let Some(from) = &diff.moved_from {
        println!("{}", format!("{} (moved from {})", diff.path, from).bold());
    }
    for line in diff.unified().lines() {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            line.dimmed()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else {
            line.normal()
        };
        println!("{}", styled);
    }
}

fn display_issues(issues: &[&str]) {
    eprintln!(
        "{} {} issue(s) must be resolved before committing:",
        "✗".red(),
        issues.len()
    );
    for (idx, issue) in issues.iter().enumerate() {
        eprintln!("  {}. {}", idx + 1, issue);
    }
}

fn display_summary(summary: &Summary) {
    if summary.is_empty() {
        return;
    }
    println!();
    for warning in &summary.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    for notice in &summary.notices {
        println!("{} {}", "notice:".cyan(), notice);
    }
    for task in &summary.tasks {
        println!("{} {}", "task:".dimmed(), task);
    }
}

fn cmd_run(
    workspace: Option<PathBuf>,
    task: &str,
    args: &[String],
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    // 1. Resolve project root and its configuration
    let workspace = resolve_workspace(workspace)?;
    let config = load_for_project(&workspace)
        .with_context(|| format!("invalid configuration in {}", workspace.display()))?;

    println!("Workspace: {}", workspace.display());

    // 2. Load and transform
    let session = Session::load(&workspace, &config)
        .with_context(|| format!("failed to load {}", workspace.display()))?
        .with_registry(builtin::registry());
    let session = session.compose_task(task, args)?;

    // 3. Preview
    if show_diff || dry_run {
        for diff in session.diff() {
            display_diff(&diff);
        }
        for pending in session.moves() {
            println!("{} {}", "move".cyan(), pending);
        }
    }

    if dry_run {
        let issues = session.issues();
        if !issues.is_empty() {
            display_issues(&issues);
            std::process::exit(1);
        }
        println!();
        println!("{}", "[DRY RUN - no files were modified]".cyan());
        display_summary(&Summary {
            tasks: session.tasks().to_vec(),
            warnings: session.warnings().iter().map(|w| w.to_string()).collect(),
            notices: session.notices().iter().map(|n| n.to_string()).collect(),
        });
        return Ok(());
    }

    // 4. Commit
    match session.commit()? {
        CommitOutcome::Rejected(rejected) => {
            let issues: Vec<&str> = rejected.issues.iter().map(String::as_str).collect();
            display_issues(&issues);
            std::process::exit(1);
        }
        CommitOutcome::Committed(committed) => {
            println!();
            for path in &committed.written {
                println!("{} wrote {}", "✓".green(), path);
            }
            for moved in &committed.moved {
                println!("{} moved {}", "✓".green(), moved);
            }
            if committed.written.is_empty() && committed.moved.is_empty() {
                println!("{}", "No changes.".dimmed());
            }
            display_summary(&committed.summary);
        }
    }

    Ok(())
}

fn cmd_list() -> Result<()> {
    let registry = builtin::registry();

    println!("{}", "Available tasks:".bold());
    println!();
    for (name, description) in registry.describe() {
        println!("  {}", name.bold());
        println!("    {}", description.dimmed());
    }

    Ok(())
}
