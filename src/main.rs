use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use entire_cli::cli::{self, commands};
use entire_cli::config::Config;

/// Hook logs live under the git directory so they never show up as
/// untracked files.
const HOOK_LOG_DIR: &str = "entire";
const HOOK_LOG_FILE: &str = "hooks.log";

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "entire")]
#[command(version)]
#[command(about = "Checkpoint AI agent sessions alongside your commits")]
#[command(long_about = "Entire records the transcript of the AI coding session behind each\n\
    commit and stores it on the entire/checkpoints/v1 branch of the same\n\
    repository. Commits are tagged with an Entire-Checkpoint trailer so\n\
    the conversation can be recovered later.")]
#[command(after_help = "EXAMPLES:\n    \
    entire enable                     Install hooks and start checkpointing\n    \
    entire status                     Show whether checkpointing is on\n    \
    entire checkpoints                List recent checkpoints\n    \
    entire explain --commit HEAD      Show the session behind HEAD\n    \
    entire rewind --to a3b2c4d5e6f7   Go back to a checkpoint's commit\n    \
    entire resume feature/login       Switch branch and show its session\n\n\
    For more information about a command, run 'entire <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Enable checkpointing in the current repository
    #[command(long_about = "Writes enabled: true (and the chosen strategy) to\n\
        .entire/settings.yaml, installs the post-commit and pre-push hooks,\n\
        and creates the entire/checkpoints/v1 branch.")]
    Enable(commands::enable::Args),

    /// Disable checkpointing and remove Entire's git hooks
    Disable(commands::disable::Args),

    /// Show checkpointing state for the current repository
    Status(commands::status::Args),

    /// List checkpoints, newest first
    Checkpoints(commands::checkpoints::Args),

    /// Show a checkpoint and its session transcript
    #[command(long_about = "Looks up a checkpoint by ID, or through the Entire-Checkpoint\n\
        trailer of a commit, and prints its metadata followed by the\n\
        rendered context of one session (or the raw JSONL with --raw).")]
    Explain(commands::explain::Args),

    /// Check out the commit a checkpoint was taken at
    Rewind(commands::rewind::Args),

    /// Check out a branch and show the checkpoint it was built from
    #[command(long_about = "Checks out a branch, then scans its recent commits for an\n\
        Entire-Checkpoint trailer and prints the checkpoint it names.")]
    Resume(commands::resume::Args),

    /// Delete leftover Entire shadow branches
    Clean(commands::clean::Args),

    /// Delete shadow branches and local settings
    #[command(long_about = "Removes every Entire shadow branch and .entire/settings.local.yaml.\n\
        The checkpoints branch and committed settings are kept. Nothing is\n\
        deleted without --force.")]
    Reset(commands::reset::Args),

    /// Manage Entire's git hooks
    Hooks(commands::hooks::Args),

    /// Entry point for git hooks and agent hooks
    #[command(hide = true)]
    Hook(commands::hook::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli);

    match cli.command {
        Commands::Enable(args) => commands::enable::run(args),
        Commands::Disable(args) => commands::disable::run(args),
        Commands::Status(args) => commands::status::run(args),
        Commands::Checkpoints(args) => commands::checkpoints::run(args),
        Commands::Explain(args) => commands::explain::run(args),
        Commands::Rewind(args) => commands::rewind::run(args),
        Commands::Resume(args) => commands::resume::run(args),
        Commands::Clean(args) => commands::clean::run(args),
        Commands::Reset(args) => commands::reset::run(args),
        Commands::Hooks(args) => commands::hooks::run(args),
        Commands::Hook(args) => commands::hook::run(args),
    }
}

/// Sets up stderr logging, plus a log file for hook invocations.
///
/// The returned guard flushes the file writer on drop and must be held
/// until the command finishes.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let level = if cli.verbose {
        "debug".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        configured_level().unwrap_or_else(|| "info".to_string())
    };
    let directives = format!("entire={level},entire_cli={level}");

    let (file_writer, guard) = match cli.command {
        Commands::Hook(_) => match hook_log_writer() {
            Some((writer, guard)) => (Some(writer), Some(guard)),
            None => (None, None),
        },
        _ => (None, None),
    };
    let file_layer = file_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives)))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

/// `log_level` from the repository's settings, if we are inside one.
fn configured_level() -> Option<String> {
    let repo = cli::current_repo().ok()?;
    Config::load(&repo.workdir()).ok().map(|c| c.log_level)
}

/// Non-blocking writer appending to `<git-dir>/entire/hooks.log`.
fn hook_log_writer() -> Option<(NonBlocking, WorkerGuard)> {
    let repo = cli::current_repo().ok()?;
    let dir = repo.git_dir().join(HOOK_LOG_DIR);
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(&dir, HOOK_LOG_FILE);
    Some(tracing_appender::non_blocking(appender))
}
