#![forbid(unsafe_code)]

mod cmd;
mod output;
mod session;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "dk",
    author,
    version,
    about = "docket: a local-first ticket tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Project directory. Defaults to the nearest ancestor containing `.docket/`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a docket project",
        long_about = "Create a .docket/ directory with the default config in the project root.",
        after_help = "EXAMPLES:\n    # Initialize the current directory\n    dk init\n\n    # Initialize another directory\n    dk init --root ~/work/app"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Session",
        about = "Sign in as a user",
        long_about = "Store the acting user for later commands. DOCKET_USER_ID overrides it per invocation.",
        after_help = "EXAMPLES:\n    # Sign in with a numeric id\n    dk login --id 1 --username alice\n\n    # Sign in with a role\n    dk login --id 2 --username bob --role Admin"
    )]
    Login(cmd::login::LoginArgs),

    #[command(next_help_heading = "Session", about = "Sign out")]
    Logout(cmd::login::LogoutArgs),

    #[command(next_help_heading = "Session", about = "Show the acting user")]
    Whoami(cmd::login::WhoamiArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Create a ticket",
        long_about = "Create a ticket owned by the acting user (or anonymous).",
        after_help = "EXAMPLES:\n    # Create a ticket with default priority and status\n    dk create --title \"Fix bug\" --description \"Crash on startup screen\"\n\n    # Create a high-priority ticket\n    dk create -t \"Fix bug\" -d \"Crash on startup screen\" --priority High\n\n    # Emit machine-readable output\n    dk create -t \"Fix bug\" -d \"Crash on startup screen\" --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "List tickets",
        long_about = "List tickets with optional priority/status filters and sort order.",
        after_help = "EXAMPLES:\n    # All tickets in stored order\n    dk list\n\n    # High-priority open tickets, newest first\n    dk list --priority High --status Open --sort newest\n\n    # Emit machine-readable output\n    dk list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Show a ticket and its comments",
        after_help = "EXAMPLES:\n    dk show 1700000000000"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Update ticket fields",
        long_about = "Patch the given fields of a ticket; omitted fields keep their values.",
        after_help = "EXAMPLES:\n    # Resolve a ticket\n    dk update 1700000000000 --status Resolved\n\n    # Retitle and reprioritize\n    dk update 1700000000000 --title \"Fix crash\" --priority Low"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Delete a ticket",
        long_about = "Delete a ticket. Its comments are kept as orphans unless tickets.cascade_comments is set.",
        after_help = "EXAMPLES:\n    # Delete after confirming\n    dk delete 1700000000000\n\n    # Delete without a prompt\n    dk delete 1700000000000 --yes"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Comments",
        about = "Add, edit, or remove a comment",
        after_help = "EXAMPLES:\n    # Comment on a ticket\n    dk comment add 1700000000000 \"I can reproduce this\"\n\n    # Edit your comment\n    dk comment edit <comment-id> \"Fixed in the next build\"\n\n    # Remove your comment\n    dk comment rm <comment-id> --yes"
    )]
    Comment {
        #[command(subcommand)]
        command: cmd::comment::CommentCommand,
    },

    #[command(next_help_heading = "Comments", about = "List a ticket's comments")]
    Comments(cmd::comment::ListCommentsArgs),

    #[command(
        next_help_heading = "Views",
        about = "Kanban board by priority",
        long_about = "Show tickets in High/Medium/Low columns, or move and trash tickets.",
        after_help = "EXAMPLES:\n    # Show the board\n    dk board\n\n    # Move a ticket to the Low column\n    dk board move 1700000000000 Low\n\n    # Drop a ticket on the trash\n    dk board trash 1700000000000 --yes"
    )]
    Board(cmd::board::BoardArgs),

    #[command(
        next_help_heading = "Views",
        about = "Ticket totals and histograms",
        after_help = "EXAMPLES:\n    dk report\n\n    # Remove orphaned comments first\n    dk report --prune-orphans"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Project",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    dk completions bash > ~/.local/share/bash-completion/completions/dk\n    dk completions zsh > ~/.zfunc/_dk"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DOCKET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "docket=debug,info"
        } else {
            "docket=info,warn"
        })
    });

    let format = env::var("DOCKET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = output::resolve_output_mode(cli.format, cli.json)?;
    let project_root = match cli.root {
        Some(root) => root,
        None => env::current_dir()?,
    };
    debug!(root = %project_root.display(), ?output, "dispatching command");

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &project_root),
        Commands::Login(ref args) => cmd::login::run_login(args, output, &project_root),
        Commands::Logout(ref args) => cmd::login::run_logout(args, output, &project_root),
        Commands::Whoami(ref args) => cmd::login::run_whoami(args, output, &project_root),
        Commands::Create(ref args) => cmd::create::run_create(args, output, &project_root),
        Commands::List(ref args) => cmd::list::run_list(args, output, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &project_root),
        Commands::Update(ref args) => cmd::update::run_update(args, output, &project_root),
        Commands::Delete(ref args) => cmd::delete::run_delete(args, output, &project_root),
        Commands::Comment { ref command } => {
            cmd::comment::run_comment(command, output, &project_root)
        }
        Commands::Comments(ref args) => {
            cmd::comment::run_list_comments(args, output, &project_root)
        }
        Commands::Board(ref args) => cmd::board::run_board(args, output, &project_root),
        Commands::Report(ref args) => cmd::report::run_report(args, output, &project_root),
        Commands::Completions(ref args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}
