use clap::Parser;
use mandala::cli::commands::{Cli, Commands};
use mandala::cli::handlers;

fn main() {
    let cli = Cli::parse();
    let workspace_dir = cli.workspace_dir.clone();

    let result = match cli.command {
        // No subcommand → launch TUI
        None => mandala::tui::run(workspace_dir.as_deref()),
        // Init is handled before workspace discovery
        Some(Commands::Init(args)) => handlers::cmd_init(args, workspace_dir.as_deref()),
        Some(_) => handlers::dispatch(cli),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
