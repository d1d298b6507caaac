use clap::{CommandFactory, Parser, Subcommand};
use cli::handlers::{RunArgs, handle_run};

#[derive(Parser)]
#[command(version, about = "Mixed text and embedding prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a mixed prompt and generate a continuation
    Run(RunArgs),
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level),
    )
    .init();

    match cli.command {
        Some(Commands::Run(args)) => {
            handle_run(args);
        },
        None => {
            let mut cmd = Cli::command();
            let _ = cmd.print_help();
        },
    }
}
