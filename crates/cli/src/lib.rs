pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "gtmscout",
    about = "GTM Scout operator CLI",
    long_about = "Try requirement extraction offline and inspect effective configuration.",
    after_help = "Examples:\n  gtmscout extract \"We're a fintech startup\"\n  gtmscout config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Extract requirements from one message as a fresh session would, printed as JSON"
    )]
    Extract {
        #[arg(help = "Message text to analyse", required = true, num_args = 1..)]
        message: Vec<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Extract { message } => commands::extract::run(&message.join(" ")),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
