pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "sitequote",
    about = "Sitequote operator CLI",
    long_about = "Apply migrations, inspect configuration, and explore plan catalogs and pricing.",
    after_help = "Examples:\n  sitequote migrate\n  sitequote catalog advanced\n  sitequote price selection.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Print the option table of one plan (basic|intermediate|advanced)")]
    Catalog {
        #[arg(help = "Plan key")]
        plan: String,
    },
    #[command(about = "Replay a JSON selection script and report the resulting price breakdown")]
    Price {
        #[arg(help = "Path to a JSON file with `planType` and `commands`")]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Catalog { plan } => commands::catalog::run(&plan),
        Command::Price { file } => commands::price::run(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
