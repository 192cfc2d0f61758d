//! gemini-telegram — Telegram Bot API tools for the Gemini CLI.
//!
//! Usage:
//!   gemini-telegram call <tool>   Invoke a tool (JSON arguments on stdin)
//!   gemini-telegram tools         List available tools and their schemas
//!   gemini-telegram install       Symlink this directory into ~/.gemini/extensions
//!   gemini-telegram uninstall     Remove the extension symlink

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{json, Value};

use gemini_telegram::credentials;
use gemini_telegram::dispatch;
use gemini_telegram::error::ExtensionError;
use gemini_telegram::install::{self, InstallOutcome, UninstallOutcome};
use gemini_telegram::registry;
use gemini_telegram::telegram::TelegramClient;
use gemini_telegram::types::ToolInvocation;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "gemini-telegram")]
#[command(version)]
#[command(about = "Telegram Bot API tools for the Gemini CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (debug, info, warn, error). Logs go to stderr.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Invoke a tool; arguments are a JSON object on stdin.
    Call {
        /// Tool name (send_message, read, get_me, ...).
        tool: String,

        /// Bot token override (otherwise TELEGRAM_BOT_TOKEN or .env).
        #[arg(long)]
        token: Option<String>,
    },

    /// List registered tools with their parameter schemas.
    Tools,

    /// Symlink the extension directory into the Gemini CLI extensions folder.
    Install {
        /// Extension directory to link (defaults to the current directory).
        #[arg(long, default_value = ".")]
        dir: String,
    },

    /// Remove the extension symlink if present.
    Uninstall,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs must stay off stdout: the CLI host reads the result payload there.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Call { tool, token } => match cmd_call(&tool, token).await {
            Ok(payload) => {
                println!("{payload}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e.to_json());
                ExitCode::FAILURE
            }
        },
        Commands::Tools => {
            cmd_tools();
            ExitCode::SUCCESS
        }
        Commands::Install { dir } => report(cmd_install(&dir)),
        Commands::Uninstall => report(cmd_uninstall()),
    }
}

fn report(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_call(tool: &str, token_override: Option<String>) -> Result<Value, ExtensionError> {
    let token = match token_override {
        Some(t) if !t.trim().is_empty() => t,
        _ => credentials::load_token()?,
    };

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let arguments: Value = if input.trim().is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(&input).map_err(|e| ExtensionError::Validation {
            param: "arguments",
            reason: format!("stdin is not valid JSON: {e}"),
        })?
    };

    let client = TelegramClient::new(&token);
    let invocation = ToolInvocation::new(tool, arguments);
    dispatch::dispatch(&client, &invocation).await
}

fn cmd_tools() {
    let tools: Vec<Value> = registry::TOOLS
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters_schema(),
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&Value::Array(tools)).unwrap_or_default()
    );
}

fn cmd_install(dir: &str) -> Result<()> {
    let source = PathBuf::from(shellexpand::tilde(dir).into_owned());
    match install::install(&source, &install::default_extensions_dir())? {
        InstallOutcome::Installed { link } => {
            println!(
                "{} Installed: {} -> {}",
                ">>>".green().bold(),
                link.display(),
                source.display()
            );
            println!("Restart the Gemini CLI to pick up the extension.");
        }
        InstallOutcome::AlreadyInstalled { link } => {
            println!(
                "{} Already installed at {}",
                ">>>".yellow().bold(),
                link.display()
            );
        }
    }
    Ok(())
}

fn cmd_uninstall() -> Result<()> {
    match install::uninstall(&install::default_extensions_dir())? {
        UninstallOutcome::Removed { link } => {
            println!("{} Uninstalled: {}", ">>>".green().bold(), link.display());
        }
        UninstallOutcome::NotInstalled { link } => {
            println!(
                "{} Not installed (nothing at {})",
                ">>>".yellow().bold(),
                link.display()
            );
        }
    }
    Ok(())
}
