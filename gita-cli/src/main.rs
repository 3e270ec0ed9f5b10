use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use gita_core::config::Config;
use gita_core::{HttpGenerator, Server, Session};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gita")]
#[command(about = "Ask Krishna — Bhagavad Gita verse generation from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Ask a question and stream the generated verses")]
    Ask {
        #[arg(help = "Question or context, e.g. 'How can I find inner peace?'")]
        question: String,
    },

    #[command(about = "Run the unix socket server for UI shells")]
    Serve,

    #[command(about = "Show current configuration")]
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::load(&cli.config).context("Failed to load config")?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Ask { question } => ask(&config, &question).await,
        Commands::Serve => serve(&config).await,
        Commands::Config => show_config(&config),
    }
}

async fn ask(config: &Config, question: &str) -> Result<()> {
    let generator = Arc::new(HttpGenerator::new(&config.generator.endpoint));
    let session = Session::new(generator);

    println!("{} {}", "→".blue(), "Asking Krishna...".bold());
    println!();

    let mut printed = 0;
    let verses = session
        .ask(question, |update| {
            if update.done {
                return;
            }
            let delta = &update.text[printed..];
            printed = update.text.len();
            print!("{delta}");
            let _ = std::io::stdout().flush();
        })
        .await
        .context("Generation failed")?;

    println!();
    println!();

    if verses.is_empty() {
        println!("{}", "No labeled verses in the response.".yellow());
        return Ok(());
    }

    println!("{}", "Krishna say:".bold().green());
    println!();

    for record in verses {
        println!("  {} {}", "•".cyan(), record.verse.bold());
        if let Some(answer) = record.answer {
            if !answer.is_empty() {
                println!("    {answer}");
            }
        }
    }

    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let server = Server::new(config);
    server.start().await
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "Generator:".bold());
    println!("  Endpoint:    {}", config.generator.endpoint.cyan());
    println!();
    println!("{}", "Server:".bold());
    println!("  Socket Path: {}", config.server.socket_path);

    Ok(())
}
