//! docchat command line interface
//!
//! Index PDFs, ask one-off questions, chat interactively or run the HTTP server.

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use docchat_rag::{
    config::RagConfig, server::RagServer, Answer, DocumentChat, Error, IngestOutcome,
    IngestReport,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const GREETING: &str = "Greetings! I've processed your document. How can I help you?";
const TYPING_DELAY: Duration = Duration::from_millis(15);

/// Chat with your PDF documents
#[derive(Parser, Debug)]
#[command(name = "docchat", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to <config dir>/docchat/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index one or more PDF files
    Ingest {
        /// PDF files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask a single question
    Ask {
        /// The question
        question: String,
        /// Print the retrieved passages after the answer
        #[arg(long)]
        show_sources: bool,
    },
    /// Interactive chat session
    Chat {
        /// PDF to upload before the first question
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print answers at once instead of character by character
        #[arg(long)]
        no_typing: bool,
    },
    /// Run the HTTP server
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show index statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "docchat_rag=warn",
        1 => "docchat_rag=info",
        _ => "docchat_rag=debug,tower_http=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = RagConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let server = RagServer::new(config).await?;
            println!("Serving on http://{}", server.address());
            server.start().await?;
        }
        Commands::Ingest { files } => {
            let chat = open(config).await?;
            for file in files {
                let report = chat.process_document(&file).await?;
                print_report(&report);
            }
        }
        Commands::Ask {
            question,
            show_sources,
        } => {
            let chat = open(config).await?;
            let answer = chat.answer_question(&question).await?;
            println!("{}", answer.text);
            if show_sources {
                print_sources(&answer);
            }
        }
        Commands::Chat { file, no_typing } => {
            let chat = open(config).await?;
            chat_loop(&chat, file.as_deref(), !no_typing).await?;
        }
        Commands::Stats => print_stats(&open(config).await?).await?,
    }

    Ok(())
}

async fn open(config: RagConfig) -> anyhow::Result<DocumentChat> {
    DocumentChat::from_config(config)
        .await
        .context("failed to initialise document chat")
}

async fn print_stats(chat: &DocumentChat) -> anyhow::Result<()> {
    let stats = chat.stats().await?;
    println!("{} {}", style("Entries:").bold(), stats.entries);
    println!("{} {}", style("Documents:").bold(), stats.documents);
    match stats.dimension {
        Some(dim) => println!("{} {}", style("Dimension:").bold(), dim),
        None => println!("{} {}", style("Dimension:").bold(), style("(empty index)").dim()),
    }
    for doc in chat.documents().await? {
        println!(
            "  {} {} pages, {} bytes, {}",
            style(&doc.filename).cyan(),
            doc.page_count,
            doc.file_size,
            doc.ingested_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

async fn chat_loop(chat: &DocumentChat, file: Option<&Path>, typing: bool) -> anyhow::Result<()> {
    println!("{}", style("Document chat").cyan().bold());
    println!(
        "{}",
        style("Commands: /upload <pdf>, /stats, /quit. Anything else is a question.").dim()
    );

    let mut greeted = false;
    if let Some(path) = file {
        greeted = upload(chat, path, greeted, typing).await;
    } else if !chat.has_documents().await? {
        println!("Upload a PDF with /upload <path> to get started.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/stats" => {
                let stats = chat.stats().await?;
                println!("{} entries from {} documents", stats.entries, stats.documents);
            }
            _ if line.starts_with("/upload") => {
                let path = line.trim_start_matches("/upload").trim();
                if path.is_empty() {
                    println!("{}", style("usage: /upload <path-to-pdf>").yellow());
                } else {
                    greeted = upload(chat, Path::new(path), greeted, typing).await;
                }
            }
            question => match chat.answer_question(question).await {
                Ok(answer) => reveal(&answer.text, typing).await?,
                Err(e) => eprintln!("{} {}", style("Query failed:").red().bold(), e),
            },
        }
    }

    Ok(())
}

/// Copy `path` into the data directory and index it; greet once after the
/// first successful upload. Returns the new greeted flag.
async fn upload(chat: &DocumentChat, path: &Path, greeted: bool, typing: bool) -> bool {
    println!("{}", style(format!("Processing {}...", path.display())).dim());
    let result = match tokio::fs::read(path).await {
        Ok(bytes) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            chat.upload_document(&name, &bytes).await
        }
        Err(e) => Err(Error::load(path.display().to_string(), e.to_string())),
    };

    match result {
        Ok(report) => {
            print_report(&report);
            if !greeted {
                if let Err(e) = reveal(GREETING, typing).await {
                    tracing::debug!(error = %e, "Failed to write greeting");
                }
            }
            true
        }
        Err(e) => {
            eprintln!("{} {}", style("Upload failed:").red().bold(), e);
            greeted
        }
    }
}

/// Print `text` one character at a time
async fn reveal(text: &str, typing: bool) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    if typing {
        for ch in text.chars() {
            write!(stdout, "{}", ch)?;
            stdout.flush()?;
            tokio::time::sleep(TYPING_DELAY).await;
        }
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{}", text)?;
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    match &report.outcome {
        IngestOutcome::Indexed { chunks } => println!(
            "{} {} ({} pages, {} chunks, {} ms)",
            style("Indexed").green().bold(),
            report.document.filename,
            report.document.page_count,
            chunks,
            report.elapsed_ms
        ),
        IngestOutcome::Skipped { reason } => println!(
            "{} {}: {}",
            style("Skipped").yellow().bold(),
            report.document.filename,
            reason
        ),
    }
}

fn print_sources(answer: &Answer) {
    for (i, source) in answer.sources.iter().enumerate() {
        println!(
            "\n{} {} p.{} (score {:.3})",
            style(format!("[{}]", i + 1)).cyan(),
            source.chunk.source.filename,
            source.chunk.source.page_number,
            source.score
        );
        println!("{}", style(&source.chunk.content).dim());
    }
}
