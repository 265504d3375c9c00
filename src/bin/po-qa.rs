//! CLI binary for po-qa.
//!
//! A thin shim over the library crate: upload, ask, review. Each
//! subcommand is one user action run to completion.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use po_qa::{
    normalize_async, resolve_upload, Assistant, AssistantConfig, AssistantConfigBuilder,
    FeedbackLog, FeedbackRecord, NormalizedInput, Verdict,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preview what the model will see (no API key needed)
  po-qa inspect po.pdf

  # Ask a question
  po-qa ask po.png --query "What is the total amount?"

  # Ask, then record the reviewer's verdict
  po-qa ask po.pdf -Q "Who is the supplier?" --verdict no --feedback "Wrong vendor"

  # Record feedback on its own
  po-qa feedback --query "Total?" --response '$500' --verdict yes

SUPPORTED UPLOADS:
  .jpg .jpeg .png   sent to the model as images
  .pdf              text extracted from every page, sent as text/plain
  anything else     refused before any model call

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY       Gemini API key (GEMINI_API_KEY also accepted)
  PO_QA_MODEL          Override model ID (default gemini-1.5-flash)
  PO_QA_FEEDBACK_LOG   Feedback log path (default feedback_log.txt)
  RUST_LOG             Log filter, e.g. po_qa=debug
"#;

/// Ask questions about purchase orders and log reviewer feedback.
#[derive(Parser, Debug)]
#[command(
    name = "po-qa",
    version,
    about = "Ask questions about purchase-order images and PDFs with Gemini",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PO_QA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "PO_QA_QUIET")]
    quiet: bool,

    /// Feedback log file.
    #[arg(long, global = true, env = "PO_QA_FEEDBACK_LOG")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalise a document and preview what the model would receive.
    Inspect {
        #[command(flatten)]
        upload: UploadArgs,

        /// Print the normalised unit as JSON metadata.
        #[arg(long)]
        json: bool,
    },

    /// Ask a question about a document.
    Ask {
        #[command(flatten)]
        upload: UploadArgs,

        /// Question about the purchase order.
        #[arg(short = 'Q', long = "query", alias = "question")]
        query: String,

        #[command(flatten)]
        model: ModelArgs,

        /// Reviewer verdict for the answer (yes/no); appends to the feedback log.
        #[arg(long)]
        verdict: Option<Verdict>,

        /// Free-text reviewer feedback (used with --verdict).
        #[arg(long, default_value = "")]
        feedback: String,

        /// Output the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Append a feedback record without asking anything.
    Feedback {
        /// The question that was asked.
        #[arg(long)]
        query: String,

        /// The answer that was shown; omit when there was none.
        #[arg(long)]
        response: Option<String>,

        /// Was the answer correct? (yes/no)
        #[arg(long)]
        verdict: Verdict,

        /// Free-text feedback.
        #[arg(long, default_value = "")]
        feedback: String,
    },
}

#[derive(Args, Debug)]
struct UploadArgs {
    /// Local file path or HTTP/HTTPS URL (JPG, JPEG, PNG or PDF).
    input: String,

    /// Declared media type; inferred from the extension when omitted.
    #[arg(long)]
    media_type: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(
        long,
        env = "PO_QA_DOWNLOAD_TIMEOUT",
        default_value_t = 120,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Gemini model ID.
    #[arg(long, env = "PO_QA_MODEL")]
    model: Option<String>,

    /// API key (prefer the GOOGLE_API_KEY environment variable).
    #[arg(long)]
    api_key: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PO_QA_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PO_QA_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens.
    #[arg(long, env = "PO_QA_MAX_TOKENS")]
    max_tokens: Option<u32>,

    /// Per-call timeout in seconds (default: wait for the service).
    #[arg(long, env = "PO_QA_API_TIMEOUT")]
    api_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Inspect { upload, json } => run_inspect(&cli, upload, *json).await,
        Command::Ask {
            upload,
            query,
            model,
            verdict,
            feedback,
            json,
        } => run_ask(&cli, upload, query, model, *verdict, feedback, *json).await,
        Command::Feedback {
            query,
            response,
            verdict,
            feedback,
        } => {
            let record = FeedbackRecord {
                query: query.clone(),
                response: response.clone(),
                validation: *verdict,
                feedback: feedback.clone(),
            };
            let log = FeedbackLog::new(base_config(&cli).feedback_log);
            log.append(&record).await.context("Could not save feedback")?;
            if !cli.quiet {
                eprintln!(
                    "{} Feedback submitted. Thank you for helping improve the system!",
                    green("✔")
                );
            }
            Ok(())
        }
    }
}

async fn run_inspect(cli: &Cli, upload: &UploadArgs, json: bool) -> Result<()> {
    let config = base_config(cli);
    let doc = resolve_upload(
        &upload.input,
        upload.media_type.as_deref(),
        upload.download_timeout,
    )
    .await
    .context("Failed to load document")?;
    let name = doc.name().unwrap_or(&upload.input).to_string();
    let declared = doc.media_type().to_string();

    let unit = normalize_async(doc, config.scratch_dir.clone())
        .await
        .context("Error processing document")?;

    if json {
        let summary = serde_json::json!({
            "input": name,
            "declared_media_type": declared,
            "media_type": unit.media_type(),
            "kind": if unit.is_image() { "image" } else { "text" },
            "bytes": unit.bytes().len(),
            "preview": unit.preview(config.preview_chars),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else {
        println!("File:         {}", name);
        println!("Declared:     {}", declared);
        println!("Sent as:      {}", unit.media_type());
        println!("Size:         {} bytes", unit.bytes().len());
        if let NormalizedInput::Text { .. } = unit {
            println!();
            println!("{}", bold("Uploaded PDF Content Preview"));
        }
        println!("{}", unit.preview(config.preview_chars));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_ask(
    cli: &Cli,
    upload: &UploadArgs,
    query: &str,
    model: &ModelArgs,
    verdict: Option<Verdict>,
    feedback: &str,
    json: bool,
) -> Result<()> {
    let config = build_config(cli, upload, model).await?;
    let assistant = Assistant::new(config).context("Model setup failed")?;

    let unit = assistant
        .prepare_path(&upload.input, upload.media_type.as_deref())
        .await
        .context("Error processing document")?;

    let spinner = (!cli.quiet && !json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("Asking {}…", assistant.provider().model()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = assistant
        .ask(query, Some(&unit))
        .await
        .context("Could not ask the question")?;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
        );
    } else {
        match (&outcome.response, &outcome.error) {
            (Some(answer), _) => {
                if !cli.quiet {
                    eprintln!("{}", bold("System Response"));
                }
                println!("{answer}");
                if !cli.quiet {
                    eprintln!(
                        "{}",
                        dim(&format!(
                            "{} tokens in / {} tokens out — {}ms",
                            outcome.prompt_tokens, outcome.output_tokens, outcome.duration_ms
                        ))
                    );
                }
            }
            (None, error) => {
                eprintln!(
                    "{} No response received. Check model setup or query.",
                    yellow("⚠")
                );
                if let Some(e) = error {
                    eprintln!("  {}", dim(&e.to_string()));
                }
            }
        }
    }

    if let Some(verdict) = verdict {
        let record = outcome.feedback(verdict, feedback);
        assistant
            .record_feedback(&record)
            .await
            .context("Could not save feedback")?;
        if !cli.quiet {
            eprintln!(
                "{} Feedback submitted to {}",
                green("✔"),
                assistant.feedback_log().path().display()
            );
        }
    }

    Ok(())
}

/// Environment config with the global flags applied.
fn base_config(cli: &Cli) -> AssistantConfig {
    let mut config = AssistantConfig::from_env();
    if let Some(ref path) = cli.log_file {
        config.feedback_log = path.clone();
    }
    config
}

/// Map CLI args to `AssistantConfig`.
async fn build_config(cli: &Cli, upload: &UploadArgs, model: &ModelArgs) -> Result<AssistantConfig> {
    let mut builder = AssistantConfigBuilder::from_config(base_config(cli))
        .download_timeout_secs(upload.download_timeout);

    if let Some(ref key) = model.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref m) = model.model {
        builder = builder.model(m.clone());
    }
    if let Some(ref path) = model.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(t) = model.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = model.max_tokens {
        builder = builder.max_output_tokens(n);
    }
    if let Some(secs) = model.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}
