//! # po-qa
//!
//! Ask natural-language questions about purchase orders (PO) and log
//! reviewer feedback on the answers.
//!
//! A PO arrives as an image (JPEG/PNG) or a PDF. Images go to the model
//! as-is; PDFs are reduced to their text first. The question, the document
//! and a fixed system instruction are sent to Gemini, and the answer comes
//! back for a customer-service reviewer to mark correct or incorrect. Each
//! review is appended as one line to a local log file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file / URL
//!  │
//!  ├─ 1. Input      read or download, assign the declared media type
//!  ├─ 2. Normalise  image → bytes as-is, PDF → page text (lopdf, temp file)
//!  ├─ 3. Encode     base64 inline blob
//!  ├─ 4. Ask        one Gemini call; failure → outcome with no response
//!  └─ 5. Review     verdict + comment appended to feedback_log.txt
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use po_qa::{Assistant, AssistantConfig, Verdict};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GOOGLE_API_KEY (or GEMINI_API_KEY)
//!     let assistant = Assistant::new(AssistantConfig::from_env())?;
//!     let po = assistant.prepare_path("po.pdf", None).await?;
//!     let outcome = assistant.ask("What is the total amount?", Some(&po)).await?;
//!     match &outcome.response {
//!         Some(answer) => println!("{answer}"),
//!         None => eprintln!("No response received: {:?}", outcome.error),
//!     }
//!     assistant
//!         .record_feedback(&outcome.feedback(Verdict::Correct, ""))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `po-qa` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assistant;
pub mod config;
pub mod document;
pub mod error;
pub mod feedback;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod provider;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assistant::{ask_sync, Assistant};
pub use config::{ApiKey, AssistantConfig, AssistantConfigBuilder};
pub use document::{DocumentKind, ImageMediaType, NormalizedInput, UploadedDocument};
pub use error::{ModelCallError, PoQaError};
pub use feedback::{FeedbackLog, FeedbackRecord, Verdict};
pub use output::QueryOutcome;
pub use pipeline::extract::{extract_page_texts, extract_text};
pub use pipeline::image::adapt_image;
pub use pipeline::input::resolve_upload;
pub use pipeline::llm::{query_model, ContextPart, QueryRequest};
pub use pipeline::normalize::{normalize, normalize_async};
pub use provider::{GeminiProvider, Generation, GenerativeModel};

/// Re-exported so downstream crates can implement [`GenerativeModel`]
/// without adding `async-trait` themselves.
pub use async_trait::async_trait;
