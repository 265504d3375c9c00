//! End-to-end tests against the live Gemini API.
//!
//! Gated behind `E2E_ENABLED` and a `GOOGLE_API_KEY` so they never run in CI
//! unless explicitly requested. Documents live in `./test_cases/`.
//!
//! Run with:
//!   E2E_ENABLED=1 GOOGLE_API_KEY=... cargo test --test e2e -- --nocapture

use po_qa::{Assistant, AssistantConfig, FeedbackRecord, Verdict};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip unless E2E_ENABLED is set, a key is available and the file exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if AssistantConfig::from_env().api_key.is_none() {
            println!("SKIP — GOOGLE_API_KEY not set");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("po_qa=debug")
        .with_test_writer()
        .try_init();
}

async fn ask_live(path: PathBuf, question: &str) -> Option<String> {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = AssistantConfig::builder()
        .feedback_log(dir.path().join("feedback_log.txt"))
        .api_timeout_secs(120)
        .build()
        .unwrap();
    let assistant = Assistant::new(config).unwrap();

    let unit = assistant
        .prepare_path(path.to_str().unwrap(), None)
        .await
        .unwrap();
    let outcome = assistant.ask(question, Some(&unit)).await.unwrap();
    println!("Q: {question}\nA: {:?}\nerror: {:?}", outcome.response, outcome.error);

    let record: FeedbackRecord = outcome.feedback(Verdict::Correct, "e2e");
    assistant.record_feedback(&record).await.unwrap();
    let log = std::fs::read_to_string(assistant.feedback_log().path()).unwrap();
    assert_eq!(log.lines().count(), 1);

    outcome.response
}

#[tokio::test]
async fn e2e_pdf_purchase_order() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("purchase_order.pdf"));
    let answer = ask_live(path, "What is the total amount of this purchase order?").await;
    assert!(
        answer.is_some_and(|a| !a.trim().is_empty()),
        "expected a non-empty answer"
    );
}

#[tokio::test]
async fn e2e_png_purchase_order() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("purchase_order.png"));
    let answer = ask_live(path, "Who is the supplier on this purchase order?").await;
    assert!(
        answer.is_some_and(|a| !a.trim().is_empty()),
        "expected a non-empty answer"
    );
}
