//! System prompt for purchase-order question answering.
//!
//! Override per instance via
//! [`crate::config::AssistantConfig::system_prompt`].

/// Default system instruction sent with every question.
///
/// Sent as the last part of the request context, after the question and
/// the document.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert in understanding purchase orders. \
You will receive input images as POs or PDF content as text, \
and you will answer questions based on the input document.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_both_input_kinds() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("purchase orders"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("images"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("PDF content as text"));
    }
}
