//! Payload encoding: [`NormalizedInput`] → base64 inline blob.
//!
//! Gemini accepts binary parts as base64 strings embedded in the JSON body.
//! Both unit kinds go the same way: image bytes under their declared type,
//! extracted PDF text as UTF-8 under `text/plain`.

use crate::document::NormalizedInput;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A base64-encoded blob with its media type, ready for the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Encode a normalized unit for the model API.
pub fn encode_input(input: &NormalizedInput) -> InlineData {
    let data = STANDARD.encode(input.bytes());
    debug!(
        "Encoded {} → {} bytes base64",
        input.media_type(),
        data.len()
    );

    InlineData {
        mime_type: input.media_type().to_string(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_image_unit() {
        let unit = NormalizedInput::Image {
            media_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        let blob = encode_input(&unit);
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&blob.data).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn encode_text_unit_as_utf8() {
        let unit = NormalizedInput::Text {
            text: "Qté: 3 × 12,50 €".into(),
        };
        let blob = encode_input(&unit);
        assert_eq!(blob.mime_type, "text/plain");
        let decoded = String::from_utf8(STANDARD.decode(&blob.data).unwrap()).unwrap();
        assert_eq!(decoded, "Qté: 3 × 12,50 €");
    }

    #[test]
    fn serialises_with_gemini_field_names() {
        let blob = InlineData {
            mime_type: "text/plain".into(),
            data: "SGk=".into(),
        };
        let json = serde_json::to_value(&blob).unwrap();
        assert_eq!(json["mimeType"], "text/plain");
        assert_eq!(json["data"], "SGk=");
    }
}
