//! Pipeline stages from uploaded file to model answer.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──┬─▶ image ───┐
//! (path/URL)            └─▶ extract ─┴─▶ encode ──▶ llm
//!                                         (base64)   (Gemini)
//! ```
//!
//! 1. [`input`]     — read a local file or download a URL, assign the
//!    declared media type
//! 2. [`normalize`] — the only branch: image, PDF, or refuse
//! 3. [`image`]     — pass image bytes through untouched
//! 4. [`extract`]   — PDF → concatenated page text via a scoped temp file;
//!    [`content`] turns one page's content stream into text
//! 5. [`encode`]    — base64-wrap the unit for the JSON request body
//! 6. [`llm`]       — one best-effort model call; the only stage with
//!    network I/O to the model

pub mod content;
pub mod encode;
pub mod extract;
pub mod image;
pub mod input;
pub mod llm;
pub mod normalize;
