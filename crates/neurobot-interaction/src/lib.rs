//! Model provider adapters.
//!
//! Currently a single provider: the Gemini REST API in streaming mode.

pub mod gemini_stream_provider;
pub mod sse;

pub use gemini_stream_provider::GeminiStreamProvider;
pub use sse::SseDecoder;
