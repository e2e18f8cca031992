//! Voice message processing for the paivand chat platform.
//!
//! A voice upload is answered immediately with a placeholder message; a
//! detached background task then transcribes the audio, translates the
//! transcript, persists the enriched fields, and notifies connected
//! clients. Every stage degrades gracefully: a missing transcription
//! credential or a failed translation leaves the message audio-only
//! rather than failing the upload.

pub mod error;
pub mod pipeline;
pub mod transcribe;

pub use error::PipelineError;
pub use pipeline::{VoiceMessageParams, VoicePipeline};
pub use transcribe::{DeepgramConfig, DeepgramTranscriber, TranscriptionAdapter};
