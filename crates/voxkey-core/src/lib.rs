//! voxkey-core — on-device dictation pipeline.
//!
//! A recorded voice memo goes through four sequential stages:
//!
//! ```text
//! container file → decode (AAC/MP4 → PCM) → resample (mono 16 kHz)
//!                → temp WAV → SpeechEngine (whisper.cpp) → text
//! ```
//!
//! All stages are blocking and belong on a background worker thread.
//! Model weights on disk are owned by [`ModelManager`].

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod models;
pub mod resample;
pub mod transcription;
pub mod wav;

pub use config::Config;
pub use decode::{decode_container, DecodedAudio};
pub use engine::{SpeechEngine, INFERENCE_THREADS};
pub use error::{Result, VoxkeyError};
pub use models::{DownloadProgress, Model, ModelManager, ModelState, ProgressCallback};
pub use resample::TARGET_SAMPLE_RATE;
pub use transcription::{transcribe_recording, TranscriptionRequest};
