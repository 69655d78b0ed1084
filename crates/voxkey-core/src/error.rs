use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by voxkey-core.
#[derive(Debug, Error)]
pub enum VoxkeyError {
    #[error("container has no audio track")]
    NoAudioTrack,

    #[error("audio decode error: {0}")]
    Decode(String),

    #[error("unsupported channel count: {0} (expected mono or stereo)")]
    UnsupportedChannelCount(usize),

    #[error("invalid WAV file: {0}")]
    WavFormat(String),

    #[error("unsupported WAV bit depth: {0} (expected 16 or 32)")]
    UnsupportedBitDepth(u16),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("no model loaded — load a model before transcribing")]
    ModelNotLoaded,

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("local inference is not available in this build")]
    EngineUnavailable,

    #[error("transcription produced no text")]
    EmptyTranscription,

    #[error("inference error: {0}")]
    Inference(String),

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model download failed: {0}")]
    Download(String),

    #[error("model '{model}' is corrupt: {detail}")]
    ModelCorrupt { model: &'static str, detail: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VoxkeyError>;
