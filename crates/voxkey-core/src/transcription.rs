//! The local transcription strategy: one recorded container in, text out.
//!
//! Stages run strictly in sequence on the caller's thread — decode,
//! downmix/resample, temp-WAV hand-off, inference. Everything here blocks
//! for real time (seconds of I/O and CPU), so callers dispatch onto a
//! background worker, never a UI thread. One request at a time: the
//! `&mut SpeechEngine` borrow keeps a second session from starting while
//! one is in flight.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::decode;
use crate::engine::SpeechEngine;
use crate::error::Result;
use crate::resample::{self, TARGET_SAMPLE_RATE};
use crate::wav;

/// One transcription job. Stateless and one-shot.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Recorded container file (AAC-in-MP4 from the device recorder).
    pub audio: PathBuf,
    /// ISO language hint; empty or "auto" lets the model detect.
    pub language: String,
    /// Translate the result to English instead of transcribing verbatim.
    pub translate: bool,
}

impl TranscriptionRequest {
    pub fn new(audio: impl Into<PathBuf>) -> Self {
        Self {
            audio: audio.into(),
            language: String::new(),
            translate: false,
        }
    }
}

/// Decode a recording and convert it to the engine's format
/// (mono, 16 kHz, 16-bit).
pub fn prepare_pcm(audio: &Path) -> Result<Vec<i16>> {
    let decoded = decode::decode_container(audio)?;
    tracing::debug!(
        sample_rate = decoded.sample_rate,
        channels = decoded.channels,
        duration_secs = decoded.duration_secs(),
        "decoded recording"
    );
    resample::to_engine_format(decoded.samples, decoded.sample_rate, decoded.channels)
}

/// Run the full pipeline for one recording.
///
/// The intermediate WAV lives in a [`NamedTempFile`]; its drop guard
/// deletes it on every exit path, error or not, so repeated recordings
/// never accumulate cache debris.
pub fn transcribe_recording(
    engine: &mut SpeechEngine,
    request: &TranscriptionRequest,
) -> Result<String> {
    let pcm = prepare_pcm(&request.audio)?;

    let temp = NamedTempFile::with_suffix(".wav")?;
    wav::write_wav(temp.path(), &pcm, TARGET_SAMPLE_RATE, 1)?;

    engine.transcribe(temp.path(), &request.language, request.translate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_pcm_full_pipeline_length() {
        // 1 second of 44.1 kHz stereo in a WAV container should come out
        // as ~16000 mono samples
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.wav");
        let stereo: Vec<i16> = (0..44_100 * 2).map(|i| (i % 7) as i16 * 100).collect();
        wav::write_wav(&path, &stereo, 44_100, 2).unwrap();

        let pcm = prepare_pcm(&path).unwrap();
        assert_eq!(pcm.len(), 16_000);
    }

    #[test]
    fn prepare_pcm_16k_mono_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.wav");
        let mono: Vec<i16> = (0..16_000).map(|i| (i % 11) as i16).collect();
        wav::write_wav(&path, &mono, TARGET_SAMPLE_RATE, 1).unwrap();

        let pcm = prepare_pcm(&path).unwrap();
        assert_eq!(pcm, mono);
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn failed_request_reports_model_not_loaded() {
        use crate::error::VoxkeyError;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.wav");
        let mono: Vec<i16> = vec![0; 16_000];
        wav::write_wav(&path, &mono, TARGET_SAMPLE_RATE, 1).unwrap();

        let mut engine = SpeechEngine::new();
        let err = transcribe_recording(&mut engine, &TranscriptionRequest::new(&path)).unwrap_err();
        assert!(matches!(err, VoxkeyError::ModelNotLoaded));
    }
}
