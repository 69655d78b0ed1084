//! Binding to the whisper.cpp inference engine.
//!
//! [`SpeechEngine`] owns at most one loaded model context. Loading a new
//! model releases the previous one first; unloading is idempotent. The
//! engine holds no internal locking — callers run at most one
//! load/transcribe/unload session at a time, which `&mut self` enforces
//! within one engine value.
//!
//! Builds without the `whisper` feature (cloud-only variants) get a stub
//! with the same surface that reports [`VoxkeyError::EngineUnavailable`],
//! so the capability is a constructor-time fact rather than a linker
//! crash.

/// Fixed inference thread count. Small on purpose: the engine runs behind
/// a foreground app and must not starve it by grabbing every core.
pub const INFERENCE_THREADS: i32 = 4;

#[cfg(feature = "whisper")]
pub use real::SpeechEngine;

#[cfg(not(feature = "whisper"))]
pub use stub::SpeechEngine;

/// Normalize a language hint: empty or "auto" means auto-detect.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
fn normalize_language(hint: &str) -> &str {
    if hint.is_empty() {
        "auto"
    } else {
        hint
    }
}

#[cfg(feature = "whisper")]
mod real {
    use std::fs::File;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    use super::{normalize_language, INFERENCE_THREADS};
    use crate::error::{Result, VoxkeyError};
    use crate::wav;

    /// Run a closure with stderr redirected to /dev/null. whisper.cpp
    /// prints model metadata on stderr with no API to silence it.
    fn with_stderr_suppressed<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let Ok(devnull) = File::open("/dev/null") else {
            return f();
        };
        let stderr_fd = 2;
        let saved_fd = unsafe { libc::dup(stderr_fd) };
        if saved_fd < 0 {
            return f();
        }
        unsafe { libc::dup2(devnull.as_raw_fd(), stderr_fd) };

        let result = f();

        unsafe { libc::dup2(saved_fd, stderr_fd) };
        unsafe { libc::close(saved_fd) };
        result
    }

    /// Stateful wrapper around the native whisper context.
    pub struct SpeechEngine {
        ctx: Option<WhisperContext>,
        verbose: bool,
    }

    impl SpeechEngine {
        pub fn new() -> Self {
            Self {
                ctx: None,
                verbose: false,
            }
        }

        /// Echo native whisper logs instead of suppressing them.
        pub fn with_verbose(mut self, verbose: bool) -> Self {
            self.verbose = verbose;
            self
        }

        /// Whether this build carries the native engine at all.
        pub fn available() -> bool {
            true
        }

        /// Load model weights from `path`, releasing any previously loaded
        /// context first. The engine never holds two contexts.
        pub fn load_model(&mut self, path: &Path) -> Result<()> {
            if !path.exists() {
                return Err(VoxkeyError::FileNotFound(path.to_path_buf()));
            }

            // Release the old context before the new load so peak memory
            // stays at one model.
            self.ctx = None;

            let path_str = path
                .to_str()
                .ok_or_else(|| VoxkeyError::ModelLoad(format!("non-UTF8 path: {path:?}")))?;

            tracing::info!(model = %path.display(), "loading model");
            let load = || {
                WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            };
            let ctx = if self.verbose {
                load()
            } else {
                with_stderr_suppressed(load)
            }
            .map_err(|e| VoxkeyError::ModelLoad(e.to_string()))?;

            self.ctx = Some(ctx);
            Ok(())
        }

        /// Transcribe a 16 kHz mono WAV file.
        ///
        /// One-shot batch inference: greedy sampling, no carried context
        /// between calls, no partial/streaming output. Segment texts are
        /// concatenated in order with no added separators (whisper already
        /// includes leading spaces).
        pub fn transcribe(
            &mut self,
            audio_path: &Path,
            language: &str,
            translate: bool,
        ) -> Result<String> {
            let Some(ctx) = self.ctx.as_ref() else {
                return Err(VoxkeyError::ModelNotLoaded);
            };
            if !audio_path.exists() {
                return Err(VoxkeyError::FileNotFound(audio_path.to_path_buf()));
            }

            let (pcm, sample_rate) = wav::read_wav_mono_f32(audio_path)?;
            if sample_rate != crate::resample::TARGET_SAMPLE_RATE {
                tracing::warn!(
                    sample_rate,
                    "WAV is not at the engine's expected rate; output quality will suffer"
                );
            }

            let lang = normalize_language(language);

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_print_special(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);
            params.set_translate(translate);
            params.set_language(Some(lang));
            params.set_n_threads(INFERENCE_THREADS);
            params.set_no_context(true);
            params.set_single_segment(false);

            tracing::info!(
                audio = %audio_path.display(),
                samples = pcm.len(),
                language = lang,
                translate,
                "starting transcription"
            );

            let state_result = if self.verbose {
                ctx.create_state()
            } else {
                with_stderr_suppressed(|| ctx.create_state())
            };
            let mut state =
                state_result.map_err(|e| VoxkeyError::Inference(format!("create state: {e}")))?;

            state
                .full(params, &pcm)
                .map_err(|e| VoxkeyError::Inference(format!("inference failed: {e}")))?;

            let num_segments = state
                .full_n_segments()
                .map_err(|e| VoxkeyError::Inference(format!("segment count: {e}")))?;

            let mut text = String::new();
            for i in 0..num_segments {
                let segment = state
                    .full_get_segment_text(i)
                    .map_err(|e| VoxkeyError::Inference(format!("segment {i}: {e}")))?;
                text.push_str(&segment);
            }

            if text.is_empty() {
                return Err(VoxkeyError::EmptyTranscription);
            }

            tracing::info!(segments = num_segments, chars = text.len(), "transcription done");
            Ok(text)
        }

        /// Release the loaded model, if any. Safe to call repeatedly.
        pub fn unload(&mut self) {
            if self.ctx.take().is_some() {
                tracing::info!("model unloaded");
            }
        }

        pub fn is_loaded(&self) -> bool {
            self.ctx.is_some()
        }
    }

    impl Default for SpeechEngine {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(not(feature = "whisper"))]
mod stub {
    use std::path::Path;

    use crate::error::{Result, VoxkeyError};

    /// Placeholder engine for cloud-only builds. Every mutating call
    /// reports the engine as unavailable; queries answer honestly.
    pub struct SpeechEngine {
        _private: (),
    }

    impl SpeechEngine {
        pub fn new() -> Self {
            Self { _private: () }
        }

        pub fn with_verbose(self, _verbose: bool) -> Self {
            self
        }

        pub fn available() -> bool {
            false
        }

        pub fn load_model(&mut self, _path: &Path) -> Result<()> {
            Err(VoxkeyError::EngineUnavailable)
        }

        pub fn transcribe(
            &mut self,
            _audio_path: &Path,
            _language: &str,
            _translate: bool,
        ) -> Result<String> {
            Err(VoxkeyError::EngineUnavailable)
        }

        pub fn unload(&mut self) {}

        pub fn is_loaded(&self) -> bool {
            false
        }
    }

    impl Default for SpeechEngine {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[allow(unused_imports)]
    use crate::error::VoxkeyError;
    #[allow(unused_imports)]
    use std::path::Path;

    #[test]
    fn language_hint_normalization() {
        assert_eq!(normalize_language(""), "auto");
        assert_eq!(normalize_language("auto"), "auto");
        assert_eq!(normalize_language("de"), "de");
    }

    #[cfg(feature = "whisper")]
    mod with_engine {
        use super::*;

        #[test]
        fn transcribe_without_model_fails_fast() {
            let mut engine = SpeechEngine::new();
            assert!(!engine.is_loaded());
            let err = engine
                .transcribe(Path::new("clip.wav"), "auto", false)
                .unwrap_err();
            assert!(matches!(err, VoxkeyError::ModelNotLoaded));
        }

        #[test]
        fn load_missing_model_is_not_found() {
            let mut engine = SpeechEngine::new();
            let err = engine
                .load_model(Path::new("/nonexistent/ggml-tiny.bin"))
                .unwrap_err();
            assert!(matches!(err, VoxkeyError::FileNotFound(_)));
            assert!(!engine.is_loaded());
        }

        #[test]
        fn unload_is_idempotent() {
            let mut engine = SpeechEngine::new();
            engine.unload();
            engine.unload();
            assert!(!engine.is_loaded());
        }
    }

    #[cfg(not(feature = "whisper"))]
    mod without_engine {
        use super::*;

        #[test]
        fn stub_reports_unavailable() {
            assert!(!SpeechEngine::available());
            let mut engine = SpeechEngine::new();
            let err = engine.load_model(Path::new("model.bin")).unwrap_err();
            assert!(matches!(err, VoxkeyError::EngineUnavailable));
            assert!(!engine.is_loaded());
        }
    }
}
