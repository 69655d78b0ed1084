//! WAV read/write — the hand-off format between the decode pipeline and
//! the inference engine.
//!
//! Writing always produces 16-bit signed little-endian PCM. Reading
//! accepts 16-bit and 32-bit integer PCM and normalizes both to f32 in
//! [-1, 1]. Stereo input is averaged down to mono in the integer domain
//! with the same rule as [`crate::resample::downmix_to_mono`], so the two
//! downmix sites cannot drift apart.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{Result, VoxkeyError};
use crate::resample::mix_frame;

/// Write interleaved 16-bit PCM to `path`.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| VoxkeyError::WavFormat(format!("failed to create {}: {e}", path.display())))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| VoxkeyError::WavFormat(format!("failed to write sample: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| VoxkeyError::WavFormat(format!("failed to finalize WAV: {e}")))?;

    Ok(())
}

/// Read a WAV file as normalized mono f32 samples plus its sample rate.
///
/// The RIFF/WAVE magic is validated before any other header field is
/// trusted; a bad magic fails with a format error rather than best-effort
/// parsing. 16-bit samples divide by 32768, 32-bit by 2147483648; stereo
/// is averaged per frame before normalizing.
pub fn read_wav_mono_f32(path: &Path) -> Result<(Vec<f32>, u32)> {
    if !path.exists() {
        return Err(VoxkeyError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = WavReader::open(path)
        .map_err(|e| VoxkeyError::WavFormat(format!("{}: {e}", path.display())))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int {
        return Err(VoxkeyError::WavFormat(format!(
            "unsupported sample format {:?} (expected integer PCM)",
            spec.sample_format
        )));
    }
    if spec.channels == 0 || spec.channels > 2 {
        return Err(VoxkeyError::UnsupportedChannelCount(spec.channels as usize));
    }

    let samples = match spec.bits_per_sample {
        16 => {
            let raw = reader
                .samples::<i16>()
                .collect::<std::result::Result<Vec<i16>, _>>()
                .map_err(|e| VoxkeyError::WavFormat(format!("failed to read PCM data: {e}")))?;
            normalize_i16(&raw, spec.channels)
        }
        32 => {
            let raw = reader
                .samples::<i32>()
                .collect::<std::result::Result<Vec<i32>, _>>()
                .map_err(|e| VoxkeyError::WavFormat(format!("failed to read PCM data: {e}")))?;
            normalize_i32(&raw, spec.channels)
        }
        other => return Err(VoxkeyError::UnsupportedBitDepth(other)),
    };

    tracing::debug!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate = spec.sample_rate,
        "read WAV"
    );

    Ok((samples, spec.sample_rate))
}

fn normalize_i16(raw: &[i16], channels: u16) -> Vec<f32> {
    if channels == 2 {
        raw.chunks_exact(2)
            .map(|frame| mix_frame(frame[0], frame[1]) as f32 / 32768.0)
            .collect()
    } else {
        raw.iter().map(|&s| s as f32 / 32768.0).collect()
    }
}

fn normalize_i32(raw: &[i32], channels: u16) -> Vec<f32> {
    if channels == 2 {
        raw.chunks_exact(2)
            .map(|frame| (((frame[0] as i64 + frame[1] as i64) / 2) as i32) as f32 / 2147483648.0)
            .collect()
    } else {
        raw.iter().map(|&s| s as f32 / 2147483648.0).collect()
    }
}
