//! Channel downmix and sample-rate conversion for decoded PCM.
//!
//! The inference engine wants mono 16 kHz. Recordings arrive at whatever
//! rate and channel count the device recorder picked (commonly 44.1 or
//! 48 kHz stereo), so every recording passes through here first.
//!
//! Rate conversion is linear interpolation between adjacent samples. That
//! is fine for speech intelligibility but it is not band-limited; do not
//! reuse this for music or any high-fidelity path.

use crate::error::{Result, VoxkeyError};

/// Sample rate the inference engine expects, in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Average one stereo frame down to a single sample.
///
/// Integer average with truncation toward zero: `(l + r) / 2` in i32.
/// The WAV reader uses this same function so both downmix sites agree
/// bit-for-bit.
#[inline]
pub(crate) fn mix_frame(left: i16, right: i16) -> i16 {
    ((left as i32 + right as i32) / 2) as i16
}

/// Downmix interleaved PCM to mono.
///
/// Mono input is returned unchanged. Stereo is averaged per frame with
/// [`mix_frame`]. Anything above two channels is rejected — the recording
/// pipeline never produces it, and silently mis-interleaving would be
/// worse than failing.
pub fn downmix_to_mono(samples: Vec<i16>, channels: u16) -> Result<Vec<i16>> {
    match channels {
        1 => Ok(samples),
        2 => Ok(samples
            .chunks_exact(2)
            .map(|frame| mix_frame(frame[0], frame[1]))
            .collect()),
        n => Err(VoxkeyError::UnsupportedChannelCount(n as usize)),
    }
}

/// Resample mono PCM from `from_rate` to `to_rate` by linear interpolation.
///
/// Output length is `floor(input_len * to_rate / from_rate)`. When the
/// rates already match the input is returned as-is, no reallocation.
/// The final output sample clamps to the last input sample rather than
/// reading past the end.
pub fn resample(samples: Vec<i16>, from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples;
    }

    let out_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let step = from_rate as f64 / to_rate as f64;

    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = pos as usize;
        let frac = pos - idx as f64;

        let current = samples[idx.min(samples.len() - 1)];
        let next = samples[(idx + 1).min(samples.len() - 1)];

        let interpolated = current as f64 + (next as f64 - current as f64) * frac;
        output.push(interpolated as i16);
    }

    output
}

/// Full conversion to the engine's format: mono at [`TARGET_SAMPLE_RATE`].
pub fn to_engine_format(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Result<Vec<i16>> {
    let mono = downmix_to_mono(samples, channels)?;
    Ok(resample(mono, sample_rate, TARGET_SAMPLE_RATE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_mono_passthrough() {
        let input = vec![1i16, -2, 3];
        let out = downmix_to_mono(input.clone(), 1).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn downmix_averages_with_truncation() {
        // (1 + 2) / 2 truncates to 1; (-1 + -2) / 2 truncates toward zero to -1
        let out = downmix_to_mono(vec![1, 2, -1, -2, 100, 200], 2).unwrap();
        assert_eq!(out, vec![1, -1, 150]);
    }

    #[test]
    fn downmix_is_idempotent_on_result() {
        let once = downmix_to_mono(vec![10, 20, 30, 40], 2).unwrap();
        let again = downmix_to_mono(once.clone(), 1).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn downmix_rejects_surround() {
        let err = downmix_to_mono(vec![0; 12], 6).unwrap_err();
        assert!(matches!(err, VoxkeyError::UnsupportedChannelCount(6)));
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let input = vec![5i16, 10, 15, 20];
        let out = resample(input.clone(), 16_000, 16_000);
        assert_eq!(out, input);
    }

    #[test]
    fn resample_length_law() {
        for (len, from, to) in [
            (44_100usize, 44_100u32, 16_000u32),
            (48_000, 48_000, 16_000),
            (1_000, 22_050, 16_000),
            (7, 44_100, 16_000),
            (16_000, 8_000, 16_000),
        ] {
            let out = resample(vec![0i16; len], from, to);
            let expected = (len as u64 * to as u64 / from as u64) as usize;
            assert_eq!(out.len(), expected, "len={len} from={from} to={to}");
        }
    }

    #[test]
    fn resample_interpolates_between_samples() {
        // Upsampling 2x: odd output samples sit halfway between neighbors
        let out = resample(vec![0i16, 100], 8_000, 16_000);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 50);
    }

    #[test]
    fn resample_clamps_final_sample() {
        // Last fractional position lands past the final input sample; the
        // neighbor lookup must clamp instead of reading out of bounds.
        let out = resample(vec![100i16; 3], 44_100, 16_000);
        assert!(out.iter().all(|&s| s == 100));
    }

    #[test]
    fn one_second_stereo_44k_becomes_16k_mono() {
        let stereo: Vec<i16> = vec![0; 44_100 * 2];
        let out = to_engine_format(stereo, 44_100, 2).unwrap();
        assert_eq!(out.len(), 16_000);
    }
}
