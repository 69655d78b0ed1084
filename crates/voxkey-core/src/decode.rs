//! Compressed-container decoding: AAC-in-MP4 voice memos (and raw WAV)
//! down to interleaved 16-bit PCM at the stream's native rate.
//!
//! The decoder produces output in arbitrarily sized chunks and may buffer
//! packets internally, so the loop drains every decoded buffer and treats
//! end-of-stream as a condition reported by the demuxer, not as input
//! exhaustion. All codec and stream resources are released by drop on
//! every exit path.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Result, VoxkeyError};

/// Raw PCM pulled out of a recorded container.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved 16-bit samples at the stream's native layout.
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    /// Duration in seconds, for logging and sanity checks.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Decode one recorded container file into raw PCM.
///
/// Fails with [`VoxkeyError::NoAudioTrack`] when the container holds no
/// audio stream, and [`VoxkeyError::Decode`] for malformed streams or
/// decoder initialization failures.
pub fn decode_container(path: &Path) -> Result<DecodedAudio> {
    if !path.exists() {
        return Err(VoxkeyError::FileNotFound(path.to_path_buf()));
    }

    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VoxkeyError::Decode(format!("failed to probe {}: {e}", path.display())))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(VoxkeyError::NoAudioTrack)?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| VoxkeyError::Decode(format!("decoder init failed: {e}")))?;

    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16);
    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // The demuxer signals end-of-stream as an unexpected-EOF IO
            // error; anything else is a real failure.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(VoxkeyError::Decode(format!(
                    "demux error in {}: {e}",
                    path.display()
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = sample_rate.or(Some(spec.rate));
                channels = channels.or(Some(spec.channels.count() as u16));

                let mut buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            // One corrupt packet should not sink the whole recording
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!("skipping corrupt packet: {e}");
            }
            Err(e) => {
                return Err(VoxkeyError::Decode(format!(
                    "decode error in {}: {e}",
                    path.display()
                )));
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| VoxkeyError::Decode(format!("missing sample rate in {}", path.display())))?;
    let channels = channels
        .ok_or_else(|| VoxkeyError::Decode(format!("missing channel count in {}", path.display())))?;

    if samples.is_empty() {
        return Err(VoxkeyError::Decode(format!(
            "no samples decoded from {}",
            path.display()
        )));
    }

    tracing::debug!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        channels,
        "decoded container"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}
