// src/audio/mod.rs
// Inbound frame decoding: browser container audio (webm/ogg/mp4/wav) down to
// the single target format the transcription engine accepts - mono, 16 kHz,
// 16-bit little-endian PCM. CPU-bound; runs inline in the turn, no await.

use std::io::Cursor;

use anyhow::{Result, anyhow};

/// Target sample rate for transcription input.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decoder seam for the turn pipeline. The production implementation probes
/// the container with symphonia and falls back to a plain WAV parse.
pub trait AudioDecoder: Send + Sync {
    /// Decode one inbound frame into mono 16 kHz s16le PCM bytes.
    fn decode(&self, frame: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Debug, Default)]
pub struct ContainerDecoder;

impl AudioDecoder for ContainerDecoder {
    fn decode(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let (samples, sample_rate) = decode_to_mono_f32(frame)?;
        let resampled = resample_linear(&samples, sample_rate, TARGET_SAMPLE_RATE);
        Ok(f32_to_s16le(&resampled))
    }
}

/// Decode any supported container to mono f32 samples plus the source rate.
fn decode_to_mono_f32(frame: &[u8]) -> Result<(Vec<f32>, u32)> {
    if frame.is_empty() {
        return Err(anyhow!("Empty audio input"));
    }

    match decode_with_symphonia(frame) {
        Ok(decoded) => finalize(decoded),
        Err(symphonia_err) => {
            let decoded = decode_wav_with_hound(frame).map_err(|wav_err| {
                anyhow!(
                    "Failed to decode audio. Symphonia: {symphonia_err}; WAV fallback: {wav_err}"
                )
            })?;
            finalize(decoded)
        }
    }
}

fn decode_with_symphonia(frame: &[u8]) -> Result<(Vec<f32>, u32)> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::errors::Error as SymphoniaError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;
    use symphonia::default::{get_codecs, get_probe};

    let media_source = MediaSourceStream::new(
        Box::new(Cursor::new(frame.to_vec())),
        Default::default(),
    );
    let probed = get_probe()
        .format(
            &Hint::new(),
            media_source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| anyhow!("Container probe failed: {e}"))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("No default audio track found"))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| anyhow!("Failed to create audio decoder: {e}"))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!("Audio stream format reset is not supported"));
            }
            Err(err) => return Err(anyhow!("Failed reading audio packets: {err}")),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(anyhow!("Failed decoding audio packet: {err}")),
        };

        if sample_rate == 0 {
            sample_rate = decoded.spec().rate;
        }
        let channels = decoded.spec().channels.count().max(1);

        let mut sample_buffer =
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sample_buffer.copy_interleaved_ref(decoded);
        downmix_into(sample_buffer.samples(), channels, &mut samples);
    }

    Ok((samples, sample_rate))
}

fn decode_wav_with_hound(frame: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::new(Cursor::new(frame))
        .map_err(|e| anyhow!("Failed to parse WAV: {e}"))?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample.max(1) as u32;
            let max_val = if bits > 1 {
                ((1i64 << (bits - 1)) - 1) as f32
            } else {
                1.0
            };
            reader
                .samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| (s as f32 / max_val).clamp(-1.0, 1.0))
                .collect()
        }
        hound::SampleFormat::Float => reader.samples::<f32>().filter_map(|s| s.ok()).collect(),
    };

    let mut mono = Vec::with_capacity(interleaved.len() / channels + 1);
    downmix_into(&interleaved, channels, &mut mono);

    Ok((mono, spec.sample_rate))
}

fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    for chunk in interleaved.chunks(channels) {
        if chunk.is_empty() {
            continue;
        }
        let sum: f32 = chunk.iter().copied().sum();
        out.push(sum / chunk.len() as f32);
    }
}

fn finalize((mut samples, sample_rate): (Vec<f32>, u32)) -> Result<(Vec<f32>, u32)> {
    if sample_rate == 0 {
        return Err(anyhow!("Decoded audio has invalid sample rate 0"));
    }
    if samples.is_empty() {
        return Err(anyhow!("Decoded audio produced zero samples"));
    }

    for sample in &mut samples {
        if !sample.is_finite() {
            *sample = 0.0;
        } else {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    Ok((samples, sample_rate))
}

/// Linear-interpolation resample. Good enough for speech-recognition input;
/// the transcription engine is tolerant of the interpolation artifacts.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len.max(1));

    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = samples[idx.min(samples.len() - 1)];
        let b = samples[(idx + 1).min(samples.len() - 1)];
        out.push(a + (b - a) * frac);
    }

    out
}

fn f32_to_s16le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}
