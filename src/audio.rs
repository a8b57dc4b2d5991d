//! WAV encoding for synthesized audio.

use std::io::Cursor;

use crate::TtsError;

/// Encode mono f32 samples as a 16-bit PCM WAV byte stream.
///
/// Samples are clamped to `[-1.0, 1.0]`, scaled by `i16::MAX` and truncated
/// toward zero.
pub fn encode_wav_pcm16(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, TtsError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    // 44-byte RIFF header + 2 bytes per sample
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
