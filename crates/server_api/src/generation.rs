use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hound::{SampleFormat, WavSpec, WavWriter};
use shared::protocol::{RecommendationInput, RecommendationOutput};

pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
pub const SPEECH_CHANNELS: u16 = 1;
pub const SPEECH_BITS_PER_SAMPLE: u16 = 16;

/// Text and speech generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn recommend(&self, input: &RecommendationInput) -> Result<RecommendationOutput>;

    /// Raw little-endian 16-bit mono PCM at [`SPEECH_SAMPLE_RATE`].
    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>>;
}

pub struct MissingGenerator;

#[async_trait]
impl Generator for MissingGenerator {
    async fn recommend(&self, _input: &RecommendationInput) -> Result<RecommendationOutput> {
        Err(anyhow!("generation backend is not configured"))
    }

    async fn synthesize(&self, _prompt: &str) -> Result<Vec<u8>> {
        Err(anyhow!("generation backend is not configured"))
    }
}

/// Wraps PCM samples in a WAV container. A trailing odd byte is dropped.
pub fn pcm_to_wav(pcm: &[u8]) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: SPEECH_CHANNELS,
        sample_rate: SPEECH_SAMPLE_RATE,
        bits_per_sample: SPEECH_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).context("failed to start wav stream")?;
        for frame in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([frame[0], frame[1]]))
                .context("failed to write wav sample")?;
        }
        writer.finalize().context("failed to finalize wav stream")?;
    }
    Ok(cursor.into_inner())
}

pub fn wav_data_uri(wav: &[u8]) -> String {
    format!("data:audio/wav;base64,{}", STANDARD.encode(wav))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_describes_speech_pcm() {
        let pcm = [0x01, 0x00, 0xff, 0x7f, 0x00];
        let wav = pcm_to_wav(&pcm).expect("wav");
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 4);

        let reader = hound::WavReader::new(Cursor::new(wav)).expect("reader");
        assert_eq!(reader.spec().sample_rate, SPEECH_SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn data_uri_carries_wav_mime_prefix() {
        assert_eq!(wav_data_uri(b"RIFF"), "data:audio/wav;base64,UklGRg==");
    }

    #[tokio::test]
    async fn missing_generator_always_fails() {
        let err = MissingGenerator.synthesize("bell").await.expect_err("must fail");
        assert!(err.to_string().contains("not configured"));
    }
}
