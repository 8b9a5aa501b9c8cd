use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sample rate every analysis clip is normalized to before scoring.
pub const ANALYSIS_SAMPLE_RATE: u32 = 16_000;

const WAV_HEADER_LEN: usize = 44;

/// A mono clip of f32 samples in [-1, 1].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PcmClip {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl PcmClip {
    pub fn new(sample_rate_hz: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate_hz,
            samples,
        }
    }

    pub fn duration(&self) -> Duration {
        duration_from_samples(self.sample_rate_hz, self.samples.len())
    }
}

/// Encodes a clip as a canonical 16-bit little-endian PCM WAV byte buffer.
///
/// The layout is fixed: a 44-byte header followed by two bytes per sample,
/// so the output length is always `44 + 2 * samples.len()`.
pub fn encode_wav(clip: &PcmClip) -> Vec<u8> {
    let pcm = f32_to_i16_pcm(&clip.samples);
    let data_len = (pcm.len() * 2) as u32;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len() * 2);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&clip.sample_rate_hz.to_le_bytes());
    out.extend_from_slice(&(clip.sample_rate_hz * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in pcm {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}

/// Clamps to [-1, 1] and scales into the asymmetric i16 range (negatives by
/// 32768, positives by 32767).
pub fn f32_to_i16_pcm(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let s = s.clamp(-1.0, 1.0);
            if s < 0.0 {
                (s * 32768.0) as i16
            } else {
                (s * 32767.0) as i16
            }
        })
        .collect()
}

pub fn i16_to_f32_pcm(samples: &[i16]) -> Vec<f32> {
    let scale = 1.0f32 / 32768.0f32;
    samples.iter().map(|&s| f32::from(s) * scale).collect()
}

pub fn duration_from_samples(sample_rate_hz: u32, samples: usize) -> Duration {
    if sample_rate_hz == 0 {
        return Duration::from_secs(0);
    }
    let micros = (u128::from(samples as u64) * 1_000_000u128) / u128::from(sample_rate_hz);
    Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_length_is_header_plus_two_bytes_per_sample() {
        let clip = PcmClip::new(16_000, vec![0.0; 1234]);
        let wav = encode_wav(&clip);
        assert_eq!(wav.len(), 44 + 2 * 1234);
    }

    #[test]
    fn wav_header_magics_and_fmt_fields() {
        let clip = PcmClip::new(44_100, vec![0.25; 8]);
        let wav = encode_wav(&clip);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + 16);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes([wav[16], wav[17], wav[18], wav[19]]), 16);
        assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(
            u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
            44_100
        );
        assert_eq!(
            u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]),
            44_100 * 2
        );
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 2);
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 16);
    }

    #[test]
    fn f32_conversion_clamps_and_scales_asymmetrically() {
        let pcm = f32_to_i16_pcm(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(pcm, vec![-32768, -32768, 0, 32767, 32767]);
    }

    #[test]
    fn i16_roundtrip_is_close() {
        let original = [-0.5f32, 0.0, 0.25];
        let back = i16_to_f32_pcm(&f32_to_i16_pcm(&original));
        for (a, b) in original.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn clip_duration_mono_16k() {
        let clip = PcmClip::new(ANALYSIS_SAMPLE_RATE, vec![0.0; 16_000]);
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }
}
