//! RIFF/WAVE header layout for 16-bit PCM output files.

/// Size of the canonical PCM header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Sample format of an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl WavSpec {
    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Build the 44-byte header for `data_size` bytes of PCM.
///
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16
/// [20-21]  1 (PCM)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate
/// [32-33]  block_align
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(spec: &WavSpec, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36u32.saturating_add(data_size)).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&spec.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&spec.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&spec.bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Parse a header written by [`generate_wav_header`].
///
/// Returns the spec and the declared data size, or None if the bytes are
/// not a PCM WAV header.
pub fn parse_wav_header(bytes: &[u8]) -> Option<(WavSpec, u32)> {
    if bytes.len() < WAV_HEADER_SIZE
        || &bytes[0..4] != b"RIFF"
        || &bytes[8..12] != b"WAVE"
        || &bytes[36..40] != b"data"
    {
        return None;
    }
    let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

    if u16_at(20) != 1 {
        return None;
    }
    let spec = WavSpec {
        channels: u16_at(22),
        sample_rate: u32_at(24),
        bit_depth: u16_at(34),
    };
    Some((spec, u32_at(40)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEREO_48K: WavSpec = WavSpec {
        sample_rate: 48000,
        channels: 2,
        bit_depth: 16,
    };

    #[test]
    fn header_layout() {
        let header = generate_wav_header(&STEREO_48K, 9600);

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes([header[4], header[5], header[6], header[7]]), 36 + 9600);
        assert_eq!(u32::from_le_bytes([header[28], header[29], header[30], header[31]]), 192000);
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 4);
    }

    #[test]
    fn parse_reads_back_generated_header() {
        let header = generate_wav_header(&STEREO_48K, 3200);
        assert_eq!(parse_wav_header(&header), Some((STEREO_48K, 3200)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_wav_header(b"not a wav file"), None);
        let mut header = generate_wav_header(&STEREO_48K, 0);
        header[20] = 3;
        assert_eq!(parse_wav_header(&header), None);
    }
}
