const I16_SCALE: f32 = 32768.0;

pub const DEFAULT_GAIN: f32 = 1.5;

/// Multiplies every little-endian i16 sample in place, saturating to the
/// signed 16-bit range. A trailing odd byte is left untouched.
pub fn boost_gain(data: &mut [u8], gain: f32) {
    for pair in data.chunks_exact_mut(2) {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        let boosted = (sample as f32 * gain).clamp(-I16_SCALE, I16_SCALE - 1.0) as i16;
        pair.copy_from_slice(&boosted.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn bytes_to_samples(data: &[u8]) -> Vec<i16> {
        data.chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    #[test]
    fn boost_scales_samples() {
        let mut data = samples_to_bytes(&[0, 1000, -1000, 200]);
        boost_gain(&mut data, 1.5);
        assert_eq!(bytes_to_samples(&data), vec![0, 1500, -1500, 300]);
    }

    #[test]
    fn boost_saturates_at_i16_range() {
        let mut data = samples_to_bytes(&[30000, -30000, 32767, -32768]);
        boost_gain(&mut data, 1.5);
        assert_eq!(bytes_to_samples(&data), vec![32767, -32768, 32767, -32768]);
    }

    #[test]
    fn unity_gain_is_identity() {
        let original = samples_to_bytes(&[123, -456, 789, 0, 32767, -32768]);
        let mut data = original.clone();
        boost_gain(&mut data, 1.0);
        assert_eq!(data, original);
    }

    #[test]
    fn trailing_odd_byte_untouched() {
        let mut data = vec![0xE8, 0x03, 0x7F];
        boost_gain(&mut data, 2.0);
        assert_eq!(bytes_to_samples(&data[..2]), vec![2000]);
        assert_eq!(data[2], 0x7F);
    }
}
