//! Fixed-width integer extraction with explicit byte order.

use crate::error::{DecodeResult, Rejection};

/// Copy `N` bytes starting at `offset`, or reject if the payload is too short.
pub fn field<const N: usize>(data: &[u8], offset: usize) -> DecodeResult<[u8; N]> {
    let need = offset + N;
    data.get(offset..need)
        .and_then(|s| <[u8; N]>::try_from(s).ok())
        .ok_or(Rejection::TooShort {
            need,
            got: data.len(),
        })
}

/// Unsigned 16-bit, most-significant byte first.
pub fn u16_be(b: [u8; 2]) -> u16 {
    (u16::from(b[0]) << 8) | u16::from(b[1])
}

/// Unsigned 24-bit, least-significant byte first: `b0 + b1*256 + b2*65536`.
pub fn u24_le(b: [u8; 3]) -> u32 {
    u32::from(b[0]) | (u32::from(b[1]) << 8) | (u32::from(b[2]) << 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_be_ac_voltage() {
        // 0x5848 = 22600 → 226.00 V
        assert_eq!(u16_be([0x58, 0x48]), 22600);
        assert_eq!(u16_be([0x00, 0x01]), 1);
        assert_eq!(u16_be([0xFF, 0xFF]), 0xFFFF);
    }

    #[test]
    fn u24_le_odometer() {
        // 540 00 00 00 00 90 f0 02 00
        assert_eq!(u24_le([0x90, 0xF0, 0x02]), 0x02F090);
        assert_eq!(u24_le([0x90, 0xF0, 0x02]), 192_656);
        assert_eq!(u24_le([0x01, 0x00, 0x00]), 1);
        assert_eq!(u24_le([0x00, 0x00, 0x01]), 65_536);
    }

    #[test]
    fn field_extracts_at_offset() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x90, 0xF0, 0x02, 0x00];
        assert_eq!(field::<3>(&data, 4).unwrap(), [0x90, 0xF0, 0x02]);
        assert_eq!(field::<1>(&data, 7).unwrap(), [0x00]);
    }

    #[test]
    fn field_rejects_short_payload() {
        let data = [0x00, 0x00, 0x00, 0x00, 0x90];
        assert_eq!(
            field::<3>(&data, 4).unwrap_err(),
            Rejection::TooShort { need: 7, got: 5 }
        );
        assert!(field::<2>(&[], 0).is_err());
    }
}
