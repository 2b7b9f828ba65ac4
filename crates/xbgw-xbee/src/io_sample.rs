//! Decoder for radio I/O sample payloads
//!
//! Two layouts exist, told apart by payload length:
//!
//! ```text
//! even: [reserved u8][digital mask u16][analog mask u8][digital u16]?[analog u16]*
//! odd:  [reserved u8][packed mask u16                 ][digital u16]?[analog u16]*
//!        packed: low 9 bits digital mask, high 7 bits analog mask
//! ```
//!
//! The digital value word is present only when the digital mask is
//! non-zero. Multi-byte fields are big-endian.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoSampleError {
    #[error("I/O sample truncated: needed {needed} bytes at offset {offset}, have {len}")]
    Truncated { offset: usize, needed: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleValue {
    Digital(bool),
    Analog(u16),
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Digital(v) => write!(f, "{}", v),
            SampleValue::Analog(v) => write!(f, "{}", v),
        }
    }
}

/// Decoded channels in wire order: all `DIO{n}` first, then `AD{n}`
pub type IoSample = Vec<(String, SampleValue)>;

struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], IoSampleError> {
        let end = self.offset + n;
        let bytes = self.data.get(self.offset..end).ok_or(IoSampleError::Truncated {
            offset: self.offset,
            needed: n,
            len: self.data.len(),
        })?;
        self.offset = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, IoSampleError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, IoSampleError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}

/// Decode an I/O sample payload
pub fn parse_io_sample(data: &[u8]) -> Result<IoSample, IoSampleError> {
    let mut cursor = Cursor { data, offset: 0 };

    let (digital_mask, analog_mask) = if data.len() % 2 == 0 {
        cursor.u8()?;
        let digital = cursor.u16()?;
        let analog = cursor.u8()?;
        (digital, analog)
    } else {
        cursor.u8()?;
        let packed = cursor.u16()?;
        (packed % 512, (packed >> 9) as u8)
    };

    let mut sample = IoSample::new();

    if digital_mask != 0 {
        let values = cursor.u16()?;
        for bit in 0..16 {
            if digital_mask & (1 << bit) != 0 {
                sample.push((
                    format!("DIO{}", bit),
                    SampleValue::Digital(values & (1 << bit) != 0),
                ));
            }
        }
    }

    for bit in 0..8 {
        if analog_mask & (1 << bit) != 0 {
            sample.push((format!("AD{}", bit), SampleValue::Analog(cursor.u16()?)));
        }
    }

    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn digital(name: &str, v: bool) -> (String, SampleValue) {
        (name.to_string(), SampleValue::Digital(v))
    }

    fn analog(name: &str, v: u16) -> (String, SampleValue) {
        (name.to_string(), SampleValue::Analog(v))
    }

    #[test]
    fn even_length_layout() {
        // DIO1 and DIO3 sampled (DIO1 high), AD0 and AD2 sampled
        let data = [0x01, 0x00, 0x0A, 0x05, 0x00, 0x02, 0x01, 0x23, 0x03, 0xFF];
        assert_eq!(
            parse_io_sample(&data).unwrap(),
            vec![
                digital("DIO1", true),
                digital("DIO3", false),
                analog("AD0", 0x0123),
                analog("AD2", 0x03FF),
            ]
        );
    }

    #[test]
    fn odd_length_layout_splits_packed_mask() {
        // packed = AD1 (bit 10) | DIO0 (bit 0)
        let data = [0x01, 0x04, 0x01, 0x00, 0x01, 0x02, 0x00];
        assert_eq!(
            parse_io_sample(&data).unwrap(),
            vec![digital("DIO0", true), analog("AD1", 0x0200)]
        );
    }

    #[test]
    fn analog_only_has_no_digital_word() {
        let data = [0x01, 0x00, 0x00, 0x01, 0x00, 0x7F];
        assert_eq!(parse_io_sample(&data).unwrap(), vec![analog("AD0", 0x7F)]);
    }

    #[test]
    fn wide_digital_mask_with_four_analog_channels() {
        let data = [
            0x01, 0xFF, 0xF0, 0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        let mut expected: Vec<(String, SampleValue)> =
            (4..16).map(|n| digital(&format!("DIO{n}"), true)).collect();
        expected.extend((0..4).map(|n| analog(&format!("AD{n}"), 0xFFFF)));
        assert_eq!(parse_io_sample(&data).unwrap(), expected);
    }

    #[test]
    fn empty_masks_yield_nothing() {
        assert_eq!(parse_io_sample(&[0x01, 0x00, 0x00, 0x00]).unwrap(), vec![]);
    }

    #[test]
    fn truncated_payload_fails_closed() {
        // Analog mask announces AD0 and AD1, only one value present
        let data = [0x01, 0x00, 0x00, 0x03, 0x00, 0x10];
        assert_eq!(
            parse_io_sample(&data),
            Err(IoSampleError::Truncated { offset: 6, needed: 2, len: 6 })
        );
        assert!(parse_io_sample(&[]).is_err());
        assert!(parse_io_sample(&[0x01]).is_err());
    }
}
