//! Intel HEX records: the line format the T21 emulator loads its ROM
//! from.
//!
//! ```text
//! :LLAAAATT<payload>CC
//! ```
//!
//! `LL` is the payload length, `AAAA` the 16-bit load offset, `TT` the
//! record type and `CC` a two's complement checksum chosen so that every
//! byte of the record, checksum included, sums to zero.
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RecordType {
    Data,
    EndOfFile,
    ExtendedSegmentAddress,
    StartSegmentAddress,
    ExtendedLinearAddress,
    StartLinearAddress,
}

impl RecordType {
    pub fn code(&self) -> u8 {
        use RecordType::*;
        match self {
            Data                   => 0x00,
            EndOfFile              => 0x01,
            ExtendedSegmentAddress => 0x02,
            StartSegmentAddress    => 0x03,
            ExtendedLinearAddress  => 0x04,
            StartLinearAddress     => 0x05,
        }
    }
}

impl TryFrom<u8> for RecordType {
    type Error = RecordError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use RecordType::*;
        match value {
            0x00 => Ok(Data),
            0x01 => Ok(EndOfFile),
            0x02 => Ok(ExtendedSegmentAddress),
            0x03 => Ok(StartSegmentAddress),
            0x04 => Ok(ExtendedLinearAddress),
            0x05 => Ok(StartLinearAddress),
            _ => Err(RecordError::UnknownType(value)),
        }
    }
}

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum RecordError {
    #[error("record payload of {0} bytes exceeds the 255-byte limit")]
    PayloadTooLong(usize),
    #[error("image of {0} bytes does not fit a 16-bit load offset")]
    ImageTooLarge(usize),
    #[error("malformed record `{0}`")]
    Malformed(String),
    #[error("record declares {declared} payload bytes but carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("unknown record type {0:02X}")]
    UnknownType(u8),
    #[error("checksum mismatch: expected {expected:02X}, found {found:02X}")]
    ChecksumMismatch { expected: u8, found: u8 },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HexRecord {
    kind:        RecordType,
    load_offset: u16,
    payload:     Vec<u8>,
}

impl HexRecord {
    pub const MAX_PAYLOAD: usize = 255;

    pub fn new(kind: RecordType, load_offset: u16, payload: Vec<u8>) -> Result<Self, RecordError> {
        if payload.len() > Self::MAX_PAYLOAD {
            return Err(RecordError::PayloadTooLong(payload.len()));
        }
        Ok(HexRecord { kind, load_offset, payload })
    }

    pub fn end_of_file() -> Self {
        HexRecord { kind: RecordType::EndOfFile, load_offset: 0, payload: Vec::new() }
    }

    pub fn kind(&self) -> RecordType {
        self.kind
    }

    pub fn load_offset(&self) -> u16 {
        self.load_offset
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Two's complement of the byte sum of length, offset, type and payload.
    pub fn checksum(&self) -> u8 {
        let [hi, lo] = self.load_offset.to_be_bytes();
        let sum = self.payload
            .iter()
            .fold(self.payload.len() as u8, |acc, b| acc.wrapping_add(*b))
            .wrapping_add(hi)
            .wrapping_add(lo)
            .wrapping_add(self.kind.code());
        (!sum).wrapping_add(1)
    }
}

impl fmt::Display for HexRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ":{:02X}{:04X}{:02X}", self.payload.len(), self.load_offset, self.kind.code())?;
        for b in &self.payload {
            write!(f, "{:02X}", b)?;
        }
        write!(f, "{:02X}", self.checksum())
    }
}

impl FromStr for HexRecord {
    type Err = RecordError;

    /// Decodes one record line, checking its length field, type and
    /// checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let caps = record_pattern().captures(line)
            .ok_or_else(|| RecordError::Malformed(line.to_string()))?;

        let byte = |hex: &str| u8::from_str_radix(hex, 16)
            .map_err(|_| RecordError::Malformed(line.to_string()));

        let declared = byte(&caps[1])? as usize;
        let load_offset = u16::from_str_radix(&caps[2], 16)
            .map_err(|_| RecordError::Malformed(line.to_string()))?;
        let kind = RecordType::try_from(byte(&caps[3])?)?;
        let payload = caps[4]
            .as_bytes()
            .chunks(2)
            .map(|pair| byte(std::str::from_utf8(pair).unwrap_or("")))
            .collect::<Result<Vec<u8>, _>>()?;
        let found = byte(&caps[5])?;

        if payload.len() != declared {
            return Err(RecordError::LengthMismatch { declared, actual: payload.len() });
        }

        let record = HexRecord { kind, load_offset, payload };
        let expected = record.checksum();
        if expected != found {
            return Err(RecordError::ChecksumMismatch { expected, found });
        }
        Ok(record)
    }
}

/// `:LL AAAA TT payload CC`, each field in hex digits.
fn record_pattern() -> &'static Regex {
    static RECORD: OnceLock<Regex> = OnceLock::new();
    RECORD.get_or_init(|| {
        Regex::new(
            r"^:([[:xdigit:]]{2})([[:xdigit:]]{4})([[:xdigit:]]{2})((?:[[:xdigit:]]{2})*)([[:xdigit:]]{2})$"
        ).expect("record pattern is valid")
    })
}

/// Splits an image into Data records of at most `chunk` bytes at
/// increasing load offsets, followed by the end-of-file record.
pub fn records_for_image(image: &[u8], chunk: usize) -> Result<Vec<HexRecord>, RecordError> {
    if image.len() > usize::from(u16::MAX) + 1 {
        return Err(RecordError::ImageTooLarge(image.len()));
    }
    let chunk = chunk.max(1).min(HexRecord::MAX_PAYLOAD);

    let mut records = Vec::with_capacity(image.len() / chunk + 2);
    for (index, data) in image.chunks(chunk).enumerate() {
        let offset = u16::try_from(index * chunk)
            .map_err(|_| RecordError::ImageTooLarge(image.len()))?;
        records.push(HexRecord::new(RecordType::Data, offset, data.to_vec())?);
    }
    records.push(HexRecord::end_of_file());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_sum(line: &str) -> u8 {
        let bytes = &line[1..];
        (0..bytes.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&bytes[i..i + 2], 16).unwrap())
            .fold(0u8, |acc, b| acc.wrapping_add(b))
    }

    #[test]
    fn test_end_of_file() {
        assert_eq!(HexRecord::end_of_file().to_string(), ":00000001FF");
    }

    #[test]
    fn test_encode_known_records() {
        let rec = HexRecord::new(RecordType::Data, 0x0030, vec![0x02, 0x33, 0x7A]).unwrap();
        assert_eq!(rec.checksum(), 0x1E);
        assert_eq!(rec.to_string(), ":0300300002337A1E");

        let rec = HexRecord::new(
            RecordType::Data,
            0x0100,
            vec![0x21, 0x46, 0x01, 0x36, 0x01, 0x21, 0x47, 0x01,
                 0x36, 0x00, 0x7E, 0xFE, 0x09, 0xD2, 0x19, 0x01],
        ).unwrap();
        assert_eq!(rec.to_string(), ":10010000214601360121470136007EFE09D2190140");

        let rec = HexRecord::new(RecordType::ExtendedLinearAddress, 0, vec![0x00, 0x12]).unwrap();
        assert_eq!(rec.to_string(), ":020000040012E8");
    }

    #[test]
    fn test_checksum_sums_to_zero() {
        for len in [0usize, 1, 16, 255].iter() {
            let payload: Vec<u8> = (0..*len).map(|i| (i * 37) as u8).collect();
            let rec = HexRecord::new(RecordType::Data, 0xBEEF, payload).unwrap();
            assert_eq!(byte_sum(&rec.to_string()), 0, "{}", rec);
        }
    }

    #[test]
    fn test_payload_limit() {
        assert!(HexRecord::new(RecordType::Data, 0, vec![0; 255]).is_ok());
        assert_eq!(
            HexRecord::new(RecordType::Data, 0, vec![0; 256]),
            Err(RecordError::PayloadTooLong(256))
        );
    }

    #[test]
    fn test_decode() {
        let rec: HexRecord = ":0300300002337A1E".parse().unwrap();
        assert_eq!(rec.kind(), RecordType::Data);
        assert_eq!(rec.load_offset(), 0x0030);
        assert_eq!(rec.payload(), &[0x02u8, 0x33, 0x7A][..]);

        let rec: HexRecord = ":00000001ff\n".parse().unwrap();
        assert_eq!(rec, HexRecord::end_of_file());
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            ":0300300002337A1F".parse::<HexRecord>(),
            Err(RecordError::ChecksumMismatch { expected: 0x1E, found: 0x1F })
        );
        assert_eq!(
            ":0400300002337A1E".parse::<HexRecord>(),
            Err(RecordError::LengthMismatch { declared: 4, actual: 3 })
        );
        assert_eq!(":00000009F7".parse::<HexRecord>(), Err(RecordError::UnknownType(9)));
        assert!(matches!("0300300002337A1E".parse::<HexRecord>(), Err(RecordError::Malformed(_))));
        assert!(matches!(":0300300002337A1".parse::<HexRecord>(), Err(RecordError::Malformed(_))));
        assert!(matches!(":03003000ZZ337A1E".parse::<HexRecord>(), Err(RecordError::Malformed(_))));
    }

    #[test]
    fn test_records_for_image() {
        let records = records_for_image(&[0x0C, 0x02, 0x07], 16).unwrap();
        let lines: Vec<String> = records.iter().map(|r| r.to_string()).collect();
        assert_eq!(lines, vec![":030000000C0207E8", ":00000001FF"]);

        let image: Vec<u8> = (0..40).collect();
        let records = records_for_image(&image, 16).unwrap();
        let offsets: Vec<u16> = records.iter().map(HexRecord::load_offset).collect();
        assert_eq!(offsets, vec![0, 16, 32, 0]);
        assert_eq!(records[2].payload().len(), 8);

        assert_eq!(records_for_image(&[], 16).unwrap(), vec![HexRecord::end_of_file()]);
    }

    #[test]
    fn test_decode_many_lines() {
        let text = ":0300300002337A1E\n:10010000214601360121470136007EFE09D2190140\n:00000001FF\n";
        let records: Result<Vec<HexRecord>, _> = text.lines().map(str::parse).collect();
        let records = records.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].load_offset(), 0x0100);
        assert_eq!(records[2], HexRecord::end_of_file());
    }

    #[test]
    fn test_round_trip_through_text() {
        let image: Vec<u8> = (0..=255).collect();
        for rec in records_for_image(&image, 32).unwrap() {
            assert_eq!(rec.to_string().parse::<HexRecord>(), Ok(rec));
        }
    }
}
