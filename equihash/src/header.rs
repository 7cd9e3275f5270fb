//! Block header decoding and validation
//!
//! The solver works on a full 140-byte block header. Its last 12 bytes are
//! the reserved part of the 32-byte nonce and must be zero: every BLAKE2b
//! message then shares the same final-block prefix, and only the candidate
//! counter appended after the header varies between digests.

use crate::err::FormatError;
use std::fmt;
use std::str::FromStr;

/// Length of a full block header in bytes
pub const HEADER_LEN: usize = 140;

/// Length of the reserved, all-zero tail of the header nonce
pub const NONCE_TAIL_LEN: usize = 12;

/// A validated block header
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Header([u8; HEADER_LEN]);

impl Header {
    /// Decode a header from exactly `2 * HEADER_LEN` hex digits.
    ///
    /// Either case is accepted. Fails on odd digit counts, wrong lengths,
    /// non-hex characters, and a non-zero nonce tail.
    pub fn decode(input: &str) -> Result<Self, FormatError> {
        let digits = input.len();
        if digits % 2 != 0 {
            return Err(FormatError::OddLength(digits));
        }
        if digits / 2 != HEADER_LEN {
            return Err(FormatError::WrongLength(digits / 2));
        }
        let mut bytes = [0u8; HEADER_LEN];
        hex::decode_to_slice(input, &mut bytes).map_err(|err| match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => FormatError::InvalidHex {
                character: c,
                offset: index,
            },
            hex::FromHexError::OddLength => FormatError::OddLength(digits),
            hex::FromHexError::InvalidStringLength => FormatError::WrongLength(digits / 2),
        })?;
        Self::from_array(bytes)
    }

    /// Validate a header given as raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let array: [u8; HEADER_LEN] = bytes
            .try_into()
            .map_err(|_| FormatError::WrongLength(bytes.len()))?;
        Self::from_array(array)
    }

    /// Check the nonce tail of a correctly sized header.
    fn from_array(bytes: [u8; HEADER_LEN]) -> Result<Self, FormatError> {
        let tail_start = HEADER_LEN - NONCE_TAIL_LEN;
        match bytes[tail_start..].iter().position(|byte| *byte != 0) {
            Some(pos) => Err(FormatError::NonZeroNonceTail(tail_start + pos)),
            None => Ok(Self(bytes)),
        }
    }

    /// Lowercase hex encoding of the header
    pub fn encode(&self) -> String {
        hex::encode(self.0)
    }

    /// The raw header bytes
    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }
}

impl FromStr for Header {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<&[u8]> for Header {
    type Error = FormatError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for Header {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Header({})", self.encode())
    }
}

#[cfg(test)]
mod test {
    use super::{Header, HEADER_LEN};
    use crate::err::FormatError;

    fn zero_header_hex() -> String {
        "00".repeat(HEADER_LEN)
    }

    #[test]
    fn nonzero_tail_reports_first_offset() {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[130] = 1;
        bytes[135] = 1;
        assert_eq!(
            Header::from_bytes(&bytes),
            Err(FormatError::NonZeroNonceTail(130))
        );
        // The byte right before the tail is free
        bytes[130] = 0;
        bytes[135] = 0;
        bytes[127] = 0xff;
        assert!(Header::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn invalid_character_offset() {
        let mut hex = zero_header_hex();
        hex.replace_range(10..11, "g");
        assert_eq!(
            Header::decode(&hex),
            Err(FormatError::InvalidHex {
                character: 'g',
                offset: 10
            })
        );
    }

    #[test]
    fn raw_length() {
        assert_eq!(
            Header::from_bytes(&[0u8; 139]),
            Err(FormatError::WrongLength(139))
        );
        assert_eq!(
            Header::try_from(&[0u8; 141][..]),
            Err(FormatError::WrongLength(141))
        );
    }

    #[test]
    fn display_is_hex() {
        let header = Header::decode(&zero_header_hex()).unwrap();
        assert_eq!(header.to_string(), zero_header_hex());
        assert!(format!("{header:?}").starts_with("Header(0000"));
    }
}
