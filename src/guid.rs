use std::{fmt::Display, io::Cursor, str::FromStr};

use binrw::prelude::*;

/// Represents a standard, 16-byte GUID.
///
/// Used as the object-type tag of object ACEs. The first three fields are always
/// little-endian on the wire, the trailing 8 bytes are raw.
///
/// Supports [`std::mem::size_of`].
#[derive(BinRead, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[br(little)]
pub struct Guid(u32, u16, u16, [u8; 8]);

impl Guid {
    /// The size of a GUID, in Bytes
    pub const GUID_SIZE: usize = 16;
    const _VALIDATE_SIZE_OF: [u8; Self::GUID_SIZE] = [0; size_of::<Self>()];

    pub const ZERO: Guid = Guid(0, 0, 0, [0; 8]);

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Guid(data1, data2, data3, data4)
    }

    pub const fn parse_uuid(s: &str) -> Result<Guid, &'static str> {
        let b = s.as_bytes();
        if b.is_empty() {
            return Err("Invalid UUID format");
        }
        let so = if b[0] == b'{' && b[b.len() - 1] == b'}' {
            if s.len() != 38 {
                return Err("Invalid UUID format");
            }
            1
        } else {
            if s.len() != 36 {
                return Err("Invalid UUID format");
            }
            0
        };
        if b[so + 8] != b'-' || b[so + 13] != b'-' || b[so + 18] != b'-' || b[so + 23] != b'-' {
            return Err("Invalid UUID format");
        }

        // Hex digit pairs, in textual order.
        const POSITIONS: [usize; 16] = [0, 2, 4, 6, 9, 11, 14, 16, 19, 21, 24, 26, 28, 30, 32, 34];
        let mut bytes = [0u8; 16];
        let mut i = 0;
        while i < 16 {
            bytes[i] = match parse_byte(b, so + POSITIONS[i]) {
                Ok(val) => val,
                Err(e) => return Err(e),
            };
            i += 1;
        }
        Ok(Guid(
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            u16::from_be_bytes([bytes[4], bytes[5]]),
            u16::from_be_bytes([bytes[6], bytes[7]]),
            [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        ))
    }
}

/// A macro to create a `Guid` from a string literal at compile time.
#[macro_export]
macro_rules! guid {
    ($s:literal) => {{
        match $crate::guid::Guid::parse_uuid($s) {
            Ok(guid) => guid,
            Err(_) => panic!("Invalid GUID format"),
        }
    }};
}

impl TryFrom<&[u8; 16]> for Guid {
    type Error = binrw::Error;

    fn try_from(value: &[u8; 16]) -> Result<Self, Self::Error> {
        let mut cursor = Cursor::new(value);
        Guid::read(&mut cursor)
    }
}

impl FromStr for Guid {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Guid::parse_uuid(s)
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Print first fields in little endian, and the rest in big endian:
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:012x}",
            self.0,
            self.1,
            self.2,
            self.3[0],
            self.3[1],
            self.3[2..]
                .iter()
                .fold(0u64, |acc, &x| (acc << 8) + x as u64)
        )
    }
}

impl std::fmt::Debug for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

const fn parse_hex(c: u8) -> Result<u8, &'static str> {
    let c = match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => return Err("Invalid hex character"),
    };
    Ok(c)
}

const fn parse_byte(b: &[u8], i: usize) -> Result<u8, &'static str> {
    let upper = match parse_hex(b[i]) {
        Ok(val) => val,
        Err(e) => return Err(e),
    };
    let lower = match parse_hex(b[i + 1]) {
        Ok(val) => val,
        Err(e) => return Err(e),
    };
    Ok((upper << 4) | lower)
}
