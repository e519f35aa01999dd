//! MS-DTYP 2.4.2.2

use std::str::FromStr;

use binrw::io::{Read, Seek};
use binrw::prelude::*;
use thiserror::Error;

use crate::binrw_util::prelude::*;

/// A malformed security identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SidError {
    #[error("Invalid SID revision {0}, expected 1")]
    InvalidRevision(u8),
    #[error("Invalid number of sub-authorities: {0} (at most 15)")]
    TooManySubAuthorities(u8),
    #[error("Invalid SID length: {required} bytes required, {declared} declared")]
    InvalidLength { declared: usize, required: usize },
    #[error("SID uses {used} of the {declared} bytes its entry declares")]
    UnusedBytes { declared: usize, used: usize },
    #[error("Invalid SID string: {0}")]
    InvalidString(String),
}

/// A security identifier.
///
/// The zero value ([`Sid::default`]) is the "no principal" placeholder left behind
/// by a malformed record; it carries no authority and formats as an empty string.
#[derive(Debug, PartialEq, Eq, Clone, Default, Hash)]
pub struct Sid {
    pub revision: u8,
    pub identifier_authority: u64,
    pub sub_authority: Vec<u32>,
}

impl Sid {
    const PREFIX: &'static str = "S-1-";

    pub const REVISION: u8 = 1;
    pub const MAX_SUB_AUTHORITIES: u8 = 15;
    /// Revision, sub-authority count and the 48-bit authority.
    pub const HEADER_SIZE: usize = 8;

    pub const S_ADMINISTRATORS: &'static str = "S-1-5-32-544";
    pub const S_LOCAL_SYSTEM: &'static str = "S-1-5-18";
    pub const S_EVERYONE: &'static str = "S-1-1-0";

    pub fn new(identifier_authority: u64, sub_authority: Vec<u32>) -> Self {
        Sid {
            revision: Self::REVISION,
            identifier_authority,
            sub_authority,
        }
    }

    /// Decodes a SID that occupies exactly `data`.
    ///
    /// Checked in order: the revision, the sub-authority count, and that the
    /// sub-authorities fit in `data`. Bytes past the last sub-authority are ignored.
    pub fn decode(data: &[u8]) -> Result<Sid, SidError> {
        let too_short = |required| SidError::InvalidLength {
            declared: data.len(),
            required,
        };
        let (&revision, rest) = data.split_first().ok_or(too_short(Self::HEADER_SIZE))?;
        if revision != Self::REVISION {
            return Err(SidError::InvalidRevision(revision));
        }
        let &sub_authority_count = rest.first().ok_or(too_short(Self::HEADER_SIZE))?;
        if sub_authority_count > Self::MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities(sub_authority_count));
        }
        let required = Self::wire_size_for(sub_authority_count as usize);
        if required > data.len() {
            return Err(too_short(required));
        }

        let mut cursor = std::io::Cursor::new(&data[2..required]);
        let identifier_authority = read_u48(&mut cursor, binrw::Endian::Big, ())
            .map_err(|_| too_short(required))?;
        let sub_authority = data[Self::HEADER_SIZE..required]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Sid {
            revision,
            identifier_authority,
            sub_authority,
        })
    }

    /// Size of this SID on the wire.
    pub fn wire_size(&self) -> usize {
        Self::wire_size_for(self.sub_authority.len())
    }

    fn wire_size_for(sub_authority_count: usize) -> usize {
        Self::HEADER_SIZE + sub_authority_count * 4
    }

    /// Whether this is the zero value rather than a decoded SID.
    pub fn is_null(&self) -> bool {
        self.revision == 0
    }

    /// The relative identifier: the last sub-authority, if any.
    pub fn rid(&self) -> Option<u32> {
        self.sub_authority.last().copied()
    }
}

/// Reads a SID occupying exactly `length` bytes of the stream.
///
/// Running out of input is an I/O error; a malformed SID inside a complete region
/// is reported as [`binrw::Error::Custom`] wrapping a [`SidError`].
impl BinRead for Sid {
    type Args<'a> = (usize,);

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        (length,): Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let data = read_sized_bytes(reader, endian, (length,))?;
        Sid::decode(&data).map_err(|err| binrw::Error::Custom {
            pos,
            err: Box::new(err),
        })
    }
}

impl FromStr for Sid {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SidError::InvalidString(s.to_string());
        // 1. starts with S-1-:
        let rest = s.strip_prefix(Self::PREFIX).ok_or_else(invalid)?;
        let mut parts = rest.split('-');
        // 2. authority is a number, possibly in hex.
        let identifier_authority = match parts.next() {
            Some(x) if x.starts_with("0x") || x.starts_with("0X") => {
                u64::from_str_radix(&x[2..], 16).map_err(|_| invalid())?
            }
            Some(x) => x.parse().map_err(|_| invalid())?,
            None => return Err(invalid()),
        };
        if identifier_authority >> 48 != 0 {
            return Err(invalid());
        }
        // 3. sub-authorities are numbers.
        let sub_authority = parts
            .map(|x| x.parse().map_err(|_| invalid()))
            .collect::<Result<Vec<u32>, _>>()?;
        if sub_authority.len() > Self::MAX_SUB_AUTHORITIES as usize {
            return Err(SidError::TooManySubAuthorities(sub_authority.len() as u8));
        }
        Ok(Sid::new(identifier_authority, sub_authority))
    }
}

impl std::fmt::Display for Sid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return Ok(());
        }
        // MS-DTYP 2.4.2.1: SID String Format
        write!(f, "S-{}-", self.revision)?;
        if self.identifier_authority >> 32 == 0 {
            write!(f, "{}", self.identifier_authority)?;
        } else {
            write!(f, "0x{:012X}", self.identifier_authority)?;
        }
        for sub_authority in &self.sub_authority {
            write!(f, "-{sub_authority}")?;
        }
        Ok(())
    }
}
