use thiserror::Error;

use crate::security::{AclKind, DescriptorPart, Diagnostic};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid security descriptor header: {0}")]
    InvalidHeader(binrw::Error),
    #[error("Failed to parse {kind} at offset {offset:#x}: {source}")]
    InvalidAcl {
        kind: AclKind,
        offset: u32,
        source: binrw::Error,
    },
    #[error("Failed to read {part} SID at offset {offset:#x}: {source}")]
    InvalidSid {
        part: DescriptorPart,
        offset: u32,
        source: binrw::Error,
    },
    #[error("{part} offset {offset:#x} is past the end of the {len}-byte descriptor")]
    OffsetOutOfBounds {
        part: DescriptorPart,
        offset: u32,
        len: usize,
    },
    #[error("{part} at offset {offset:#x} overlaps data ending at {position:#x}")]
    OverlappingOffset {
        part: DescriptorPart,
        offset: u32,
        position: u64,
    },
    #[error("Malformed SID rejected: {0}")]
    MalformedSid(Diagnostic),
    #[error("Invalid well-known SID pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
