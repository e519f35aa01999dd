//! Recoverable conditions met while decoding a descriptor.

use thiserror::Error;

use super::{AclKind, Sid, SidError};

/// Something unusual in a descriptor that did not stop it from being decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("{acl} entry {index} has a malformed SID: {error}")]
    MalformedAceSid {
        acl: AclKind,
        index: usize,
        error: SidError,
    },
    #[error("{acl} entry {index} has unknown ACE type {ace_type:#x}")]
    UnknownAceType {
        acl: AclKind,
        index: usize,
        ace_type: u8,
    },
    #[error("{acl} declares {declared} bytes, but its entries span {actual} bytes")]
    AclSizeMismatch {
        acl: AclKind,
        declared: u16,
        actual: usize,
    },
    #[error("Malformed owner SID: {0}")]
    MalformedOwnerSid(SidError),
    #[error("Malformed group SID: {0}")]
    MalformedGroupSid(SidError),
    #[error("No owner or group offsets; using the first DACL entry's principal {0}")]
    OwnerGroupFromDacl(Sid),
}

impl Diagnostic {
    /// Whether this reports a SID that could not be decoded.
    pub fn is_malformed_sid(&self) -> bool {
        matches!(
            self,
            Diagnostic::MalformedAceSid { .. }
                | Diagnostic::MalformedOwnerSid(_)
                | Diagnostic::MalformedGroupSid(_)
        )
    }
}
