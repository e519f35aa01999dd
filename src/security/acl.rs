//! MS-DTYP 2.4.5: ACL

use binrw::prelude::*;

use super::Ace;

/// An access control list.
///
/// Entries are kept in wire order. `ace_count` alone drives parsing; `acl_size`
/// is kept as declared and only cross-checked by [`Acl::size_mismatch`].
#[binrw::binread]
#[derive(Debug, Clone, PartialEq, Eq)]
#[br(little)]
pub struct Acl {
    pub acl_revision: u8,
    #[br(temp)]
    _sbz1: u8,
    pub acl_size: u16,
    pub ace_count: u16,
    #[br(temp)]
    _sbz2: u16,
    #[br(count = ace_count)]
    pub ace: Vec<Ace>,
}

impl Acl {
    pub const HEADER_SIZE: usize = 8;

    /// Windows NT 4.0
    pub const REVISION_NT4: u8 = 2;
    /// Active directory
    pub const REVISION_DS: u8 = 4;

    /// Size of the header plus every entry, as declared by the entries themselves.
    pub fn entries_size(&self) -> usize {
        Self::HEADER_SIZE
            + self
                .ace
                .iter()
                .map(|ace| ace.ace_size as usize)
                .sum::<usize>()
    }

    /// Returns the entries' total size when it disagrees with the declared `acl_size`.
    pub fn size_mismatch(&self) -> Option<usize> {
        let actual = self.entries_size();
        (actual != self.acl_size as usize).then_some(actual)
    }
}

/// Which of the two lists of a descriptor an [`Acl`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclKind {
    Sacl,
    Dacl,
}

impl std::fmt::Display for AclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AclKind::Sacl => write!(f, "SACL"),
            AclKind::Dacl => write!(f, "DACL"),
        }
    }
}
