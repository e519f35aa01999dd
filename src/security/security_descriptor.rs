//! MS-DTYP 2.4.6: Security Descriptor

use std::io::Cursor;

use binrw::prelude::*;
use modular_bitfield::prelude::*;

use crate::{
    binrw_util::prelude::*,
    config::{DecodeConfig, MalformedSidPolicy, OwnerGroupFallback},
    Error, Result,
};

use super::{Ace, AceType, Acl, AclKind, Diagnostic, Sid, SidError};

/// The fixed part of a self-relative security descriptor.
///
/// Offsets are relative to the start of the descriptor; zero means absent.
#[binrw::binread]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[br(little)]
pub struct SecurityDescriptorHeader {
    #[br(assert(revision == 1, "Invalid security descriptor revision {}", revision))]
    pub revision: u8,
    pub sbz1: u8,
    pub control: SecurityDescriptorControl,
    pub offset_owner: u32,
    pub offset_group: u32,
    pub offset_sacl: u32,
    pub offset_dacl: u32,
}

impl SecurityDescriptorHeader {
    pub const SIZE: usize = 20;

    fn offset_of(&self, part: DescriptorPart) -> u32 {
        match part {
            DescriptorPart::Owner => self.offset_owner,
            DescriptorPart::Group => self.offset_group,
            DescriptorPart::Sacl => self.offset_sacl,
            DescriptorPart::Dacl => self.offset_dacl,
        }
    }
}

#[bitfield]
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
#[br(map = Self::from_bytes)]
pub struct SecurityDescriptorControl {
    pub owner_defaulted: bool,
    pub group_defaulted: bool,
    pub dacl_present: bool,
    pub dacl_defaulted: bool,

    pub sacl_present: bool,
    pub sacl_defaulted: bool,
    pub dacl_trusted: bool,
    pub server_security: bool,

    pub dacl_computed: bool,
    pub sacl_computed: bool,
    pub dacl_auto_inherited: bool,
    pub sacl_auto_inherited: bool,

    pub dacl_protected: bool,
    pub sacl_protected: bool,
    pub rm_control_valid: bool,
    pub self_relative: bool,
}

impl SecurityDescriptorControl {
    pub fn from_u16(value: u16) -> Self {
        Self::from_bytes(value.to_le_bytes())
    }

    pub fn as_u16(&self) -> u16 {
        u16::from_le_bytes(self.into_bytes())
    }

    /// Which components were filled in by a default mechanism rather than by
    /// whoever built the descriptor.
    pub fn defaulted_flags(&self) -> DefaultedFlags {
        DefaultedFlags {
            owner: self.owner_defaulted(),
            group: self.group_defaulted(),
            dacl: self.dacl_defaulted(),
            sacl: self.sacl_defaulted(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultedFlags {
    pub owner: bool,
    pub group: bool,
    pub dacl: bool,
    pub sacl: bool,
}

/// The four components a descriptor header points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorPart {
    Owner,
    Group,
    Sacl,
    Dacl,
}

impl std::fmt::Display for DescriptorPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorPart::Owner => write!(f, "owner"),
            DescriptorPart::Group => write!(f, "group"),
            DescriptorPart::Sacl => write!(f, "SACL"),
            DescriptorPart::Dacl => write!(f, "DACL"),
        }
    }
}

/// A decoded security descriptor, owning everything it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDescriptor {
    pub header: SecurityDescriptorHeader,
    pub owner_sid: Option<Sid>,
    pub group_sid: Option<Sid>,
    pub sacl: Option<Acl>,
    pub dacl: Option<Acl>,
    /// Recoverable conditions met while decoding, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl SecurityDescriptor {
    /// Decodes a self-relative security descriptor with the default [`DecodeConfig`].
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with_config(bytes, &DecodeConfig::default())
    }

    /// Decodes a self-relative security descriptor.
    ///
    /// The components are visited in ascending offset order, so the cursor only
    /// moves forward. A SID's region runs up to the next component's offset, or to
    /// the end of `bytes` for the last one.
    pub fn parse_with_config(bytes: &[u8], config: &DecodeConfig) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        let header = SecurityDescriptorHeader::read(&mut reader).map_err(Error::InvalidHeader)?;
        log::debug!(
            "Security descriptor control {:#06x}, offsets: owner={:#x} group={:#x} sacl={:#x} dacl={:#x}",
            header.control.as_u16(),
            header.offset_owner,
            header.offset_group,
            header.offset_sacl,
            header.offset_dacl
        );

        let mut parts: Vec<(u32, DescriptorPart)> = [
            DescriptorPart::Owner,
            DescriptorPart::Group,
            DescriptorPart::Sacl,
            DescriptorPart::Dacl,
        ]
        .into_iter()
        .map(|part| (header.offset_of(part), part))
        .filter(|&(offset, _)| offset != 0)
        .collect();
        // Stable: an owner and group sharing one offset stay in that order.
        parts.sort_by_key(|&(offset, _)| offset);

        let mut sd = SecurityDescriptor {
            header,
            owner_sid: None,
            group_sid: None,
            sacl: None,
            dacl: None,
            diagnostics: Vec::new(),
        };

        if let Some(&(offset, part)) = parts
            .iter()
            .find(|&&(offset, _)| offset as usize >= bytes.len())
        {
            return Err(Error::OffsetOutOfBounds {
                part,
                offset,
                len: bytes.len(),
            });
        }

        for (i, &(offset, part)) in parts.iter().enumerate() {
            if part == DescriptorPart::Group && offset == header.offset_owner {
                log::trace!("Owner and group share the SID at {offset:#x}");
                sd.group_sid = sd.owner_sid.clone();
                continue;
            }
            let position = reader.position();
            if u64::from(offset) < position {
                return Err(Error::OverlappingOffset {
                    part,
                    offset,
                    position,
                });
            }
            reader.set_position(offset.into());

            match part {
                DescriptorPart::Owner | DescriptorPart::Group => {
                    let end = parts[i + 1..]
                        .iter()
                        .map(|&(next, _)| next as usize)
                        .find(|&next| next > offset as usize)
                        .unwrap_or(bytes.len());
                    let sid = sd.read_sid(&mut reader, part, offset, end)?;
                    match part {
                        DescriptorPart::Owner => sd.owner_sid = sid,
                        _ => sd.group_sid = sid,
                    }
                }
                DescriptorPart::Sacl | DescriptorPart::Dacl => {
                    let kind = match part {
                        DescriptorPart::Sacl => AclKind::Sacl,
                        _ => AclKind::Dacl,
                    };
                    let acl = Acl::read(&mut reader).map_err(|source| Error::InvalidAcl {
                        kind,
                        offset,
                        source,
                    })?;
                    log::trace!("{kind} at {offset:#x} has {} entries", acl.ace.len());
                    sd.diagnostics
                        .extend(Self::acl_diagnostics(&acl, kind, config));
                    match kind {
                        AclKind::Sacl => sd.sacl = Some(acl),
                        AclKind::Dacl => sd.dacl = Some(acl),
                    }
                }
            }
        }

        if header.offset_owner == 0
            && header.offset_group == 0
            && config.owner_group_fallback == OwnerGroupFallback::FirstDaclPrincipal
        {
            sd.apply_owner_group_fallback();
        }

        if config.malformed_sid == MalformedSidPolicy::Reject {
            if let Some(diagnostic) = sd.diagnostics.iter().find(|d| d.is_malformed_sid()) {
                return Err(Error::MalformedSid(diagnostic.clone()));
            }
        }
        Ok(sd)
    }

    /// Reads the owner or group SID from the region ending at `end`.
    ///
    /// A SID that runs past the end of the buffer fails the decode; a malformed SID
    /// inside its region is only reported.
    fn read_sid(
        &mut self,
        reader: &mut Cursor<&[u8]>,
        part: DescriptorPart,
        offset: u32,
        end: usize,
    ) -> Result<Option<Sid>> {
        let invalid_sid = |source| Error::InvalidSid {
            part,
            offset,
            source,
        };
        let data = read_sized_bytes(reader, binrw::Endian::Little, (end - offset as usize,))
            .map_err(invalid_sid)?;
        match Sid::decode(&data) {
            Ok(sid) => Ok(Some(sid)),
            Err(SidError::InvalidLength { .. }) if end == reader.get_ref().len() => Err(
                invalid_sid(binrw::Error::Io(std::io::ErrorKind::UnexpectedEof.into())),
            ),
            Err(error) => {
                log::warn!("Malformed {part} SID at {offset:#x}: {error}");
                self.diagnostics.push(match part {
                    DescriptorPart::Owner => Diagnostic::MalformedOwnerSid(error),
                    _ => Diagnostic::MalformedGroupSid(error),
                });
                Ok(None)
            }
        }
    }

    fn acl_diagnostics(acl: &Acl, kind: AclKind, config: &DecodeConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (index, ace) in acl.ace.iter().enumerate() {
            if let AceType::Unknown(ace_type) = ace.ace_type {
                diagnostics.push(Diagnostic::UnknownAceType {
                    acl: kind,
                    index,
                    ace_type,
                });
            }
            if let Some(error) = ace.sid_error() {
                diagnostics.push(Diagnostic::MalformedAceSid {
                    acl: kind,
                    index,
                    error: error.clone(),
                });
            }
        }
        if config.check_acl_size {
            if let Some(actual) = acl.size_mismatch() {
                log::warn!(
                    "{kind} declares {} bytes, but its entries span {actual} bytes",
                    acl.acl_size
                );
                diagnostics.push(Diagnostic::AclSizeMismatch {
                    acl: kind,
                    declared: acl.acl_size,
                    actual,
                });
            }
        }
        diagnostics
    }

    /// Substitutes the first DACL entry's principal for a missing owner and group.
    fn apply_owner_group_fallback(&mut self) {
        let principal = self
            .dacl
            .as_ref()
            .and_then(|dacl| dacl.ace.first())
            .and_then(Ace::principal)
            .filter(|sid| !sid.is_null())
            .cloned();
        if let Some(sid) = principal {
            log::warn!("Descriptor has no owner or group offsets, using first DACL principal {sid}");
            self.owner_sid = Some(sid.clone());
            self.group_sid = Some(sid.clone());
            self.diagnostics.push(Diagnostic::OwnerGroupFromDacl(sid));
        }
    }

    pub fn control(&self) -> SecurityDescriptorControl {
        self.header.control
    }

    /// Every entry of the DACL, in order; empty without a DACL.
    pub fn dacl_entries(&self) -> &[Ace] {
        self.dacl.as_ref().map_or(&[], |dacl| dacl.ace.as_slice())
    }

    /// Every entry of the SACL, in order; empty without a SACL.
    pub fn sacl_entries(&self) -> &[Ace] {
        self.sacl.as_ref().map_or(&[], |sacl| sacl.ace.as_slice())
    }
}

impl TryFrom<&[u8]> for SecurityDescriptor {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        Self::parse(value)
    }
}
