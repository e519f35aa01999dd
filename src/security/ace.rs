//! MS-DTYP 2.4.4: ACE

use std::fmt::Display;

use binrw::io::{Read, Seek};
use binrw::prelude::*;
use modular_bitfield::prelude::*;

use crate::{binrw_util::prelude::*, guid::Guid};

use super::{Sid, SidError};

/// A single access control entry.
///
/// The header's `ace_size` bounds everything that follows it: the body is always
/// read as exactly `ace_size - 8` bytes, whatever its shape.
#[binrw::binread]
#[derive(Debug, Clone, PartialEq, Eq)]
#[br(little)]
pub struct Ace {
    #[br(map = |x: u8| AceType::from(x))]
    pub ace_type: AceType,
    pub ace_flags: AceFlags,
    #[br(assert(
        ace_size >= Ace::MIN_SIZE,
        "ACE size {} is smaller than its {}-byte header and mask",
        ace_size,
        Ace::MIN_SIZE
    ))]
    pub ace_size: u16,
    pub access_mask: AccessMask,
    #[br(args(ace_type, ace_size - Ace::MIN_SIZE))]
    pub value: AceValue,
}

impl Ace {
    /// Header (type, flags, size) and access mask.
    pub const MIN_SIZE: u16 = 8;

    /// The principal this entry applies to.
    ///
    /// Returns `None` for entries without a known body shape. A malformed SID
    /// yields the zero [`Sid`]; see [`Ace::sid_error`].
    pub fn principal(&self) -> Option<&Sid> {
        match &self.value {
            AceValue::Basic(ace) => Some(&ace.sid.sid),
            AceValue::Object(ace) => Some(&ace.sid.sid),
            AceValue::Opaque(_) => None,
        }
    }

    /// Why the principal could not be decoded, if it could not.
    pub fn sid_error(&self) -> Option<&SidError> {
        match &self.value {
            AceValue::Basic(ace) => ace.sid.error.as_ref(),
            AceValue::Object(ace) => ace.sid.error.as_ref(),
            AceValue::Opaque(_) => None,
        }
    }

    pub fn object_type(&self) -> Option<&Guid> {
        match &self.value {
            AceValue::Object(ace) => ace.object_type.as_ref(),
            _ => None,
        }
    }

    pub fn inherited_object_type(&self) -> Option<&Guid> {
        match &self.value {
            AceValue::Object(ace) => ace.inherited_object_type.as_ref(),
            _ => None,
        }
    }
}

impl Display for Ace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let principal = self.principal().map(Sid::to_string).unwrap_or_default();
        writeln!(f, "SID: {principal}")?;
        writeln!(f, "AceType: {}", self.ace_type.name())?;
        writeln!(f, "Permissions: {}", self.access_mask.names().join(" "))?;
        if let AceValue::Object(ace) = &self.value {
            let fmt_guid = |g: Option<&Guid>| g.map(Guid::to_string).unwrap_or_default();
            writeln!(f, "ObjectType: {}", fmt_guid(ace.object_type.as_ref()))?;
            writeln!(
                f,
                "InheritedObjectType: {}",
                fmt_guid(ace.inherited_object_type.as_ref())
            )?;
        }
        writeln!(f, "Flags: {:#04x}", u8::from_le_bytes(self.ace_flags.into_bytes()))
    }
}

/// The body of an ACE, following its header and access mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AceValue {
    /// Allow, deny, audit and alarm entries, including their callback variants.
    Basic(BasicAce),
    /// The `*_OBJECT` and `*_CALLBACK_OBJECT` entries.
    Object(ObjectAce),
    /// Entries with no known body layout; the raw body is kept as-is.
    Opaque(Vec<u8>),
}

impl BinRead for AceValue {
    type Args<'a> = (AceType, u16);

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        (ace_type, body_size): Self::Args<'_>,
    ) -> BinResult<Self> {
        let value = match ace_type.shape() {
            Some(AceShape::Basic) => {
                AceValue::Basic(BasicAce::read_options(reader, endian, (body_size,))?)
            }
            Some(AceShape::Object) => {
                AceValue::Object(ObjectAce::read_options(reader, endian, (ace_type, body_size))?)
            }
            None => {
                if let AceType::Unknown(value) = ace_type {
                    log::warn!("Unknown ACE type {value:#x}, keeping {body_size} body bytes");
                }
                AceValue::Opaque(read_sized_bytes(reader, endian, (body_size as usize,))?)
            }
        };
        Ok(value)
    }
}

#[binrw::binread]
#[derive(Debug, Clone, PartialEq, Eq)]
#[br(import(body_size: u16))]
pub struct BasicAce {
    #[br(args(body_size as usize))]
    pub sid: AcePrincipal,
}

#[binrw::binread]
#[derive(Debug, Clone, PartialEq, Eq)]
#[br(import(ace_type: AceType, body_size: u16))]
pub struct ObjectAce {
    #[br(assert(
        ObjectAce::fixed_size(&flags) <= body_size as usize,
        "Object ACE body of {} bytes cannot hold its flags and object types ({} bytes)",
        body_size,
        ObjectAce::fixed_size(&flags)
    ))]
    pub flags: ObjectAceFlags,
    #[br(if(flags.object_type_present()))]
    pub object_type: Option<Guid>,
    #[br(if(flags.inherited_object_type_present()))]
    pub inherited_object_type: Option<Guid>,
    #[br(
        args(body_size as usize - ObjectAce::fixed_size(&flags)),
        map = |sid: AcePrincipal| if ace_type.is_callback() {
            sid
        } else {
            sid.fill_region(body_size as usize - ObjectAce::fixed_size(&flags))
        }
    )]
    pub sid: AcePrincipal,
}

impl ObjectAce {
    /// Bytes between the access mask and the SID.
    pub fn fixed_size(flags: &ObjectAceFlags) -> usize {
        let present = [
            flags.object_type_present(),
            flags.inherited_object_type_present(),
        ]
        .into_iter()
        .filter(|&p| p)
        .count();
        size_of::<ObjectAceFlags>() + present * Guid::GUID_SIZE
    }
}

/// The SID of an ACE, read from the region its record reserves for it.
///
/// A malformed SID does not fail the entry: the region is still consumed, the
/// zero [`Sid`] is kept, and the error is retained for diagnostics. A valid SID
/// that leaves bytes of a non-callback object entry unused is kept as decoded,
/// with the error set the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AcePrincipal {
    pub sid: Sid,
    pub error: Option<SidError>,
}

impl BinRead for AcePrincipal {
    type Args<'a> = (usize,);

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        (size,): Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let data = read_sized_bytes(reader, endian, (size,))?;
        Ok(match Sid::decode(&data) {
            Ok(sid) => AcePrincipal { sid, error: None },
            Err(error) => {
                log::warn!("Malformed ACE SID at {pos:#x}: {error}");
                AcePrincipal {
                    sid: Sid::default(),
                    error: Some(error),
                }
            }
        })
    }
}

impl From<Sid> for AcePrincipal {
    fn from(sid: Sid) -> Self {
        AcePrincipal { sid, error: None }
    }
}

impl AcePrincipal {
    /// Reports a SID that leaves part of its `region`-byte region unused.
    ///
    /// Only entries without trailing application data must be filled exactly.
    fn fill_region(mut self, region: usize) -> Self {
        let used = self.sid.wire_size();
        if self.error.is_none() && used != region {
            log::warn!("ACE SID {} uses {used} of its {region} bytes", self.sid);
            self.error = Some(SidError::UnusedBytes {
                declared: region,
                used,
            });
        }
        self
    }
}

#[bitfield]
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
#[br(map = Self::from_bytes)]
pub struct ObjectAceFlags {
    pub object_type_present: bool,
    pub inherited_object_type_present: bool,
    #[skip]
    __: B30,
}

/// Access mask of an ACE.
///
/// The low 16 bits are named after their directory-service meaning.
#[bitfield]
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
#[br(map = Self::from_bytes)]
pub struct AccessMask {
    pub create_child: bool,
    pub delete_child: bool,
    pub list_children: bool,
    pub self_write: bool,

    pub read_prop: bool,
    pub write_prop: bool,
    pub delete_tree: bool,
    pub list_object: bool,

    pub control_access: bool,
    #[skip]
    __: B7,

    pub delete: bool,
    pub read_control: bool,
    pub write_dacl: bool,
    pub write_owner: bool,

    pub synchronize: bool,
    #[skip]
    __: B3,

    pub access_system_security: bool,
    pub maximum_allowed: bool,
    #[skip]
    __: B2,

    pub generic_all: bool,
    pub generic_execute: bool,
    pub generic_write: bool,
    pub generic_read: bool,
}

type AccessRightFn = fn(&AccessMask) -> bool;

const ACCESS_RIGHT_NAMES: [(AccessRightFn, &str); 20] = [
    (AccessMask::create_child, "CREATE_CHILD"),
    (AccessMask::delete_child, "DELETE_CHILD"),
    (AccessMask::list_children, "LIST_CHILDREN"),
    (AccessMask::self_write, "SELF"),
    (AccessMask::read_prop, "READ_PROP"),
    (AccessMask::write_prop, "WRITE_PROP"),
    (AccessMask::delete_tree, "DELETE_TREE"),
    (AccessMask::list_object, "LIST_OBJECT"),
    (AccessMask::control_access, "CONTROL_ACCESS"),
    (AccessMask::delete, "DELETE"),
    (AccessMask::read_control, "READ_CONTROL"),
    (AccessMask::write_dacl, "WRITE_DACL"),
    (AccessMask::write_owner, "WRITE_OWNER"),
    (AccessMask::synchronize, "SYNCHRONIZE"),
    (AccessMask::access_system_security, "SYSTEM_SECURITY"),
    (AccessMask::maximum_allowed, "MAXIMUM_ALLOWED"),
    (AccessMask::generic_all, "GENERIC_ALL"),
    (AccessMask::generic_execute, "GENERIC_EXECUTE"),
    (AccessMask::generic_write, "GENERIC_WRITE"),
    (AccessMask::generic_read, "GENERIC_READ"),
];

impl AccessMask {
    pub fn from_u32(value: u32) -> Self {
        Self::from_bytes(value.to_le_bytes())
    }

    pub fn as_u32(&self) -> u32 {
        u32::from_le_bytes(self.into_bytes())
    }

    /// Names of the set rights, lowest bit first. Unnamed bits are skipped.
    pub fn names(&self) -> Vec<&'static str> {
        ACCESS_RIGHT_NAMES
            .iter()
            .filter(|(is_set, _)| is_set(self))
            .map(|(_, name)| *name)
            .collect()
    }
}

#[bitfield]
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
#[br(map = Self::from_bytes)]
pub struct AceFlags {
    pub object_inherit: bool,
    pub container_inherit: bool,
    pub no_propagate_inherit: bool,
    pub inherit_only: bool,

    pub inherited: bool,
    #[skip]
    __: bool,
    pub successful_access: bool,
    pub failed_access: bool,
}

/// The two body layouts an ACE can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AceShape {
    Basic,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AceType {
    AccessAllowed,
    AccessDenied,
    SystemAudit,
    SystemAlarm,
    AccessAllowedCompound,
    AccessAllowedObject,
    AccessDeniedObject,
    SystemAuditObject,
    SystemAlarmObject,
    AccessAllowedCallback,
    AccessDeniedCallback,
    AccessAllowedCallbackObject,
    AccessDeniedCallbackObject,
    SystemAuditCallback,
    SystemAlarmCallback,
    SystemAuditCallbackObject,
    SystemAlarmCallbackObject,
    /// A type outside the known range, kept for forward compatibility.
    Unknown(u8),
}

impl AceType {
    /// Every known type, in wire order.
    pub const ALL: [AceType; 17] = [
        AceType::AccessAllowed,
        AceType::AccessDenied,
        AceType::SystemAudit,
        AceType::SystemAlarm,
        AceType::AccessAllowedCompound,
        AceType::AccessAllowedObject,
        AceType::AccessDeniedObject,
        AceType::SystemAuditObject,
        AceType::SystemAlarmObject,
        AceType::AccessAllowedCallback,
        AceType::AccessDeniedCallback,
        AceType::AccessAllowedCallbackObject,
        AceType::AccessDeniedCallbackObject,
        AceType::SystemAuditCallback,
        AceType::SystemAlarmCallback,
        AceType::SystemAuditCallbackObject,
        AceType::SystemAlarmCallbackObject,
    ];

    pub fn as_u8(&self) -> u8 {
        match self {
            AceType::Unknown(value) => *value,
            known => Self::ALL
                .iter()
                .position(|t| t == known)
                .map_or(u8::MAX, |i| i as u8),
        }
    }

    /// The body layout of this type, or `None` when it has no known layout.
    pub fn shape(&self) -> Option<AceShape> {
        use AceType::*;
        match self {
            AccessAllowed | AccessDenied | SystemAudit | SystemAlarm | AccessAllowedCallback
            | AccessDeniedCallback | SystemAuditCallback | SystemAlarmCallback => {
                Some(AceShape::Basic)
            }
            AccessAllowedObject
            | AccessDeniedObject
            | SystemAuditObject
            | SystemAlarmObject
            | AccessAllowedCallbackObject
            | AccessDeniedCallbackObject
            | SystemAuditCallbackObject
            | SystemAlarmCallbackObject => Some(AceShape::Object),
            // Undocumented; no known layout.
            AccessAllowedCompound => None,
            Unknown(_) => None,
        }
    }

    /// Whether entries of this type may carry application data after the SID.
    pub fn is_callback(&self) -> bool {
        use AceType::*;
        matches!(
            self,
            AccessAllowedCallback
                | AccessDeniedCallback
                | AccessAllowedCallbackObject
                | AccessDeniedCallbackObject
                | SystemAuditCallback
                | SystemAlarmCallback
                | SystemAuditCallbackObject
                | SystemAlarmCallbackObject
        )
    }

    pub fn name(&self) -> &'static str {
        use AceType::*;
        match self {
            AccessAllowed => "ACCESS_ALLOWED",
            AccessDenied => "ACCESS_DENIED",
            SystemAudit => "SYSTEM_AUDIT",
            SystemAlarm => "SYSTEM_ALARM",
            AccessAllowedCompound => "ACCESS_ALLOWED_COMPOUND",
            AccessAllowedObject => "ACCESS_ALLOWED_OBJECT",
            AccessDeniedObject => "ACCESS_DENIED_OBJECT",
            SystemAuditObject => "SYSTEM_AUDIT_OBJECT",
            SystemAlarmObject => "SYSTEM_ALARM_OBJECT",
            AccessAllowedCallback => "ACCESS_ALLOWED_CALLBACK",
            AccessDeniedCallback => "ACCESS_DENIED_CALLBACK",
            AccessAllowedCallbackObject => "ACCESS_ALLOWED_CALLBACK_OBJECT",
            AccessDeniedCallbackObject => "ACCESS_DENIED_CALLBACK_OBJECT",
            SystemAuditCallback => "SYSTEM_AUDIT_CALLBACK",
            SystemAlarmCallback => "SYSTEM_ALARM_CALLBACK",
            SystemAuditCallbackObject => "SYSTEM_AUDIT_CALLBACK_OBJECT",
            SystemAlarmCallbackObject => "SYSTEM_ALARM_CALLBACK_OBJECT",
            Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for AceType {
    fn from(value: u8) -> Self {
        Self::ALL
            .get(value as usize)
            .copied()
            .unwrap_or(AceType::Unknown(value))
    }
}
