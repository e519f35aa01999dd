//! Decoding of self-relative Windows security descriptors (MS-DTYP 2.4.6)
//! and their rendering as SDDL strings.

pub mod binrw_util;
pub mod config;
pub mod error;
pub mod guid;
pub mod resolver;
pub mod sddl;
pub mod security;

pub use config::{DecodeConfig, MalformedSidPolicy, OwnerGroupFallback};
pub use error::Error;
pub use guid::Guid;
pub use resolver::SidResolver;
pub use sddl::ToSddl;
pub use security::{
    Ace, AceType, Acl, AclKind, Diagnostic, SecurityDescriptor, SecurityDescriptorControl, Sid,
    SidError,
};

pub type Result<T> = std::result::Result<T, crate::Error>;
