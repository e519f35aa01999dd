//! Decoding configuration settings.

/// What to use for the owner and group when the descriptor header gives no offset for either.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OwnerGroupFallback {
    /// Use the principal of the first DACL entry for both, and report it as a
    /// [`Diagnostic::OwnerGroupFromDacl`](crate::Diagnostic::OwnerGroupFromDacl).
    /// Some encoders emit descriptors this way.
    #[default]
    FirstDaclPrincipal,
    /// Leave owner and group unset.
    None,
}

/// How a SID that fails to decode is handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MalformedSidPolicy {
    /// Keep decoding; the SID is left unset and reported as a diagnostic.
    #[default]
    Tolerate,
    /// Fail the whole decode with [`Error::MalformedSid`](crate::Error::MalformedSid).
    Reject,
}

/// Specifies how a security descriptor is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// See [`OwnerGroupFallback`].
    pub owner_group_fallback: OwnerGroupFallback,

    /// Whether to compare each ACL's declared size with the size of its entries.
    ///
    /// Entries are always parsed by count; a mismatch is only reported as a diagnostic.
    /// This is enabled by default.
    pub check_acl_size: bool,

    /// See [`MalformedSidPolicy`].
    pub malformed_sid: MalformedSidPolicy,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            owner_group_fallback: OwnerGroupFallback::default(),
            check_acl_size: true,
            malformed_sid: MalformedSidPolicy::default(),
        }
    }
}

impl DecodeConfig {
    /// A configuration that rejects malformed SIDs and never substitutes owner or group.
    pub fn strict() -> Self {
        Self {
            owner_group_fallback: OwnerGroupFallback::None,
            check_acl_size: true,
            malformed_sid: MalformedSidPolicy::Reject,
        }
    }
}
