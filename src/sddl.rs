//! SDDL rendering of decoded security structures.
//!
//! MS-DTYP 2.5.1: Security Descriptor Description Language. Flags and rights are
//! always written in ascending bit order; bits without an abbreviation are
//! written as nothing.

use std::fmt::{self, Write};

use crate::security::{
    AccessMask, Ace, AceFlags, Acl, AclKind, SecurityDescriptor, SecurityDescriptorControl, Sid,
};

/// Types that have an SDDL form.
pub trait ToSddl {
    fn write_sddl<W: Write>(&self, out: &mut W) -> fmt::Result;

    fn to_sddl(&self) -> String {
        let mut sddl = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_sddl(&mut sddl);
        sddl
    }
}

/// Abbreviations of the ACE types, by type value. Types without an SDDL form are empty.
const ACE_TYPE_SDDL: [&str; 17] = [
    "A", "D", "AU", "AL", "", "OA", "OD", "OU", "OL", "XA", "XD", "", "", "XU", "", "", "",
];

const ACE_FLAG_SDDL: [(fn(&AceFlags) -> bool, &str); 7] = [
    (AceFlags::object_inherit, "OI"),
    (AceFlags::container_inherit, "CI"),
    (AceFlags::no_propagate_inherit, "NP"),
    (AceFlags::inherit_only, "IO"),
    (AceFlags::inherited, "ID"),
    (AceFlags::successful_access, "SA"),
    (AceFlags::failed_access, "FA"),
];

const ACCESS_RIGHT_SDDL: [(fn(&AccessMask) -> bool, &str); 17] = [
    (AccessMask::create_child, "CC"),
    (AccessMask::delete_child, "DC"),
    (AccessMask::list_children, "LC"),
    (AccessMask::self_write, "SW"),
    (AccessMask::read_prop, "RP"),
    (AccessMask::write_prop, "WP"),
    (AccessMask::delete_tree, "DT"),
    (AccessMask::list_object, "LO"),
    (AccessMask::control_access, "CR"),
    (AccessMask::delete, "SD"),
    (AccessMask::read_control, "RC"),
    (AccessMask::write_dacl, "WD"),
    (AccessMask::write_owner, "WO"),
    (AccessMask::generic_all, "GA"),
    (AccessMask::generic_execute, "GX"),
    (AccessMask::generic_write, "GW"),
    (AccessMask::generic_read, "GR"),
];

const DACL_CONTROL_SDDL: [(fn(&SecurityDescriptorControl) -> bool, &str); 3] = [
    (SecurityDescriptorControl::dacl_computed, "AR"),
    (SecurityDescriptorControl::dacl_auto_inherited, "AI"),
    (SecurityDescriptorControl::dacl_protected, "P"),
];

const SACL_CONTROL_SDDL: [(fn(&SecurityDescriptorControl) -> bool, &str); 3] = [
    (SecurityDescriptorControl::sacl_computed, "AR"),
    (SecurityDescriptorControl::sacl_auto_inherited, "AI"),
    (SecurityDescriptorControl::sacl_protected, "P"),
];

/// SID strings with a two-letter SDDL alias.
const SID_ABBREVIATIONS: [(&str, &str); 27] = [
    ("S-1-1-0", "WD"),
    ("S-1-3-0", "CO"),
    ("S-1-3-1", "CG"),
    ("S-1-5-2", "NU"),
    ("S-1-5-4", "IU"),
    ("S-1-5-6", "SU"),
    ("S-1-5-7", "AN"),
    ("S-1-5-9", "ED"),
    ("S-1-5-10", "PS"),
    ("S-1-5-11", "AU"),
    ("S-1-5-12", "RC"),
    ("S-1-5-18", "SY"),
    ("S-1-5-19", "LS"),
    ("S-1-5-20", "NS"),
    ("S-1-5-32-544", "BA"),
    ("S-1-5-32-545", "BU"),
    ("S-1-5-32-546", "BG"),
    ("S-1-5-32-547", "PU"),
    ("S-1-5-32-548", "AO"),
    ("S-1-5-32-549", "SO"),
    ("S-1-5-32-550", "PO"),
    ("S-1-5-32-551", "BO"),
    ("S-1-5-32-552", "RE"),
    ("S-1-5-32-554", "RU"),
    ("S-1-5-32-555", "RD"),
    ("S-1-5-32-556", "NO"),
    ("S-1-5-32-558", "MY"),
];

/// The SDDL alias of a SID string, if it has one.
pub fn sid_abbreviation(sid: &str) -> Option<&'static str> {
    SID_ABBREVIATIONS
        .iter()
        .find(|(s, _)| *s == sid)
        .map(|(_, abbreviation)| *abbreviation)
}

fn write_set<T, W: Write>(value: &T, table: &[(fn(&T) -> bool, &str)], out: &mut W) -> fmt::Result {
    for (is_set, abbreviation) in table {
        if is_set(value) {
            out.write_str(abbreviation)?;
        }
    }
    Ok(())
}

/// A SID as an ACE principal: its alias when it has one, its `S-...` form otherwise.
impl ToSddl for Sid {
    fn write_sddl<W: Write>(&self, out: &mut W) -> fmt::Result {
        let sid = self.to_string();
        out.write_str(sid_abbreviation(&sid).unwrap_or(&sid))
    }
}

impl ToSddl for AceFlags {
    fn write_sddl<W: Write>(&self, out: &mut W) -> fmt::Result {
        write_set(self, &ACE_FLAG_SDDL, out)
    }
}

impl ToSddl for AccessMask {
    fn write_sddl<W: Write>(&self, out: &mut W) -> fmt::Result {
        write_set(self, &ACCESS_RIGHT_SDDL, out)
    }
}

/// `(type;flags;rights;object_guid;inherited_object_guid;principal)`
impl ToSddl for Ace {
    fn write_sddl<W: Write>(&self, out: &mut W) -> fmt::Result {
        let ace_type = ACE_TYPE_SDDL
            .get(self.ace_type.as_u8() as usize)
            .copied()
            .unwrap_or_default();
        write!(out, "({ace_type};")?;
        self.ace_flags.write_sddl(out)?;
        out.write_char(';')?;
        self.access_mask.write_sddl(out)?;
        out.write_char(';')?;
        if let Some(guid) = self.object_type() {
            write!(out, "{guid}")?;
        }
        out.write_char(';')?;
        if let Some(guid) = self.inherited_object_type() {
            write!(out, "{guid}")?;
        }
        out.write_char(';')?;
        if let Some(principal) = self.principal() {
            principal.write_sddl(out)?;
        }
        out.write_char(')')
    }
}

/// The entries of the list, without the `D:`/`S:` prefix or flags.
impl ToSddl for Acl {
    fn write_sddl<W: Write>(&self, out: &mut W) -> fmt::Result {
        for ace in &self.ace {
            ace.write_sddl(out)?;
        }
        Ok(())
    }
}

impl Acl {
    /// Writes the list as a descriptor component: `D:` or `S:`, the list's
    /// control flags, then its entries.
    pub fn write_sddl_component<W: Write>(
        &self,
        kind: AclKind,
        control: SecurityDescriptorControl,
        out: &mut W,
    ) -> fmt::Result {
        let prefix = match kind {
            AclKind::Dacl => "D:",
            AclKind::Sacl => "S:",
        };
        write!(out, "{prefix}{}", control.sddl_flags(kind))?;
        self.write_sddl(out)
    }
}

impl SecurityDescriptorControl {
    /// The SDDL flags of one of the lists: any of `AR`, `AI` and `P`, in that order.
    pub fn sddl_flags(&self, kind: AclKind) -> String {
        let table = match kind {
            AclKind::Dacl => &DACL_CONTROL_SDDL,
            AclKind::Sacl => &SACL_CONTROL_SDDL,
        };
        let mut flags = String::new();
        let _ = write_set(self, table, &mut flags);
        flags
    }
}

/// `O:owner G:group D:dacl S:sacl`, leaving out whatever the descriptor lacks.
///
/// Owner and group are written in their `S-...` form.
impl ToSddl for SecurityDescriptor {
    fn write_sddl<W: Write>(&self, out: &mut W) -> fmt::Result {
        if let Some(owner) = &self.owner_sid {
            write!(out, "O:{owner}")?;
        }
        if let Some(group) = &self.group_sid {
            write!(out, "G:{group}")?;
        }
        if let Some(dacl) = &self.dacl {
            dacl.write_sddl_component(AclKind::Dacl, self.header.control, out)?;
        }
        if let Some(sacl) = &self.sacl {
            sacl.write_sddl_component(AclKind::Sacl, self.header.control, out)?;
        }
        Ok(())
    }
}
