//! Human-readable names for well-known SIDs.
//!
//! Display only: SDDL rendering never consults the resolver.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::{security::Sid, Result};

/// Well-known SIDs with a fixed string form.
const WELL_KNOWN_NAMES: &[(&str, &str)] = &[
    ("S-1-0", "Null Authority"),
    ("S-1-0-0", "Nobody"),
    ("S-1-1", "World Authority"),
    ("S-1-1-0", "Everyone"),
    ("S-1-2", "Local Authority"),
    ("S-1-2-0", "Local (Users with the ability to log in locally)"),
    ("S-1-2-1", "Console Logon (Users who are logged onto the physical console)"),
    ("S-1-3", "Creator Authority"),
    ("S-1-3-0", "Creator Owner"),
    ("S-1-3-1", "Creator Group"),
    ("S-1-3-2", "Creator Owner Server"),
    ("S-1-3-3", "Creator Group Server"),
    ("S-1-3-4", "Creator Owner Rights"),
    ("S-1-4", "Non-unique Authority"),
    ("S-1-5", "NT Authority"),
    ("S-1-5-1", "Dialup"),
    ("S-1-5-2", "Network Logon User"),
    ("S-1-5-3", "Batch"),
    ("S-1-5-4", "Interactively logged-on User"),
    ("S-1-5-6", "Service Logon User"),
    ("S-1-5-7", "Anonymous"),
    ("S-1-5-8", "Proxy"),
    ("S-1-5-9", "Enterprise Domain Controllers"),
    ("S-1-5-10", "Principal Self"),
    ("S-1-5-11", "Authenticated Users"),
    ("S-1-5-12", "Restricted Code"),
    ("S-1-5-13", "Terminal Server Users"),
    ("S-1-5-14", "Remote Interactive Logon"),
    ("S-1-5-15", "This Organization"),
    ("S-1-5-17", "This Organization (Used by the default IIS user)"),
    ("S-1-5-18", "Local System"),
    ("S-1-5-19", "Local Service"),
    ("S-1-5-20", "Network Service"),
    ("S-1-5-21-0-0-0-498", "Enterprise Read-Only Domain Controllers Group"),
    ("S-1-5-21-0-0-0-500", "Local Administrator"),
    ("S-1-5-21-0-0-0-501", "Local Guest"),
    ("S-1-5-21-0-0-0-512", "Domain Admins"),
    ("S-1-5-21-0-0-0-513", "Domain Users"),
    ("S-1-5-21-0-0-0-514", "Domain Guests"),
    ("S-1-5-21-0-0-0-515", "Domain Computers"),
    ("S-1-5-21-0-0-0-516", "Domain Controllers"),
    ("S-1-5-21-0-0-0-517", "Domain Certificate Publishers Admins"),
    ("S-1-5-21-0-0-0-518", "Schema Administrators"),
    ("S-1-5-21-0-0-0-519", "Enterprise Admins"),
    ("S-1-5-21-0-0-0-520", "Group Policy Creator Owners Admins"),
    ("S-1-5-21-0-0-0-522", "Clonable Domain Controllers"),
    ("S-1-5-21-0-0-0-553", "RAS Remote Access Services Servers"),
    ("S-1-5-32-544", "BUILTIN Administrators"),
    ("S-1-5-32-545", "BUILTIN Users"),
    ("S-1-5-32-546", "BUILTIN Guests"),
    ("S-1-5-32-547", "BUILTIN Power Users"),
    ("S-1-5-32-548", "BUILTIN Account Operators"),
    ("S-1-5-32-549", "BUILTIN System/Server Operators"),
    ("S-1-5-32-550", "BUILTIN Printer Operators"),
    ("S-1-5-32-551", "BUILTIN Backup Operators"),
    ("S-1-5-32-552", "BUILTIN Replicator"),
    ("S-1-5-32-554", "BUILTIN\\Pre-Windows 2000 Compatible Access"),
    ("S-1-5-32-555", "BUILTIN\\Remote Desktop Users"),
    ("S-1-5-32-556", "BUILTIN\\Network Configuration Operators"),
    ("S-1-5-32-557", "BUILTIN\\Incoming Forest Trust Builders"),
    ("S-1-5-32-558", "BUILTIN\\Performance Monitor Users"),
    ("S-1-5-32-559", "BUILTIN\\Performance Log Users"),
    ("S-1-5-32-560", "BUILTIN\\Windows Authorization Access Group"),
    ("S-1-5-32-561", "BUILTIN\\Terminal Server License Servers"),
    ("S-1-5-32-562", "BUILTIN\\Distributed COM Users"),
    ("S-1-5-32-568", "BUILTIN\\IIS IUSRS"),
    ("S-1-5-32-569", "BUILTIN\\Cryptographic Operators"),
    ("S-1-5-32-573", "BUILTIN\\Event Log Readers"),
    ("S-1-5-32-574", "BUILTIN\\Certificate Service DCOM Access"),
    ("S-1-5-32-575", "BUILTIN\\RDS Remote Access Servers"),
    ("S-1-5-32-576", "BUILTIN\\RDS Endpoint Servers"),
    ("S-1-5-32-577", "BUILTIN\\RDS Management Servers"),
    ("S-1-5-32-578", "BUILTIN\\Hyper V Admins"),
    ("S-1-5-32-579", "BUILTIN\\Access Control Assistance Operators"),
    ("S-1-5-32-580", "BUILTIN\\Remote Management Users"),
    ("S-1-5-33", "Write Restricted"),
    ("S-1-5-64-10", "NTLM Authentication"),
    ("S-1-5-64-14", "SChannel Authentication"),
    ("S-1-5-64-21", "Digest Authentication"),
    ("S-1-5-80", "NT Service"),
    ("S-1-5-80-956008885-3418522649-1831038044-1853292631-2271478464", "TrustedInstaller"),
    ("S-1-5-84-0-0-0-0-0", "User Mode Driver"),
    ("S-1-5-86-615999462-62705297-2911207457-59056572-3668589837", "WMI (Network Service)"),
    ("S-1-5-86-1544737700-199408000-2549878335-3519669259-381336952", "WMI (Local Service)"),
    ("S-1-5-1000", "Other Organization"),
    ("S-1-15-2-1", "All App Packages"),
    ("S-1-15-2-2", "Any Restricted App Packages"),
    ("S-1-16-0", "Untrusted Mandatory Level"),
    ("S-1-16-4096", "Low integrity level"),
    ("S-1-16-8192", "Medium integrity level"),
    ("S-1-16-8448", "Medium-plus integrity level"),
    ("S-1-16-12288", "High Integrity level"),
    ("S-1-16-16384", "System Integrity level"),
    ("S-1-16-20480", "Protected Process Mandatory Level"),
    ("S-1-16-28672", "Secure Process Mandatory Level"),
];

/// Well-known SIDs identified by their relative identifier, checked in order.
const WELL_KNOWN_PATTERNS: &[(&str, &str)] = &[
    (r"S-1-5-[0-9-]+-500", "Administrator"),
    (r"S-1-5-[0-9-]+-501", "Guest"),
    (r"S-1-5-[0-9-]+-502", "KRBTGT"),
    (r"S-1-5-[0-9-]+-512", "Domain Admins"),
    (r"S-1-5-[0-9-]+-513", "Domain Users"),
    (r"S-1-5-[0-9-]+-514", "Domain Guests"),
    (r"S-1-5-[0-9-]+-515", "Domain Computers"),
    (r"S-1-5-[0-9-]+-516", "Domain Controllers"),
    (r"S-1-5-[0-9-]+-517", "Cert Publishers"),
    (r"S-1-5-[0-9-]+-520", "Group Policy Creator Owners"),
    (r"S-1-5-[0-9-]+-533", "RAS and IAS Servers"),
    (r"S-1-5-5-[0-9]+-[0-9]+", "Logon Session"),
    (r"S-1-5-21-[0-9-]+-518", "Schema Admins"),
    (r"S-1-5-21-[0-9-]+-519", "Enterprise Admins"),
    (r"S-1-5-21-[0-9-]+-553", "RAS Servers"),
];

static DEFAULT_RESOLVER: LazyLock<SidResolver> =
    LazyLock::new(|| SidResolver::new().expect("built-in SID patterns are valid"));

/// Maps SIDs to display names.
///
/// An exact match on the SID string wins; otherwise the patterns are tried in
/// the order they were added, and the first whole-string match wins. Unknown
/// SIDs resolve to their `S-...` form.
#[derive(Debug, Clone)]
pub struct SidResolver {
    names: HashMap<String, String>,
    patterns: Vec<(Regex, String)>,
}

impl SidResolver {
    /// A resolver loaded with the well-known SID tables.
    pub fn new() -> Result<Self> {
        let mut resolver = Self::empty();
        for (sid, name) in WELL_KNOWN_NAMES {
            resolver = resolver.with_name(sid, name);
        }
        for (pattern, name) in WELL_KNOWN_PATTERNS {
            resolver = resolver.with_pattern(pattern, name)?;
        }
        Ok(resolver)
    }

    /// A resolver that knows no names.
    pub fn empty() -> Self {
        SidResolver {
            names: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    /// The shared resolver with the well-known SID tables.
    pub fn global() -> &'static SidResolver {
        &DEFAULT_RESOLVER
    }

    pub fn with_name(mut self, sid: &str, name: &str) -> Self {
        self.names.insert(sid.to_string(), name.to_string());
        self
    }

    /// Adds a pattern, tried after every pattern added before it.
    ///
    /// `pattern` must match the whole SID string.
    pub fn with_pattern(mut self, pattern: &str, name: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        self.patterns.push((regex, name.to_string()));
        Ok(self)
    }

    /// The display name of `sid`, or its string form when it has none.
    pub fn resolve(&self, sid: &Sid) -> String {
        let sid = sid.to_string();
        if let Some(name) = self.names.get(&sid) {
            return name.clone();
        }
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(&sid))
            .map(|(_, name)| name.clone())
            .unwrap_or(sid)
    }
}

impl Sid {
    /// The display name of this SID, using the well-known SID tables.
    pub fn resolve(&self) -> String {
        SidResolver::global().resolve(self)
    }
}
