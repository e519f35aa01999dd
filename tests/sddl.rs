//! End-to-end decoding and SDDL rendering of security descriptors.

use winacl::{
    security::Diagnostic, AceType, DecodeConfig, Error, SecurityDescriptor, Sid, SidError,
    SidResolver, ToSddl,
};

const OWNER: &str = "S-1-5-21-782712087-4182988437-2163400469-1001";
const GROUP: &str = "S-1-5-21-782712087-4182988437-2163400469-513";
const DS_REPLICATION_GET_CHANGES: &str = "1131f6aa-9c07-11d1-f79f-00c04fc2dcd2";
const GUID_BYTES: [u8; 16] = [
    0xaa, 0xf6, 0x31, 0x11, 0x07, 0x9c, 0xd1, 0x11, 0xf7, 0x9f, 0x00, 0xc0, 0x4f, 0xc2, 0xdc, 0xd2,
];

fn sid_bytes(sid: &str) -> Vec<u8> {
    let sid: Sid = sid.parse().unwrap();
    let mut data = vec![sid.revision, sid.sub_authority.len() as u8];
    data.extend(&sid.identifier_authority.to_be_bytes()[2..]);
    for sub_authority in &sid.sub_authority {
        data.extend(sub_authority.to_le_bytes());
    }
    data
}

fn ace_bytes(ace_type: u8, flags: u8, mask: u32, body: &[u8]) -> Vec<u8> {
    let mut data = vec![ace_type, flags];
    data.extend(((8 + body.len()) as u16).to_le_bytes());
    data.extend(mask.to_le_bytes());
    data.extend(body);
    data
}

fn acl_bytes(aces: &[Vec<u8>]) -> Vec<u8> {
    let size = 8 + aces.iter().map(Vec::len).sum::<usize>();
    let mut data = vec![2, 0];
    data.extend((size as u16).to_le_bytes());
    data.extend((aces.len() as u16).to_le_bytes());
    data.extend([0, 0]);
    for ace in aces {
        data.extend(ace);
    }
    data
}

/// Lays out a self-relative descriptor: header, owner, group, SACL, DACL.
fn descriptor(
    control: u16,
    owner: Option<&str>,
    group: Option<&str>,
    sacl: Option<Vec<u8>>,
    dacl: Option<Vec<u8>>,
) -> Vec<u8> {
    let mut body = Vec::new();
    let mut offsets = [0u32; 4];
    let parts = [
        owner.map(sid_bytes),
        group.map(sid_bytes),
        sacl,
        dacl,
    ];
    for (offset, part) in offsets.iter_mut().zip(parts) {
        if let Some(part) = part {
            *offset = (20 + body.len()) as u32;
            body.extend(part);
        }
    }
    let mut data = vec![1, 0];
    data.extend(control.to_le_bytes());
    for offset in offsets {
        data.extend(offset.to_le_bytes());
    }
    data.extend(body);
    data
}

#[test_log::test]
fn test_everyone_generic_read() {
    let dacl = acl_bytes(&[ace_bytes(0, 0, 0x8000_0000, &sid_bytes(Sid::S_EVERYONE))]);
    let data = descriptor(0, Some(OWNER), Some(GROUP), None, Some(dacl));
    let sd = SecurityDescriptor::parse(&data).unwrap();
    assert!(sd.diagnostics.is_empty());
    assert_eq!(
        sd.to_sddl(),
        format!("O:{OWNER}G:{GROUP}D:(A;;GR;;;WD)")
    );
}

#[test_log::test]
fn test_object_ace_with_object_type_only() {
    let guid: winacl::Guid = DS_REPLICATION_GET_CHANGES.parse().unwrap();
    let mut body = 1u32.to_le_bytes().to_vec();
    body.extend(GUID_BYTES);
    body.extend(sid_bytes(GROUP));
    let dacl = acl_bytes(&[ace_bytes(5, 0, 0x100, &body)]);
    let data = descriptor(0x8004, Some(OWNER), Some(GROUP), None, Some(dacl));

    let sd = SecurityDescriptor::parse(&data).unwrap();
    let ace = &sd.dacl_entries()[0];
    assert_eq!(ace.ace_type, AceType::AccessAllowedObject);
    assert_eq!(ace.object_type(), Some(&guid));
    assert_eq!(ace.inherited_object_type(), None);
    assert_eq!(
        ace.to_sddl(),
        format!("(OA;;CR;{DS_REPLICATION_GET_CHANGES};;{GROUP})")
    );
}

#[test_log::test]
fn test_resolver_and_sddl_disagree_on_domain_groups() {
    let domain_admins = "S-1-5-21-782712087-4182988437-2163400469-512";
    let dacl = acl_bytes(&[ace_bytes(0, 0, 0x1000_0000, &sid_bytes(domain_admins))]);
    let data = descriptor(0, Some(OWNER), Some(GROUP), None, Some(dacl));
    let sd = SecurityDescriptor::parse(&data).unwrap();
    let principal = sd.dacl_entries()[0].principal().unwrap();

    assert_eq!(principal.resolve(), "Domain Admins");
    assert_eq!(SidResolver::global().resolve(principal), "Domain Admins");
    assert_eq!(
        sd.dacl_entries()[0].to_sddl(),
        format!("(A;;GA;;;{domain_admins})")
    );
}

#[test_log::test]
fn test_owner_region_matches_offsets() {
    let data = descriptor(0, Some(OWNER), Some(GROUP), None, None);
    let sd = SecurityDescriptor::parse(&data).unwrap();
    let consumed = sd.owner_sid.as_ref().unwrap().wire_size();
    assert_eq!(
        consumed,
        (sd.header.offset_group - sd.header.offset_owner) as usize
    );
    assert_eq!(sd.to_sddl(), format!("O:{OWNER}G:{GROUP}"));
}

#[test_log::test]
fn test_sixteen_sub_authorities_rejected() {
    let mut too_long = vec![1u8, 16, 0, 0, 0, 0, 0, 5];
    too_long.extend([0u8; 16 * 4]);
    let dacl = acl_bytes(&[
        ace_bytes(0, 0, 0x1, &too_long),
        ace_bytes(0, 0, 0x1, &sid_bytes(Sid::S_LOCAL_SYSTEM)),
    ]);
    let data = descriptor(0, Some(OWNER), Some(GROUP), None, Some(dacl));

    let sd = SecurityDescriptor::parse(&data).unwrap();
    assert_eq!(
        sd.dacl_entries()[0].sid_error(),
        Some(&SidError::TooManySubAuthorities(16))
    );
    assert_eq!(sd.to_sddl(), format!("O:{OWNER}G:{GROUP}D:(A;;CC;;;)(A;;CC;;;SY)"));

    let err = SecurityDescriptor::parse_with_config(&data, &DecodeConfig::strict()).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedSid(Diagnostic::MalformedAceSid { index: 0, .. })
    ));
}

#[test_log::test]
fn test_sacl_and_dacl_flags() {
    let sacl = acl_bytes(&[ace_bytes(2, 0xc0, 0x10000, &sid_bytes(Sid::S_EVERYONE))]);
    let dacl = acl_bytes(&[
        ace_bytes(1, 0x3, 0x40000, &sid_bytes(Sid::S_EVERYONE)),
        ace_bytes(0, 0x10, 0x1f01ff, &sid_bytes(Sid::S_ADMINISTRATORS)),
    ]);
    // SE_DACL_PROTECTED | SE_DACL_AUTO_INHERITED | SE_SACL_AUTO_INHERITED, self-relative.
    let data = descriptor(0x9c14, Some(OWNER), None, Some(sacl), Some(dacl));
    let sd = SecurityDescriptor::parse(&data).unwrap();
    assert_eq!(sd.group_sid, None);
    assert_eq!(
        sd.to_sddl(),
        format!(
            "O:{OWNER}D:AIP(D;OICI;WD;;;WD)(A;ID;CCDCLCSWRPWPDTLOCRSDRCWDWO;;;BA)S:AI(AU;SAFA;SD;;;WD)"
        )
    );
}

#[test_log::test]
fn test_rendering_is_stable() {
    let dacl = acl_bytes(&[
        ace_bytes(0, 0x1f, 0xf01f_01ff, &sid_bytes(Sid::S_LOCAL_SYSTEM)),
        ace_bytes(1, 0xc0, 0x8000_0000, &sid_bytes(OWNER)),
    ]);
    let data = descriptor(0x1504, Some(OWNER), Some(GROUP), None, Some(dacl));
    let first = SecurityDescriptor::parse(&data).unwrap().to_sddl();
    let second = SecurityDescriptor::parse(&data).unwrap().to_sddl();
    assert_eq!(first, second);
    assert!(first.starts_with(&format!("O:{OWNER}G:{GROUP}D:ARAIP(A;OICINPIOID;")));
}

#[test_log::test]
fn test_dacl_only_descriptor_uses_first_principal() {
    let dacl = acl_bytes(&[
        ace_bytes(0, 0, 0x1, &sid_bytes(OWNER)),
        ace_bytes(0, 0, 0x1, &sid_bytes(Sid::S_EVERYONE)),
    ]);
    let data = descriptor(0x8004, None, None, None, Some(dacl));
    let sd = SecurityDescriptor::parse(&data).unwrap();
    assert_eq!(
        sd.diagnostics,
        vec![Diagnostic::OwnerGroupFromDacl(OWNER.parse().unwrap())]
    );
    assert_eq!(
        sd.to_sddl(),
        format!("O:{OWNER}G:{OWNER}D:(A;;CC;;;{OWNER})(A;;CC;;;WD)")
    );
}

#[test_log::test]
fn test_dacl_before_owner_and_group() {
    let dacl = acl_bytes(&[ace_bytes(0, 0, 0x8000_0000, &sid_bytes(Sid::S_EVERYONE))]);
    let owner = sid_bytes(Sid::S_ADMINISTRATORS);
    let group = sid_bytes(Sid::S_LOCAL_SYSTEM);
    let offset_owner = 20 + dacl.len() as u32;
    let offset_group = offset_owner + owner.len() as u32;

    let mut data = vec![1, 0];
    data.extend(0x8004u16.to_le_bytes());
    for offset in [offset_owner, offset_group, 0, 20] {
        data.extend(offset.to_le_bytes());
    }
    data.extend(&dacl);
    data.extend(&owner);
    data.extend(&group);

    let sd = SecurityDescriptor::parse(&data).unwrap();
    assert!(sd.diagnostics.is_empty());
    assert_eq!(sd.to_sddl(), "O:S-1-5-32-544G:S-1-5-18D:(A;;GR;;;WD)");
    assert_eq!(
        sd.owner_sid.as_ref().unwrap().wire_size(),
        (offset_group - offset_owner) as usize
    );
    assert_eq!(
        sd.group_sid.as_ref().unwrap().wire_size(),
        data.len() - offset_group as usize
    );
}

#[test_log::test]
fn test_object_ace_with_unused_bytes_is_malformed() {
    let mut body = 1u32.to_le_bytes().to_vec();
    body.extend(GUID_BYTES);
    body.extend(sid_bytes(Sid::S_EVERYONE));
    body.extend([0u8; 4]);
    let dacl = acl_bytes(&[ace_bytes(5, 0, 0x100, &body)]);
    let data = descriptor(0x8004, Some(OWNER), Some(GROUP), None, Some(dacl));

    let sd = SecurityDescriptor::parse(&data).unwrap();
    assert_eq!(sd.dacl_entries()[0].ace_size, 44);
    assert_eq!(
        sd.diagnostics,
        vec![Diagnostic::MalformedAceSid {
            acl: winacl::security::AclKind::Dacl,
            index: 0,
            error: SidError::UnusedBytes {
                declared: 16,
                used: 12
            },
        }]
    );

    let err = SecurityDescriptor::parse_with_config(&data, &DecodeConfig::strict()).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedSid(Diagnostic::MalformedAceSid { index: 0, .. })
    ));
}
