use super::*;

fn header(major: u16) -> Vec<u8> {
    let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00];
    bytes.extend_from_slice(&major.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x10]);
    bytes
}

#[test]
fn parses_versions() {
    let metadata = parse_header(&header(52)).unwrap();
    assert_eq!(metadata.major_version, 52);
    assert_eq!(metadata.minor_version, 0);
    assert_eq!(metadata.release(), 8);
}

#[test]
fn rejects_short_input() {
    assert_eq!(
        parse_header(&[0xCA, 0xFE]),
        Err(ClassFormatError::Truncated { len: 2 })
    );
}

#[test]
fn rejects_wrong_magic() {
    let err = parse_header(&[0, 1, 2, 3, 0, 0, 0, 52]).unwrap_err();
    assert_eq!(err, ClassFormatError::BadMagic { found: 0x0001_0203 });
    assert_eq!(err.to_string(), "bad class file magic 0x00010203");
}

#[test]
fn artifact_keeps_bytes() {
    let bytes = header(51);
    let artifact =
        ClassArtifact::from_bytes("a.B".into(), bytes.clone(), PathBuf::from("a/B.class")).unwrap();
    assert_eq!(&artifact.bytes[..], &bytes[..]);
    assert_eq!(artifact.metadata.release(), 7);
}
