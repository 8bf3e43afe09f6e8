// 单条目 ZIP 创建测试

mod common;

use std::fs;
use std::io::Read;

use common::{dir_listing, entry_bytes, make_sample_zip, open_with_zip_crate, test_temp_dir};
use rstest::rstest;
use zip_util::{list, unzip, zip, CompressionMethod, ZipError, ZipErrorKind};

/// 场景：zip 后再 unzip，目录中只有 inner/name.txt
#[test]
fn test_zip_then_unzip() {
    let tmp_dir = test_temp_dir();
    let input = tmp_dir.path().join("name.txt");
    fs::write(&input, "X").unwrap();
    let archive = tmp_dir.path().join("single.zip");
    let exdir = tmp_dir.path().join("D");

    zip(&input, "inner/name.txt", &archive).unwrap();
    unzip(&archive, &exdir).unwrap();

    assert_eq!(dir_listing(&exdir), vec!["inner"]);
    assert_eq!(dir_listing(&exdir.join("inner")), vec!["name.txt"]);
    assert_eq!(fs::read_to_string(exdir.join("inner/name.txt")).unwrap(), "X");
}

#[test]
fn test_zip_deflates_content() {
    let tmp_dir = test_temp_dir();
    let input = tmp_dir.path().join("big.txt");
    let content = "all work and no play makes jack a dull boy\n".repeat(1000);
    fs::write(&input, &content).unwrap();
    let archive = tmp_dir.path().join("big.zip");

    zip(&input, "big.txt", &archive).unwrap();

    let entries = list(&archive).unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.name, "big.txt");
    assert_eq!(entry.method, CompressionMethod::Deflated);
    assert_eq!(entry.uncompressed_size, content.len() as u64);
    assert!(entry.compressed_size.unwrap() < entry.uncompressed_size / 10);
    assert_eq!(entry_bytes(&archive, "big.txt"), content.as_bytes());
}

#[rstest]
#[case(&b""[..])]
#[case(&b"x"[..])]
#[case(&b"\x00\x01\x02\xff binary"[..])]
fn test_zip_readable_by_zip_crate(#[case] content: &[u8]) {
    let tmp_dir = test_temp_dir();
    let input = tmp_dir.path().join("input.bin");
    fs::write(&input, content).unwrap();
    let archive = tmp_dir.path().join("out.zip");

    zip(&input, "nested/deeper/input.bin", &archive).unwrap();

    let mut zip_archive = open_with_zip_crate(&archive);
    assert_eq!(zip_archive.len(), 1);
    let mut file = zip_archive.by_index(0).unwrap();
    assert_eq!(file.name(), "nested/deeper/input.bin");
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, content);
}

#[test]
fn test_zip_each_file_of_extracted_archive() {
    let tmp_dir = test_temp_dir();
    let sample = make_sample_zip(tmp_dir.path());
    let exdir = tmp_dir.path().join("extracted");
    unzip(&sample, &exdir).unwrap();

    for (name, expected) in [("a.txt", "hello"), ("dir/b.txt", "world")] {
        let single = tmp_dir.path().join("single.zip");
        zip(exdir.join(name), name, &single).unwrap();
        assert_eq!(entry_bytes(&single, name), expected.as_bytes());
    }
}

#[test]
fn test_zip_overwrites_existing_output() {
    let tmp_dir = test_temp_dir();
    let input = tmp_dir.path().join("new.txt");
    fs::write(&input, "new").unwrap();
    let archive = make_sample_zip(tmp_dir.path());

    zip(&input, "new.txt", &archive).unwrap();

    assert_eq!(list(&archive).unwrap().len(), 1);
    assert_eq!(entry_bytes(&archive, "new.txt"), b"new");
}

#[test]
fn test_zip_missing_input() {
    let tmp_dir = test_temp_dir();
    let archive = tmp_dir.path().join("out.zip");

    let err = zip(tmp_dir.path().join("missing.txt"), "missing.txt", &archive).unwrap_err();

    assert!(matches!(err, ZipError::FileOpen { .. }));
    assert_eq!(err.kind(), ZipErrorKind::NotFound);
    assert!(!archive.exists());
}

#[rstest]
#[case("")]
#[case("/etc/passwd")]
#[case("dir\\file.txt")]
fn test_zip_rejects_bad_names(#[case] name: &str) {
    let tmp_dir = test_temp_dir();
    let input = tmp_dir.path().join("input.txt");
    fs::write(&input, "content").unwrap();
    let archive = tmp_dir.path().join("out.zip");

    let err = zip(&input, name, &archive).unwrap_err();

    assert_eq!(err.kind(), ZipErrorKind::UnsafePath);
    assert!(!archive.exists());
}

#[test]
fn test_zip_output_directory_missing() {
    let tmp_dir = test_temp_dir();
    let input = tmp_dir.path().join("input.txt");
    fs::write(&input, "content").unwrap();

    let err = zip(&input, "input.txt", tmp_dir.path().join("no/such/dir/out.zip")).unwrap_err();

    assert!(matches!(err, ZipError::OpenWriteFailed { .. }));
}
