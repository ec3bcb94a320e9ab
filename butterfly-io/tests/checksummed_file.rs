use butterfly_io::{ChecksumReader, ChecksumWriter, ReadExt, WriteExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};

fn write_record_file(path: &std::path::Path) {
    let file = File::create(path).unwrap();
    let mut writer = ChecksumWriter::new(BufWriter::new(file));
    writer.write_var_u32(2).unwrap();
    writer.write_string("highway").unwrap();
    writer.write_string("residential").unwrap();
    writer.write_f64_le(4.3517).unwrap();
    let (crc, mut inner) = writer.finish();
    inner.write_u64_le(crc).unwrap();
    inner.flush().unwrap();
}

fn read_record_file(path: &std::path::Path) -> (Vec<String>, bool) {
    let file = File::open(path).unwrap();
    let mut reader = ChecksumReader::new(BufReader::new(file));
    let count = reader.read_var_u32().unwrap();
    let mut strings = Vec::new();
    for _ in 0..count {
        strings.push(reader.read_string().unwrap());
    }
    let _lon = reader.read_f64_le().unwrap();
    let (crc, mut inner) = reader.finish();
    let stored = inner.read_u64_le().unwrap();
    (strings, crc == stored)
}

#[test]
fn checksummed_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.bin");

    write_record_file(&path);
    let (strings, valid) = read_record_file(&path);

    assert_eq!(strings, vec!["highway", "residential"]);
    assert!(valid);
}

#[test]
fn corrupted_payload_fails_the_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.bin");
    write_record_file(&path);

    // flip a byte inside "residential"
    let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(10)).unwrap();
    file.write_all(b"X").unwrap();
    drop(file);

    let (_, valid) = read_record_file(&path);
    assert!(!valid);
}
