use super::*;
use std::fs;
use std::io::{Read, Write};
use tempfile::tempdir;

#[test]
fn open_reader_reads_plain_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("plain.csv");
    fs::write(&path, "a,b\n1,2\n").expect("write file");
    let mut out = String::new();
    open_reader(&path)
        .expect("open")
        .read_to_string(&mut out)
        .expect("read");
    assert_eq!(out, "a,b\n1,2\n");
}

#[cfg(feature = "gz")]
#[test]
fn open_reader_decompresses_gzip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("calls.csv.gz");
    let file = fs::File::create(&path).expect("create");
    let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    enc.write_all(b"Accepted\nTrue\n").expect("write gz");
    enc.finish().expect("finish gz");

    let mut rdr = csv_reader(&path).expect("csv reader");
    let headers = rdr.headers().expect("headers").clone();
    assert_eq!(headers.get(0), Some("Accepted"));
    assert_eq!(rdr.records().count(), 1);
}

#[test]
fn csv_reader_trims_cells() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("t.csv");
    fs::write(&path, " a , b \n 1 ,2\n").expect("write file");
    let mut rdr = csv_reader(&path).expect("csv reader");
    let headers = rdr.headers().expect("headers").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    let first = rdr.records().next().expect("row").expect("valid row");
    assert_eq!(first.get(0), Some("1"));
}
