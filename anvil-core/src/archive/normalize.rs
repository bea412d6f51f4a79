//! Archive normalization
//!
//! Detects the format of an uploaded byte blob from its content and converts
//! it into the canonical tar build-context form. The format is sniffed from
//! magic bytes only; filename extensions are never consulted.

use std::io::{Cursor, Read};

use crate::error::ArchiveError;

/// Formats recognizable from magic bytes
///
/// Only zip is convertible; the rest are recognized so rejections can carry
/// the detected media type instead of a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaType {
    Zip,
    SevenZip,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
    Rar,
    Tar,
}

impl MediaType {
    fn as_str(&self) -> &'static str {
        match self {
            MediaType::Zip => "application/zip",
            MediaType::SevenZip => "application/x-7z-compressed",
            MediaType::Gzip => "application/gzip",
            MediaType::Bzip2 => "application/x-bzip2",
            MediaType::Xz => "application/x-xz",
            MediaType::Zstd => "application/zstd",
            MediaType::Rar => "application/vnd.rar",
            MediaType::Tar => "application/x-tar",
        }
    }
}

/// Sniffs the container format from leading magic bytes
fn sniff(bytes: &[u8]) -> Option<MediaType> {
    if bytes.starts_with(b"PK\x03\x04")
        || bytes.starts_with(b"PK\x05\x06")
        || bytes.starts_with(b"PK\x07\x08")
    {
        return Some(MediaType::Zip);
    }
    if bytes.starts_with(b"7z\xbc\xaf\x27\x1c") {
        return Some(MediaType::SevenZip);
    }
    if bytes.starts_with(b"\x1f\x8b") {
        return Some(MediaType::Gzip);
    }
    if bytes.starts_with(b"BZh") {
        return Some(MediaType::Bzip2);
    }
    if bytes.starts_with(b"\xfd7zXZ\x00") {
        return Some(MediaType::Xz);
    }
    if bytes.starts_with(b"\x28\xb5\x2f\xfd") {
        return Some(MediaType::Zstd);
    }
    if bytes.starts_with(b"Rar!\x1a\x07") {
        return Some(MediaType::Rar);
    }
    // The ustar marker sits at offset 257 in the first header block
    if bytes.len() >= 262 && &bytes[257..262] == b"ustar" {
        return Some(MediaType::Tar);
    }
    None
}

/// Converts an uploaded archive into the canonical tar build-context form.
///
/// Only zip uploads are convertible. Every other recognized format is
/// rejected with its detected media type; an unclassifiable input fails
/// fast. The whole archive is buffered in memory, so input size translates
/// linearly into memory use.
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    match sniff(bytes) {
        Some(MediaType::Zip) => zip_to_tar(bytes),
        Some(other) => Err(ArchiveError::UnsupportedFormat {
            media_type: other.as_str().to_string(),
        }),
        None => Err(ArchiveError::Unrecognized),
    }
}

/// Unix file-type bits used to spot symlink entries in zip modes
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Copies every zip entry verbatim (path, mode, content) into a tar archive,
/// preserving entry order.
///
/// Any entry that is not a regular file or directory aborts the conversion;
/// no partial build context is ever returned.
fn zip_to_tar(bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut builder = tar::Builder::new(Vec::new());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        let mode = entry
            .unix_mode()
            .unwrap_or(if entry.is_dir() { 0o755 } else { 0o644 });

        if mode & S_IFMT == S_IFLNK {
            return Err(ArchiveError::UnsupportedEntry { name });
        }

        let mut header = tar::Header::new_gnu();
        header.set_mode(mode & 0o7777);
        header.set_mtime(0);

        if entry.is_dir() {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            builder
                .append_data(&mut header, &name, std::io::empty())
                .map_err(ArchiveError::Read)?;
        } else if entry.is_file() {
            // The declared uncompressed size comes from the upload and can
            // claim anything; cap the reservation at the input length
            let reserve = usize::try_from(entry.size())
                .unwrap_or(usize::MAX)
                .min(bytes.len());
            let mut content = Vec::with_capacity(reserve);
            entry.read_to_end(&mut content)?;
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(content.len() as u64);
            builder
                .append_data(&mut header, &name, content.as_slice())
                .map_err(ArchiveError::Read)?;
        } else {
            return Err(ArchiveError::UnsupportedEntry { name });
        }
    }

    builder.into_inner().map_err(ArchiveError::Read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn make_zip(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            match content {
                Some(data) => {
                    writer
                        .start_file(*name, SimpleFileOptions::default())
                        .unwrap();
                    writer.write_all(data).unwrap();
                }
                None => {
                    writer
                        .add_directory(*name, SimpleFileOptions::default())
                        .unwrap();
                }
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn scan_tar(data: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = tar::Archive::new(data);
        let mut entries = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            entries.push((path, content));
        }
        entries
    }

    #[test]
    fn test_zip_round_trips_to_tar() {
        let zip = make_zip(&[
            ("index.js", Some(b"console.log('hi');".as_slice())),
            ("package.json", Some(b"{\"name\":\"hello\"}".as_slice())),
            ("lib/", None),
            ("lib/util.js", Some(b"module.exports = {};".as_slice())),
        ]);

        let tar = normalize(&zip).unwrap();
        let entries = scan_tar(&tar);

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].0, "index.js");
        assert_eq!(entries[0].1, b"console.log('hi');");
        assert_eq!(entries[1].0, "package.json");
        assert_eq!(entries[2].0, "lib/");
        assert_eq!(entries[3].0, "lib/util.js");
        assert_eq!(entries[3].1, b"module.exports = {};");
    }

    #[test]
    fn test_seven_zip_is_rejected_with_media_type() {
        let seven_zip = b"7z\xbc\xaf\x27\x1c followed by junk".to_vec();
        match normalize(&seven_zip) {
            Err(ArchiveError::UnsupportedFormat { media_type }) => {
                assert_eq!(media_type, "application/x-7z-compressed");
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_gzip_is_rejected_with_media_type() {
        let gzip = b"\x1f\x8b\x08\x00junk".to_vec();
        match normalize(&gzip) {
            Err(ArchiveError::UnsupportedFormat { media_type }) => {
                assert_eq!(media_type, "application/gzip");
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unclassifiable_input_fails_fast() {
        assert!(matches!(
            normalize(b"definitely not an archive"),
            Err(ArchiveError::Unrecognized)
        ));
        assert!(matches!(normalize(b""), Err(ArchiveError::Unrecognized)));
    }

    #[test]
    fn test_tar_sniff_at_minimum_length() {
        // Exactly enough bytes to carry the ustar marker at offset 257
        let mut bytes = vec![0u8; 262];
        bytes[257..262].copy_from_slice(b"ustar");
        match normalize(&bytes) {
            Err(ArchiveError::UnsupportedFormat { media_type }) => {
                assert_eq!(media_type, "application/x-tar");
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    /// Hand-built zip with one stored, empty entry whose headers declare a
    /// multi-gigabyte uncompressed size
    fn zip_with_lying_size(declared_size: u32) -> Vec<u8> {
        let name = b"a.txt";
        let mut bytes = Vec::new();

        // Local file header
        bytes.extend_from_slice(b"PK\x03\x04");
        bytes.extend_from_slice(&20u16.to_le_bytes()); // version needed
        bytes.extend_from_slice(&0u16.to_le_bytes()); // flags
        bytes.extend_from_slice(&0u16.to_le_bytes()); // stored
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod time
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod date
        bytes.extend_from_slice(&0u32.to_le_bytes()); // crc32 of empty
        bytes.extend_from_slice(&0u32.to_le_bytes()); // compressed size
        bytes.extend_from_slice(&declared_size.to_le_bytes()); // the lie
        bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // extra len
        bytes.extend_from_slice(name);
        let central_offset = bytes.len() as u32;

        // Central directory header
        bytes.extend_from_slice(b"PK\x01\x02");
        bytes.extend_from_slice(&20u16.to_le_bytes()); // version made by
        bytes.extend_from_slice(&20u16.to_le_bytes()); // version needed
        bytes.extend_from_slice(&0u16.to_le_bytes()); // flags
        bytes.extend_from_slice(&0u16.to_le_bytes()); // stored
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod time
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod date
        bytes.extend_from_slice(&0u32.to_le_bytes()); // crc32
        bytes.extend_from_slice(&0u32.to_le_bytes()); // compressed size
        bytes.extend_from_slice(&declared_size.to_le_bytes()); // the lie
        bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // extra len
        bytes.extend_from_slice(&0u16.to_le_bytes()); // comment len
        bytes.extend_from_slice(&0u16.to_le_bytes()); // disk start
        bytes.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        bytes.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        bytes.extend_from_slice(&0u32.to_le_bytes()); // local header offset
        bytes.extend_from_slice(name);
        let central_size = bytes.len() as u32 - central_offset;

        // End of central directory
        bytes.extend_from_slice(b"PK\x05\x06");
        bytes.extend_from_slice(&0u16.to_le_bytes()); // disk
        bytes.extend_from_slice(&0u16.to_le_bytes()); // central dir disk
        bytes.extend_from_slice(&1u16.to_le_bytes()); // entries on disk
        bytes.extend_from_slice(&1u16.to_le_bytes()); // entries total
        bytes.extend_from_slice(&central_size.to_le_bytes());
        bytes.extend_from_slice(&central_offset.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // comment len

        bytes
    }

    #[test]
    fn test_declared_entry_size_is_not_trusted() {
        // The header claims ~2 GiB; the actual content is empty. Conversion
        // must reserve based on what the upload can actually hold, not on
        // what its headers claim.
        let zip = zip_with_lying_size(0x7ff0_0000);

        let tar = normalize(&zip).unwrap();
        let entries = scan_tar(&tar);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "a.txt");
        assert!(entries[0].1.is_empty());
    }

    #[test]
    fn test_symlink_entry_aborts_conversion() {
        // A symlink in a zip is flagged through the unix mode bits
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_symlink("link", "target", SimpleFileOptions::default())
            .unwrap();
        let zip = writer.finish().unwrap().into_inner();

        match normalize(&zip) {
            Err(ArchiveError::UnsupportedEntry { name }) => assert_eq!(name, "link"),
            other => panic!("expected UnsupportedEntry, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_modes_are_preserved() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "run.sh",
                SimpleFileOptions::default().unix_permissions(0o755),
            )
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        let zip = writer.finish().unwrap().into_inner();

        let tar = normalize(&zip).unwrap();
        let mut archive = tar::Archive::new(tar.as_slice());
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.header().mode().unwrap() & 0o777, 0o755);
    }
}
