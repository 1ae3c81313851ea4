//! On-disk bucket format
//!
//! ```text
//! +------------------+
//! | Magic "SIDX"     | (4 bytes)
//! +------------------+
//! | Format Version   | (u16 LE)
//! +------------------+
//! | Record Count     | (u32 LE)
//! +------------------+
//! | Entry * count    |
//! +------------------+
//! ```
//!
//! Each entry:
//!
//! ```text
//! +------------------+
//! | Entry Length     | (u32 LE, includes itself and the checksum)
//! +------------------+
//! | Source Path      | (length-prefixed raw bytes)
//! | Site             | (length-prefixed string)
//! | Monitor ID       | (length-prefixed string)
//! | Station ID       | (length-prefixed string)
//! | Start            | (i64 LE, epoch millis)
//! | End              | (i64 LE, epoch millis)
//! | Metadata Count   | (u32 LE)
//! | Key, Value * n   | (length-prefixed strings)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! The checksum covers the length field and the body.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};

use super::checksum::{compute_checksum, verify_checksum};
use crate::record::Record;

pub const MAGIC: &[u8; 4] = b"SIDX";
pub const FORMAT_VERSION: u16 = 1;
const HEADER_SIZE: usize = 4 + 2 + 4;
// length + 4 empty strings + start + end + metadata count + checksum
const MIN_ENTRY_SIZE: usize = 4 + 4 * 4 + 8 + 8 + 4 + 4;

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

fn put_bytes(buf: &mut Vec<u8>, value: &[u8]) {
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(value);
}

fn put_string(buf: &mut Vec<u8>, value: &str) {
    put_bytes(buf, value.as_bytes());
}

/// File names are not necessarily UTF-8; unix paths keep their raw bytes.
#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> io::Result<PathBuf> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> io::Result<PathBuf> {
    String::from_utf8(bytes)
        .map(PathBuf::from)
        .map_err(|e| invalid(format!("Invalid UTF-8 path: {}", e)))
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(i64::from_le_bytes(bytes))
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut buf = Vec::new();
    reader.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "field runs past end of entry",
        ));
    }
    Ok(buf)
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    String::from_utf8(read_bytes(reader)?).map_err(|e| invalid(format!("Invalid UTF-8: {}", e)))
}

fn millis_to_utc(millis: i64) -> io::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| invalid(format!("Timestamp out of range: {}", millis)))
}

fn encode_body(record: &Record) -> Vec<u8> {
    let mut buf = Vec::new();
    put_bytes(&mut buf, &path_to_bytes(record.source()));
    put_string(&mut buf, record.site());
    put_string(&mut buf, record.monitor_id());
    put_string(&mut buf, record.station_id());
    buf.extend_from_slice(&record.start().timestamp_millis().to_le_bytes());
    buf.extend_from_slice(&record.end().timestamp_millis().to_le_bytes());
    buf.extend_from_slice(&(record.metadata().len() as u32).to_le_bytes());
    for (key, value) in record.metadata() {
        put_string(&mut buf, key);
        put_string(&mut buf, value);
    }
    buf
}

/// Serialize one record as a checksummed entry
pub fn encode_entry(record: &Record) -> Vec<u8> {
    let body = encode_body(record);
    let entry_length = (4 + body.len() + 4) as u32;

    let mut entry = Vec::with_capacity(entry_length as usize);
    entry.extend_from_slice(&entry_length.to_le_bytes());
    entry.extend_from_slice(&body);
    let checksum = compute_checksum(&entry);
    entry.extend_from_slice(&checksum.to_le_bytes());
    entry
}

/// Deserialize one entry, verifying its checksum.
///
/// Returns the record and the number of bytes consumed.
pub fn decode_entry(data: &[u8]) -> io::Result<(Record, usize)> {
    if data.len() < MIN_ENTRY_SIZE {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Entry too short"));
    }

    let entry_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if entry_length < MIN_ENTRY_SIZE {
        return Err(invalid(format!("Invalid entry length: {}", entry_length)));
    }
    if data.len() < entry_length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "Entry truncated: expected {} bytes, got {}",
                entry_length,
                data.len()
            ),
        ));
    }

    let checksum_offset = entry_length - 4;
    let stored = u32::from_le_bytes([
        data[checksum_offset],
        data[checksum_offset + 1],
        data[checksum_offset + 2],
        data[checksum_offset + 3],
    ]);
    if !verify_checksum(&data[..checksum_offset], stored) {
        return Err(invalid(format!(
            "Checksum mismatch: computed {:08x}, stored {:08x}",
            compute_checksum(&data[..checksum_offset]),
            stored
        )));
    }

    let mut cursor = Cursor::new(&data[4..checksum_offset]);
    let source = path_from_bytes(read_bytes(&mut cursor)?)?;
    let site = read_string(&mut cursor)?;
    let monitor = read_string(&mut cursor)?;
    let station = read_string(&mut cursor)?;
    let start = millis_to_utc(read_i64(&mut cursor)?)?;
    let end = millis_to_utc(read_i64(&mut cursor)?)?;

    let pairs = read_u32(&mut cursor)?;
    let mut metadata = BTreeMap::new();
    for _ in 0..pairs {
        let key = read_string(&mut cursor)?;
        let value = read_string(&mut cursor)?;
        metadata.insert(key, value);
    }

    let record = Record::with_metadata(
        source,
        site,
        monitor,
        station,
        start,
        end,
        metadata,
    )
    .map_err(|e| invalid(e.to_string()))?;

    Ok((record, entry_length))
}

/// Serialize a whole bucket: header followed by one entry per record
pub fn encode_bucket<'a>(records: impl ExactSizeIterator<Item = &'a Record>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        buf.extend_from_slice(&encode_entry(record));
    }
    buf
}

/// Deserialize a whole bucket.
///
/// Any structural problem (bad magic, unknown version, count mismatch,
/// trailing bytes, a bad entry) fails the whole bucket.
pub fn decode_bucket(data: &[u8]) -> io::Result<Vec<Record>> {
    if data.len() < HEADER_SIZE {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Bucket header truncated"));
    }
    if &data[0..4] != MAGIC {
        return Err(invalid("Bad bucket magic"));
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != FORMAT_VERSION {
        return Err(invalid(format!("Unsupported bucket version: {}", version)));
    }
    let count = u32::from_le_bytes([data[6], data[7], data[8], data[9]]) as usize;

    let mut records = Vec::with_capacity(count.min(4096));
    let mut offset = HEADER_SIZE;
    for _ in 0..count {
        let (record, consumed) = decode_entry(&data[offset..])?;
        records.push(record);
        offset += consumed;
    }
    if offset != data.len() {
        return Err(invalid(format!(
            "Trailing bytes after {} entries: {}",
            count,
            data.len() - offset
        )));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(path: &str) -> Record {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap();
        let mut metadata = BTreeMap::new();
        metadata.insert("Latitude".to_string(), "37.42".to_string());
        Record::with_metadata(path, "SiteA", "M1", "StationX", start, end, metadata).unwrap()
    }

    #[test]
    fn test_entry_preserves_every_field() {
        let record = sample("/data/a.txt");
        let encoded = encode_entry(&record);
        let (decoded, consumed) = decode_entry(&encoded).unwrap();

        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.source(), record.source());
        assert_eq!(decoded.site(), "SiteA");
        assert_eq!(decoded.start(), record.start());
        assert_eq!(decoded.end(), record.end());
        assert_eq!(decoded.metadata(), record.metadata());
    }

    #[test]
    fn test_empty_bucket_is_header_only() {
        let encoded = encode_bucket(std::iter::empty::<&Record>());
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert!(decode_bucket(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let records = vec![sample("/data/a.txt")];
        let mut encoded = encode_bucket(records.iter());
        let mid = HEADER_SIZE + (encoded.len() - HEADER_SIZE) / 2;
        encoded[mid] ^= 0xFF;

        let err = decode_bucket(&encoded).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_count_mismatch_is_corrupt() {
        let records = vec![sample("/data/a.txt"), sample("/data/b.txt")];
        let mut encoded = encode_bucket(records.iter());
        encoded[6..10].copy_from_slice(&3u32.to_le_bytes());
        assert!(decode_bucket(&encoded).is_err());

        encoded[6..10].copy_from_slice(&1u32.to_le_bytes());
        assert!(decode_bucket(&encoded).is_err(), "trailing entry must be rejected");
    }

    #[test]
    fn test_rejects_foreign_bytes() {
        assert!(decode_bucket(b"\xac\xed\x00\x05sr java.io").is_err());
        assert!(decode_bucket(b"").is_err());

        let mut wrong_version = encode_bucket(std::iter::empty::<&Record>());
        wrong_version[4] = 9;
        assert!(decode_bucket(&wrong_version).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_survives() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/data").join(OsStr::from_bytes(b"site_\xff_data.txt"));
        let record = sample("/data/placeholder.txt");
        let record = Record::with_metadata(
            &path,
            record.site(),
            record.monitor_id(),
            record.station_id(),
            record.start(),
            record.end(),
            record.metadata().clone(),
        )
        .unwrap();

        let (decoded, _) = decode_entry(&encode_entry(&record)).unwrap();
        assert_eq!(decoded.source(), path.as_path());
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_deterministic_encoding() {
        let record = sample("/data/a.txt");
        assert_eq!(encode_entry(&record), encode_entry(&record));
    }
}
