//! APK metadata extraction.
//!
//! Reads `AndroidManifest.xml` out of the archive and decodes just enough of
//! Android's binary XML encoding to recover the `package` and `versionCode`
//! attributes of the root `manifest` element.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

const MANIFEST_ENTRY: &str = "AndroidManifest.xml";

/// Upper bound on a decoded manifest; real ones are a few hundred KiB at most.
pub const MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

// Chunk types (ResourceTypes.h)
const RES_STRING_POOL_TYPE: u16 = 0x0001;
const RES_XML_TYPE: u16 = 0x0003;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;

const UTF8_FLAG: u32 = 1 << 8;
const NO_INDEX: u32 = 0xFFFF_FFFF;

// Res_value data types
const TYPE_STRING: u8 = 0x03;
const TYPE_INT_DEC: u8 = 0x10;
const TYPE_INT_HEX: u8 = 0x11;

/// Why an archive's identity could not be read.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Malformed binary manifest: {0}")]
    Malformed(&'static str),

    #[error("Manifest has no '{0}' attribute")]
    MissingAttribute(&'static str),
}

/// Identity of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkMetadata {
    /// `package` attribute of the manifest.
    pub package: String,
    /// `versionCode` attribute of the manifest.
    pub version_code: i64,
}

/// Reads package identity out of an archive on disk.
pub trait MetadataExtractor: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`ExtractError`] when the archive cannot be read or carries
    /// no usable manifest.
    fn extract(&self, path: &Path) -> Result<ApkMetadata, ExtractError>;
}

/// Default extractor: zip archive + binary manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApkManifestExtractor;

impl MetadataExtractor for ApkManifestExtractor {
    fn extract(&self, path: &Path) -> Result<ApkMetadata, ExtractError> {
        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let entry = archive.by_name(MANIFEST_ENTRY)?;
        // The size in the archive header is untrusted; never allocate from it.
        if entry.size() > MAX_MANIFEST_BYTES {
            return Err(ExtractError::Malformed("manifest too large"));
        }
        let mut data = Vec::new();
        entry.take(MAX_MANIFEST_BYTES + 1).read_to_end(&mut data)?;
        if data.len() as u64 > MAX_MANIFEST_BYTES {
            return Err(ExtractError::Malformed("manifest too large"));
        }
        parse_manifest(&data)
    }
}

fn u16_at(data: &[u8], offset: usize) -> Result<u16, ExtractError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(ExtractError::Malformed("truncated data"))
}

fn u32_at(data: &[u8], offset: usize) -> Result<u32, ExtractError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ExtractError::Malformed("truncated data"))
}

/// Decode a binary `AndroidManifest.xml`.
///
/// # Errors
///
/// [`ExtractError::Malformed`] for structurally invalid input,
/// [`ExtractError::MissingAttribute`] if the manifest element lacks
/// `package` or `versionCode`.
pub fn parse_manifest(data: &[u8]) -> Result<ApkMetadata, ExtractError> {
    if u16_at(data, 0)? != RES_XML_TYPE {
        return Err(ExtractError::Malformed("not a binary XML document"));
    }
    let header_size = u16_at(data, 2)? as usize;
    let total = (u32_at(data, 4)? as usize).min(data.len());

    let mut strings: Option<Vec<String>> = None;
    let mut offset = header_size;
    while offset + 8 <= total {
        let chunk_type = u16_at(data, offset)?;
        let chunk_header = u16_at(data, offset + 2)? as usize;
        let chunk_size = u32_at(data, offset + 4)? as usize;
        if chunk_size < 8 || offset + chunk_size > total {
            return Err(ExtractError::Malformed("chunk size out of bounds"));
        }
        let chunk = &data[offset..offset + chunk_size];

        match chunk_type {
            RES_STRING_POOL_TYPE => strings = Some(parse_string_pool(chunk)?),
            RES_XML_START_ELEMENT_TYPE => {
                let pool = strings
                    .as_deref()
                    .ok_or(ExtractError::Malformed("element before string pool"))?;
                if let Some(meta) = parse_manifest_element(chunk, chunk_header, pool)? {
                    return Ok(meta);
                }
            }
            _ => {}
        }
        offset += chunk_size;
    }

    Err(ExtractError::Malformed("no manifest element"))
}

fn parse_string_pool(chunk: &[u8]) -> Result<Vec<String>, ExtractError> {
    let header_size = u16_at(chunk, 2)? as usize;
    let count = u32_at(chunk, 8)? as usize;
    let flags = u32_at(chunk, 16)?;
    let strings_start = u32_at(chunk, 20)? as usize;
    let utf8 = flags & UTF8_FLAG != 0;

    (0..count)
        .map(|i| {
            let rel = u32_at(chunk, header_size + i * 4)? as usize;
            let at = strings_start + rel;
            if utf8 {
                read_utf8(chunk, at)
            } else {
                read_utf16(chunk, at)
            }
        })
        .collect()
}

// UTF-8 pool entries: utf16 length, utf8 byte length, bytes.
// Each length is one byte, or two when the high bit is set.
fn read_utf8(chunk: &[u8], at: usize) -> Result<String, ExtractError> {
    let (_, skip) = utf8_len(chunk, at)?;
    let (len, skip2) = utf8_len(chunk, at + skip)?;
    let start = at + skip + skip2;
    let bytes = chunk
        .get(start..start + len)
        .ok_or(ExtractError::Malformed("string out of bounds"))?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn utf8_len(chunk: &[u8], at: usize) -> Result<(usize, usize), ExtractError> {
    let b0 = *chunk
        .get(at)
        .ok_or(ExtractError::Malformed("string out of bounds"))?;
    if b0 & 0x80 == 0 {
        return Ok((b0 as usize, 1));
    }
    let b1 = *chunk
        .get(at + 1)
        .ok_or(ExtractError::Malformed("string out of bounds"))?;
    Ok(((((b0 & 0x7f) as usize) << 8) | b1 as usize, 2))
}

fn read_utf16(chunk: &[u8], at: usize) -> Result<String, ExtractError> {
    let c0 = u16_at(chunk, at)?;
    let (len, skip) = if c0 & 0x8000 == 0 {
        (c0 as usize, 2)
    } else {
        let c1 = u16_at(chunk, at + 2)?;
        ((((c0 & 0x7fff) as usize) << 16) | c1 as usize, 4)
    };
    let units = (0..len)
        .map(|i| u16_at(chunk, at + skip + i * 2))
        .collect::<Result<Vec<u16>, _>>()?;
    Ok(String::from_utf16_lossy(&units))
}

fn pool_string(pool: &[String], index: u32) -> Result<&str, ExtractError> {
    pool.get(index as usize)
        .map(String::as_str)
        .ok_or(ExtractError::Malformed("string index out of range"))
}

fn parse_manifest_element(
    chunk: &[u8],
    header_size: usize,
    pool: &[String],
) -> Result<Option<ApkMetadata>, ExtractError> {
    let ext = header_size;
    let name = u32_at(chunk, ext + 4)?;
    if pool_string(pool, name)? != "manifest" {
        return Ok(None);
    }

    let attr_start = u16_at(chunk, ext + 8)? as usize;
    let attr_size = u16_at(chunk, ext + 10)? as usize;
    let attr_count = u16_at(chunk, ext + 12)? as usize;

    let mut package = None;
    let mut version_code = None;
    for i in 0..attr_count {
        let base = ext + attr_start + i * attr_size;
        let attr_name = pool_string(pool, u32_at(chunk, base + 4)?)?;
        let raw = u32_at(chunk, base + 8)?;
        let data_type = *chunk
            .get(base + 15)
            .ok_or(ExtractError::Malformed("attribute out of bounds"))?;
        let value = u32_at(chunk, base + 16)?;

        match attr_name {
            "package" => {
                let index = if raw == NO_INDEX { value } else { raw };
                package = Some(pool_string(pool, index)?.to_string());
            }
            "versionCode" => {
                version_code = match data_type {
                    TYPE_INT_DEC | TYPE_INT_HEX => Some(i64::from(value)),
                    TYPE_STRING => pool_string(pool, value)?.trim().parse().ok(),
                    _ if raw != NO_INDEX => pool_string(pool, raw)?.trim().parse().ok(),
                    _ => None,
                };
            }
            _ => {}
        }
    }

    Ok(Some(ApkMetadata {
        package: package.ok_or(ExtractError::MissingAttribute("package"))?,
        version_code: version_code.ok_or(ExtractError::MissingAttribute("versionCode"))?,
    }))
}

/// Synthetic binary manifests and archives for tests.
#[cfg(any(test, feature = "test-support"))]
#[allow(clippy::missing_panics_doc)]
pub mod fixtures {
    use super::*;
    use std::io::Write;

    fn push_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn string_pool(strings: &[&str], utf8: bool) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for s in strings {
            offsets.push(data.len() as u32);
            if utf8 {
                data.push(s.chars().count() as u8);
                data.push(s.len() as u8);
                data.extend_from_slice(s.as_bytes());
                data.push(0);
            } else {
                let units: Vec<u16> = s.encode_utf16().collect();
                push_u16(&mut data, units.len() as u16);
                for u in units {
                    push_u16(&mut data, u);
                }
                push_u16(&mut data, 0);
            }
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }

        let header = 28u32;
        let strings_start = header + 4 * strings.len() as u32;
        let mut chunk = Vec::new();
        push_u16(&mut chunk, RES_STRING_POOL_TYPE);
        push_u16(&mut chunk, header as u16);
        push_u32(&mut chunk, strings_start + data.len() as u32);
        push_u32(&mut chunk, strings.len() as u32);
        push_u32(&mut chunk, 0);
        push_u32(&mut chunk, if utf8 { UTF8_FLAG } else { 0 });
        push_u32(&mut chunk, strings_start);
        push_u32(&mut chunk, 0);
        for off in offsets {
            push_u32(&mut chunk, off);
        }
        chunk.extend(data);
        chunk
    }

    /// (name index, raw value index, data type, data)
    pub type Attr = (u32, u32, u8, u32);

    pub fn start_element(name: u32, attrs: &[Attr]) -> Vec<u8> {
        let mut chunk = Vec::new();
        push_u16(&mut chunk, RES_XML_START_ELEMENT_TYPE);
        push_u16(&mut chunk, 16);
        push_u32(&mut chunk, 16 + 20 + 20 * attrs.len() as u32);
        push_u32(&mut chunk, 1);
        push_u32(&mut chunk, NO_INDEX);
        push_u32(&mut chunk, NO_INDEX);
        push_u32(&mut chunk, name);
        push_u16(&mut chunk, 20);
        push_u16(&mut chunk, 20);
        push_u16(&mut chunk, attrs.len() as u16);
        push_u16(&mut chunk, 0);
        push_u16(&mut chunk, 0);
        push_u16(&mut chunk, 0);
        for &(attr_name, raw, data_type, data) in attrs {
            push_u32(&mut chunk, NO_INDEX);
            push_u32(&mut chunk, attr_name);
            push_u32(&mut chunk, raw);
            push_u16(&mut chunk, 8);
            chunk.push(0);
            chunk.push(data_type);
            push_u32(&mut chunk, data);
        }
        chunk
    }

    pub fn document(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: usize = chunks.iter().map(Vec::len).sum();
        let mut doc = Vec::new();
        push_u16(&mut doc, RES_XML_TYPE);
        push_u16(&mut doc, 8);
        push_u32(&mut doc, (8 + body) as u32);
        for c in chunks {
            doc.extend_from_slice(c);
        }
        doc
    }

    /// Binary manifest for `package` with an integer `versionCode`.
    pub fn manifest_bytes(package: &str, version_code: u32) -> Vec<u8> {
        let pool = string_pool(&["versionCode", "package", "manifest", package], false);
        let element = start_element(
            2,
            &[
                (0, NO_INDEX, TYPE_INT_DEC, version_code),
                (1, 3, TYPE_STRING, 3),
            ],
        );
        document(&[pool, element])
    }

    /// Zip archive containing a binary manifest, written to `path`.
    pub fn write_apk(path: &Path, package: &str, version_code: u32) {
        write_apk_with_manifest(path, &manifest_bytes(package, version_code));
    }

    /// Zip archive whose manifest entry holds `manifest` verbatim.
    pub fn write_apk_with_manifest(path: &Path, manifest: &[u8]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(MANIFEST_ENTRY, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(manifest).unwrap();
        zip.finish().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{
        document, manifest_bytes, start_element, string_pool, write_apk, write_apk_with_manifest,
    };
    use super::*;

    #[test]
    fn test_parse_utf16_manifest() {
        let meta = parse_manifest(&manifest_bytes("org.example.app", 1234)).unwrap();
        assert_eq!(meta.package, "org.example.app");
        assert_eq!(meta.version_code, 1234);
    }

    #[test]
    fn test_parse_utf8_manifest_with_string_version() {
        let pool = string_pool(&["manifest", "package", "versionCode", "com.b", "77"], true);
        let element = start_element(0, &[(1, 3, TYPE_STRING, 3), (2, 4, TYPE_STRING, 4)]);
        let meta = parse_manifest(&document(&[pool, element])).unwrap();
        assert_eq!(meta.package, "com.b");
        assert_eq!(meta.version_code, 77);
    }

    #[test]
    fn test_missing_version_code() {
        let pool = string_pool(&["manifest", "package", "com.c"], false);
        let element = start_element(0, &[(1, 2, TYPE_STRING, 2)]);
        let err = parse_manifest(&document(&[pool, element])).unwrap_err();
        assert!(matches!(err, ExtractError::MissingAttribute("versionCode")));
    }

    #[test]
    fn test_truncated_input() {
        let mut bytes = manifest_bytes("org.example.app", 1);
        bytes.truncate(bytes.len() - 10);
        // Header still claims the full size; the clamp makes the last chunk overflow.
        assert!(matches!(
            parse_manifest(&bytes),
            Err(ExtractError::Malformed(_))
        ));
        assert!(parse_manifest(b"PK\x03\x04").is_err());
    }

    #[test]
    fn test_extract_from_archive() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("app.apk");
        write_apk(&path, "org.example.app", 42);

        let meta = ApkManifestExtractor.extract(&path).unwrap();
        assert_eq!(
            meta,
            ApkMetadata {
                package: "org.example.app".into(),
                version_code: 42
            }
        );
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.apk");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            ApkManifestExtractor.extract(&path),
            Err(ExtractError::Zip(_))
        ));
    }

    #[test]
    fn test_extract_rejects_oversized_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("huge.apk");
        let oversized = vec![0u8; MAX_MANIFEST_BYTES as usize + 1];
        write_apk_with_manifest(&path, &oversized);
        assert!(matches!(
            ApkManifestExtractor.extract(&path),
            Err(ExtractError::Malformed("manifest too large"))
        ));
    }
}
