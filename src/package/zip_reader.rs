//! Minimal ZIP reader for package parts
//!
//! Reads the central directory once, then hands out entry streams that
//! decompress on the fly. Every stream opens its own file handle, so a
//! stream owns everything it needs and closing it (dropping) releases the file.

use crate::error::{ExcelError, Result};
use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// ZIP local file header signature
const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;

/// ZIP central directory signature
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x02014b50;

/// ZIP end of central directory signature
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06054b50;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// Entry in the ZIP central directory
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: u16,
    pub offset: u64,
}

/// Central directory of a ZIP file on disk
#[derive(Debug, Clone)]
pub struct ZipIndex {
    path: PathBuf,
    entries: Vec<ZipEntry>,
}

impl ZipIndex {
    /// Open a ZIP file and read its central directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = BufReader::new(File::open(&path)?);
        let entries = read_central_directory(&mut file)?;

        Ok(ZipIndex { path, entries })
    }

    /// Get list of all entries in the ZIP
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Find an entry by name
    pub fn find_entry(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Stream an entry by name
    pub fn open_entry_by_name(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let entry = self
            .find_entry(name)
            .ok_or_else(|| ExcelError::ReadError(format!("Entry not found: {}", name)))?;

        self.open_entry(entry)
    }

    /// Stream an entry, decompressing as it is read
    pub fn open_entry(&self, entry: &ZipEntry) -> Result<Box<dyn Read + Send>> {
        let mut file = BufReader::new(File::open(&self.path)?);

        // Seek to local file header
        file.seek(SeekFrom::Start(entry.offset))?;

        let signature = read_u32_le(&mut file)?;
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(ExcelError::ReadError(format!(
                "Invalid local file header signature for {}",
                entry.name
            )));
        }

        // Skip version, flags, compression method, time, date, CRC-32, sizes
        file.seek(SeekFrom::Current(22))?;

        let filename_len = read_u16_le(&mut file)? as i64;
        let extra_len = read_u16_le(&mut file)? as i64;
        file.seek(SeekFrom::Current(filename_len + extra_len))?;

        let limited_reader = file.take(entry.compressed_size);

        match entry.compression_method {
            METHOD_DEFLATED => Ok(Box::new(DeflateDecoder::new(limited_reader))),
            METHOD_STORED => Ok(Box::new(limited_reader)),
            method => Err(ExcelError::ReadError(format!(
                "Unsupported compression method {} for {}",
                method, entry.name
            ))),
        }
    }
}

/// Read the central directory from the ZIP file
fn read_central_directory<R: Read + Seek>(file: &mut R) -> Result<Vec<ZipEntry>> {
    let eocd_offset = find_eocd(file)?;
    file.seek(SeekFrom::Start(eocd_offset))?;

    let signature = read_u32_le(file)?;
    if signature != END_OF_CENTRAL_DIRECTORY_SIGNATURE {
        return Err(ExcelError::ReadError(format!(
            "Invalid end of central directory signature: 0x{:08x}",
            signature
        )));
    }

    // Skip disk number fields and entries on this disk
    file.seek(SeekFrom::Current(6))?;

    let total_entries = read_u16_le(file)? as usize;
    let _cd_size = read_u32_le(file)?;
    let cd_offset = read_u32_le(file)?;

    if cd_offset == u32::MAX || total_entries == u16::MAX as usize {
        return Err(ExcelError::ReadError(
            "ZIP64 packages are not supported".to_string(),
        ));
    }

    file.seek(SeekFrom::Start(cd_offset as u64))?;

    let mut entries = Vec::with_capacity(total_entries);
    for _ in 0..total_entries {
        let signature = read_u32_le(file)?;
        if signature != CENTRAL_DIRECTORY_SIGNATURE {
            break;
        }

        // Skip version made by, version needed, flags
        file.seek(SeekFrom::Current(6))?;

        let compression_method = read_u16_le(file)?;

        // Skip modification time, date, CRC-32
        file.seek(SeekFrom::Current(8))?;

        let compressed_size = read_u32_le(file)? as u64;
        let uncompressed_size = read_u32_le(file)? as u64;
        let filename_len = read_u16_le(file)? as usize;
        let extra_len = read_u16_le(file)? as usize;
        let comment_len = read_u16_le(file)? as usize;

        // Skip disk number, internal attributes, external attributes
        file.seek(SeekFrom::Current(8))?;

        let offset = read_u32_le(file)? as u64;

        let mut filename_buf = vec![0u8; filename_len];
        file.read_exact(&mut filename_buf)?;
        let name = String::from_utf8_lossy(&filename_buf).to_string();

        file.seek(SeekFrom::Current((extra_len + comment_len) as i64))?;

        entries.push(ZipEntry {
            name,
            compressed_size,
            uncompressed_size,
            compression_method,
            offset,
        });
    }

    Ok(entries)
}

/// Find the end of central directory record by scanning from the end of the file
fn find_eocd<R: Read + Seek>(file: &mut R) -> Result<u64> {
    let file_size = file.seek(SeekFrom::End(0))?;

    // EOCD is at least 22 bytes, search last 65KB (max comment size + EOCD)
    let search_start = file_size.saturating_sub(65557);
    file.seek(SeekFrom::Start(search_start))?;

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    buffer
        .windows(4)
        .rposition(|w| w == END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes().as_slice())
        .map(|i| search_start + i as u64)
        .ok_or_else(|| {
            ExcelError::ReadError(
                "End of central directory not found, not a ZIP package".to_string(),
            )
        })
}

fn read_u16_le<R: Read>(file: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    file.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32_le<R: Read>(file: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
