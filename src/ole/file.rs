use super::consts::*;
use crate::common::binary::read_u32_le;
use std::io;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw directory entry structure (128 bytes), as laid out on disk.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// A stream or storage inside a compound file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name
    pub name: String,
    /// Entry type (stream, storage, root)
    pub entry_type: u8,
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
    /// First sector of the stream
    pub start_sector: u32,
    /// Size of the stream in bytes
    pub size: u64,
    /// Whether this stream lives in the mini stream
    pub is_minifat: bool,
}

impl DirectoryEntry {
    #[inline]
    pub fn is_stream(&self) -> bool {
        self.entry_type == STGTY_STREAM
    }

    #[inline]
    pub fn is_storage(&self) -> bool {
        self.entry_type == STGTY_STORAGE || self.entry_type == STGTY_ROOT
    }
}

/// Error types for compound file parsing
#[derive(Debug)]
pub enum OleError {
    Io(io::Error),
    InvalidFormat(String),
    InvalidData(String),
    NotOleFile,
    CorruptedFile(String),
    StreamNotFound(String),
}

impl From<io::Error> for OleError {
    fn from(err: io::Error) -> Self {
        OleError::Io(err)
    }
}

impl From<crate::common::binary::BinaryError> for OleError {
    fn from(err: crate::common::binary::BinaryError) -> Self {
        OleError::InvalidData(err.to_string())
    }
}

impl std::fmt::Display for OleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OleError::Io(e) => write!(f, "IO error: {}", e),
            OleError::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            OleError::InvalidData(s) => write!(f, "Invalid data: {}", s),
            OleError::NotOleFile => write!(f, "Not an OLE file"),
            OleError::CorruptedFile(s) => write!(f, "Corrupted file: {}", s),
            OleError::StreamNotFound(s) => write!(f, "Stream not found: {}", s),
        }
    }
}

impl std::error::Error for OleError {}

/// In-memory compound file (OLE2 / CFB) reader.
///
/// The whole container is held in one buffer; the FAT, mini FAT, directory
/// and mini stream are resolved once at open time, after which every stream
/// read is a pure function of `&self`.
#[derive(Debug)]
pub struct CompoundFile {
    data: Vec<u8>,
    sector_size: usize,
    mini_sector_size: usize,
    mini_stream_cutoff: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    dir_entries: Vec<Option<DirectoryEntry>>,
    ministream: Vec<u8>,
}

impl CompoundFile {
    /// Parse a compound file held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, OleError> {
        if !is_ole_file(&data) {
            return Err(OleError::NotOleFile);
        }
        let header = &data[..HEADER_SIZE];

        let dll_version = u16::from_le_bytes([header[0x1A], header[0x1B]]);
        let byte_order = u16::from_le_bytes([header[0x1C], header[0x1D]]);
        let sector_shift = u16::from_le_bytes([header[0x1E], header[0x1F]]);
        let mini_sector_shift = u16::from_le_bytes([header[0x20], header[0x21]]);
        let first_dir_sector = read_u32_le(header, 0x30)?;
        let mini_stream_cutoff = read_u32_le(header, 0x38)?;
        let first_minifat_sector = read_u32_le(header, 0x3C)?;
        let num_minifat_sectors = read_u32_le(header, 0x40)?;
        let first_difat_sector = read_u32_le(header, 0x44)?;
        let num_difat_sectors = read_u32_le(header, 0x48)?;

        if byte_order != 0xFFFE {
            return Err(OleError::InvalidFormat("Invalid byte order".to_string()));
        }
        if !(7..=16).contains(&sector_shift) || mini_sector_shift > sector_shift {
            return Err(OleError::InvalidFormat("Invalid sector shift".to_string()));
        }

        let sector_size = 1usize << sector_shift;
        if (dll_version == 3 && sector_size != 512) || (dll_version == 4 && sector_size != 4096) {
            return Err(OleError::InvalidFormat("Sector size mismatch".to_string()));
        }

        let mut cfb = CompoundFile {
            data,
            sector_size,
            mini_sector_size: 1usize << mini_sector_shift,
            mini_stream_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            dir_entries: Vec::new(),
            ministream: Vec::new(),
        };

        cfb.load_fat(first_difat_sector, num_difat_sectors)?;
        cfb.load_directory(first_dir_sector)?;
        if num_minifat_sectors > 0 && first_minifat_sector != ENDOFCHAIN {
            cfb.load_minifat(first_minifat_sector)?;
        }
        if let Some(root) = cfb.root()
            && root.start_sector != ENDOFCHAIN
        {
            let start = root.start_sector;
            let size = root.size as usize;
            let mut ministream = cfb.read_chain(start)?;
            ministream.truncate(size);
            cfb.ministream = ministream;
        }

        Ok(cfb)
    }

    /// Collect the FAT sector list from the header and DIFAT chain, then
    /// concatenate those sectors into the FAT.
    fn load_fat(&mut self, first_difat_sector: u32, num_difat_sectors: u32) -> Result<(), OleError> {
        let mut fat_sectors = Vec::new();
        for i in 0..109 {
            let sector = read_u32_le(&self.data, 0x4C + i * 4)?;
            if sector == FREESECT || sector == ENDOFCHAIN {
                break;
            }
            fat_sectors.push(sector);
        }

        let entries_per_difat = self.sector_size / 4 - 1;
        let mut difat_sector = first_difat_sector;
        for _ in 0..num_difat_sectors {
            if difat_sector > MAXREGSECT {
                break;
            }
            let sector = self.sector(difat_sector)?;
            for i in 0..entries_per_difat {
                let id = read_u32_le(sector, i * 4)?;
                if id == FREESECT || id == ENDOFCHAIN {
                    break;
                }
                fat_sectors.push(id);
            }
            difat_sector = read_u32_le(sector, entries_per_difat * 4)?;
        }

        let entries_per_sector = self.sector_size / 4;
        let mut fat = Vec::with_capacity(fat_sectors.len() * entries_per_sector);
        for sector_id in fat_sectors {
            let sector = self.sector(sector_id)?;
            fat.extend(
                sector
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
            );
        }
        self.fat = fat;
        Ok(())
    }

    fn load_minifat(&mut self, first_minifat_sector: u32) -> Result<(), OleError> {
        let raw = self.read_chain(first_minifat_sector)?;
        self.minifat = raw
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(())
    }

    fn load_directory(&mut self, first_dir_sector: u32) -> Result<(), OleError> {
        let dir_data = self.read_chain(first_dir_sector)?;
        let count = dir_data.len() / DIRENTRY_SIZE;
        if count == 0 {
            return Err(OleError::CorruptedFile("Empty directory".to_string()));
        }
        let mut entries = Vec::with_capacity(count);
        for sid in 0..count {
            let raw = &dir_data[sid * DIRENTRY_SIZE..(sid + 1) * DIRENTRY_SIZE];
            entries.push(self.parse_directory_entry(raw, sid as u32)?);
        }
        if entries[0].as_ref().is_none_or(|root| root.entry_type != STGTY_ROOT) {
            return Err(OleError::CorruptedFile("Missing root entry".to_string()));
        }
        self.dir_entries = entries;
        Ok(())
    }

    fn parse_directory_entry(&self, data: &[u8], sid: u32) -> Result<Option<DirectoryEntry>, OleError> {
        let raw = RawDirectoryEntry::read_from_bytes(data)
            .map_err(|_| OleError::InvalidFormat("Failed to parse directory entry".to_string()))?;
        if raw.entry_type == STGTY_EMPTY {
            return Ok(None);
        }

        let name_len = (raw.name_len.get() as usize).min(64);
        let name = decode_utf16le(&raw.name[..name_len.saturating_sub(2)]);

        // Version 3 files only use the low 32 bits of the size
        let size = if self.sector_size == 512 {
            raw.stream_size.get() & 0xFFFF_FFFF
        } else {
            raw.stream_size.get()
        };

        Ok(Some(DirectoryEntry {
            sid,
            name,
            entry_type: raw.entry_type,
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            start_sector: raw.start_sector.get(),
            size,
            is_minifat: raw.entry_type == STGTY_STREAM && size < self.mini_stream_cutoff as u64,
        }))
    }

    /// Borrow one regular sector. Sector `n` starts at `(n + 1) * sector_size`.
    fn sector(&self, sector_id: u32) -> Result<&[u8], OleError> {
        let start = (sector_id as usize + 1)
            .checked_mul(self.sector_size)
            .ok_or_else(|| OleError::CorruptedFile("Sector offset overflow".to_string()))?;
        if start >= self.data.len() {
            return Err(OleError::CorruptedFile(format!(
                "Sector {} past end of file",
                sector_id
            )));
        }
        // A short final sector is tolerated
        let end = (start + self.sector_size).min(self.data.len());
        Ok(&self.data[start..end])
    }

    /// Follow a FAT chain. The walk is bounded by the FAT length so a cyclic
    /// chain cannot loop forever.
    fn read_chain(&self, start_sector: u32) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut steps = 0usize;
        while sector != ENDOFCHAIN {
            if sector as usize >= self.fat.len() || steps > self.fat.len() {
                return Err(OleError::CorruptedFile(
                    "Invalid sector index in FAT".to_string(),
                ));
            }
            data.extend_from_slice(self.sector(sector)?);
            sector = self.fat[sector as usize];
            steps += 1;
        }
        Ok(data)
    }

    fn read_mini_chain(&self, start_sector: u32, size: u64) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::with_capacity(size as usize);
        let mut sector = start_sector;
        let mut steps = 0usize;
        while sector != ENDOFCHAIN {
            if sector as usize >= self.minifat.len() || steps > self.minifat.len() {
                return Err(OleError::CorruptedFile(
                    "Invalid sector index in MiniFAT".to_string(),
                ));
            }
            let position = sector as usize * self.mini_sector_size;
            if position + self.mini_sector_size > self.ministream.len() {
                return Err(OleError::CorruptedFile(
                    "Mini sector out of bounds".to_string(),
                ));
            }
            data.extend_from_slice(&self.ministream[position..position + self.mini_sector_size]);
            sector = self.minifat[sector as usize];
            steps += 1;
        }
        data.truncate(size as usize);
        Ok(data)
    }

    fn root(&self) -> Option<&DirectoryEntry> {
        self.dir_entries.first().and_then(Option::as_ref)
    }

    fn entry(&self, sid: u32) -> Option<&DirectoryEntry> {
        if sid == NOSTREAM {
            return None;
        }
        self.dir_entries.get(sid as usize).and_then(Option::as_ref)
    }

    /// Children of a storage in tree order (left, self, right).
    fn children(&self, storage: &DirectoryEntry) -> Vec<&DirectoryEntry> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        let mut visited = fixedbitset::FixedBitSet::with_capacity(self.dir_entries.len());
        let mut current = self.entry(storage.sid_child);
        loop {
            while let Some(node) = current {
                if visited.put(node.sid as usize) {
                    break;
                }
                stack.push(node);
                current = self.entry(node.sid_left);
            }
            let Some(node) = stack.pop() else {
                break;
            };
            out.push(node);
            current = self.entry(node.sid_right);
        }
        out
    }

    fn find_entry(&self, path: &[&str]) -> Result<&DirectoryEntry, OleError> {
        let not_found = || OleError::StreamNotFound(path.join("/"));
        let mut current = self.root().ok_or_else(not_found)?;
        for &name in path {
            current = self
                .children(current)
                .into_iter()
                .find(|child| child.name.eq_ignore_ascii_case(name))
                .ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// Read a stream by path, e.g. `&["BodyText", "Section0"]`.
    pub fn open_stream(&self, path: &[&str]) -> Result<Vec<u8>, OleError> {
        let entry = self.find_entry(path)?;
        if !entry.is_stream() {
            return Err(OleError::InvalidFormat(format!(
                "{} is not a stream",
                path.join("/")
            )));
        }
        if entry.is_minifat {
            self.read_mini_chain(entry.start_sector, entry.size)
        } else {
            let mut data = self.read_chain(entry.start_sector)?;
            data.truncate(entry.size as usize);
            Ok(data)
        }
    }

    /// Check whether a stream or storage exists.
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok()
    }

    /// List the entries directly under a storage (empty path for the root).
    pub fn list_directory_entries(&self, path: &[&str]) -> Result<Vec<DirectoryEntry>, OleError> {
        let storage = self.find_entry(path)?;
        if !storage.is_storage() {
            return Err(OleError::InvalidFormat("Not a directory".to_string()));
        }
        Ok(self.children(storage).into_iter().cloned().collect())
    }

    /// List every stream as its path of storage names.
    pub fn list_streams(&self) -> Vec<Vec<String>> {
        let mut streams = Vec::new();
        if let Some(root) = self.root() {
            self.collect_streams(root, &mut Vec::new(), &mut streams);
        }
        streams
    }

    fn collect_streams(
        &self,
        storage: &DirectoryEntry,
        prefix: &mut Vec<String>,
        streams: &mut Vec<Vec<String>>,
    ) {
        // Storage nesting deeper than this is treated as corrupt
        if prefix.len() > 32 {
            return;
        }
        for child in self.children(storage) {
            prefix.push(child.name.clone());
            if child.is_stream() {
                streams.push(prefix.clone());
            } else if child.is_storage() {
                self.collect_streams(child, prefix, streams);
            }
            prefix.pop();
        }
    }
}

/// Decode UTF-16LE bytes to String
fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

/// Check if data is a compound file by its magic bytes and minimum size.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && &data[0..8] == MAGIC
}
