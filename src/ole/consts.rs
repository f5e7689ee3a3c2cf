/// Magic bytes at the start of every compound file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Header plus at least one FAT sector and one directory sector
pub const MINIMAL_OLEFILE_SIZE: usize = 1536;

/// Size of one directory entry
pub const DIRENTRY_SIZE: usize = 128;

/// Header size, also the sector size of version 3 files
pub const HEADER_SIZE: usize = 512;

// Special sector ids
/// Maximum regular sector id
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Sector holds DIFAT entries
pub const DIFSECT: u32 = 0xFFFFFFFC; // -4
/// Sector holds FAT entries
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a sector chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

/// No sibling or child in the directory tree
pub const NOSTREAM: u32 = 0xFFFFFFFF;

// Directory entry types
pub const STGTY_EMPTY: u8 = 0;
pub const STGTY_STORAGE: u8 = 1;
pub const STGTY_STREAM: u8 = 2;
pub const STGTY_ROOT: u8 = 5;

// Property value types used by summary information streams
pub const VT_I2: u16 = 2;
pub const VT_I4: u16 = 3;
pub const VT_BOOL: u16 = 11;
pub const VT_UI2: u16 = 18;
pub const VT_UI4: u16 = 19;
pub const VT_LPSTR: u16 = 30;
pub const VT_LPWSTR: u16 = 31;
pub const VT_FILETIME: u16 = 64;

/// Code page property id inside a property set section
pub const PID_CODEPAGE: u32 = 1;

/// Code page value declaring UTF-16LE strings
pub const CP_UTF16: u16 = 1200;
