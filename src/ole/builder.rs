//! Minimal compound file writer used to build test fixtures in memory.
//!
//! Every stream is stored in regular 512-byte sectors (the mini stream cutoff
//! is written as zero), and siblings are chained through their right
//! pointers. Readers must not rely on the directory being a balanced
//! red-black tree, so this layout exercises the generic traversal.

use super::consts::*;

#[derive(Debug)]
struct Node {
    name: String,
    entry_type: u8,
    data: Vec<u8>,
    children: Vec<usize>,
}

#[derive(Debug)]
pub struct CompoundBuilder {
    nodes: Vec<Node>,
}

impl Default for CompoundBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompoundBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "Root Entry".to_string(),
                entry_type: STGTY_ROOT,
                data: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    /// Add a stream, creating intermediate storages as needed.
    pub fn stream(mut self, path: &[&str], data: &[u8]) -> Self {
        let mut parent = 0;
        for (i, name) in path.iter().enumerate() {
            let last = i + 1 == path.len();
            let existing = self.nodes[parent]
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].name == *name);
            parent = match existing {
                Some(idx) if !last => idx,
                _ => {
                    let idx = self.nodes.len();
                    self.nodes.push(Node {
                        name: name.to_string(),
                        entry_type: if last { STGTY_STREAM } else { STGTY_STORAGE },
                        data: if last { data.to_vec() } else { Vec::new() },
                        children: Vec::new(),
                    });
                    self.nodes[parent].children.push(idx);
                    idx
                },
            };
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        const SECTOR: usize = 512;
        let sectors_for = |len: usize| len.div_ceil(SECTOR);

        let dir_sectors = sectors_for(self.nodes.len() * DIRENTRY_SIZE);
        let data_sectors: usize = self.nodes.iter().map(|n| sectors_for(n.data.len())).sum();
        let mut fat_sectors = 1;
        while fat_sectors * (SECTOR / 4) < fat_sectors + dir_sectors + data_sectors {
            fat_sectors += 1;
        }
        assert!(fat_sectors <= 109, "fixture too large for header DIFAT");

        let total = fat_sectors + dir_sectors + data_sectors;
        let mut fat = vec![FREESECT; fat_sectors * (SECTOR / 4)];
        for entry in fat.iter_mut().take(fat_sectors) {
            *entry = FATSECT;
        }
        let chain = |fat: &mut Vec<u32>, start: usize, count: usize| {
            for s in start..start + count {
                fat[s] = if s + 1 == start + count {
                    ENDOFCHAIN
                } else {
                    (s + 1) as u32
                };
            }
        };
        let first_dir = fat_sectors;
        chain(&mut fat, first_dir, dir_sectors);

        let mut next = first_dir + dir_sectors;
        let mut starts = vec![ENDOFCHAIN; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let count = sectors_for(node.data.len());
            if count > 0 {
                starts[i] = next as u32;
                chain(&mut fat, next, count);
                next += count;
            }
        }
        debug_assert_eq!(next, total);

        let mut out = vec![0u8; SECTOR * (total + 1)];
        let header = &mut out[..SECTOR];
        header[..8].copy_from_slice(MAGIC);
        header[0x18..0x1A].copy_from_slice(&0x003Eu16.to_le_bytes());
        header[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
        header[0x1C..0x1E].copy_from_slice(&0xFFFEu16.to_le_bytes());
        header[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
        header[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
        header[0x2C..0x30].copy_from_slice(&(fat_sectors as u32).to_le_bytes());
        header[0x30..0x34].copy_from_slice(&(first_dir as u32).to_le_bytes());
        header[0x38..0x3C].copy_from_slice(&0u32.to_le_bytes());
        header[0x3C..0x40].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        header[0x44..0x48].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        for i in 0..109 {
            let value = if i < fat_sectors { i as u32 } else { FREESECT };
            header[0x4C + i * 4..0x50 + i * 4].copy_from_slice(&value.to_le_bytes());
        }

        for (i, value) in fat.iter().enumerate() {
            let at = SECTOR + i * 4;
            out[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }

        let mut right = vec![NOSTREAM; self.nodes.len()];
        let mut child = vec![NOSTREAM; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(&first) = node.children.first() {
                child[i] = first as u32;
            }
            for pair in node.children.windows(2) {
                right[pair[0]] = pair[1] as u32;
            }
        }

        let dir_base = SECTOR * (first_dir + 1);
        for (i, node) in self.nodes.iter().enumerate() {
            let at = dir_base + i * DIRENTRY_SIZE;
            let entry = &mut out[at..at + DIRENTRY_SIZE];
            let units: Vec<u16> = node.name.encode_utf16().take(31).collect();
            for (k, unit) in units.iter().enumerate() {
                entry[k * 2..k * 2 + 2].copy_from_slice(&unit.to_le_bytes());
            }
            entry[64..66].copy_from_slice(&(((units.len() + 1) * 2) as u16).to_le_bytes());
            entry[66] = node.entry_type;
            entry[67] = 1;
            entry[68..72].copy_from_slice(&NOSTREAM.to_le_bytes());
            entry[72..76].copy_from_slice(&right[i].to_le_bytes());
            entry[76..80].copy_from_slice(&child[i].to_le_bytes());
            entry[116..120].copy_from_slice(&starts[i].to_le_bytes());
            entry[120..128].copy_from_slice(&(node.data.len() as u64).to_le_bytes());
        }
        // Unused directory slots are empty entries with no siblings
        let used = self.nodes.len();
        for i in used..dir_sectors * (SECTOR / DIRENTRY_SIZE) {
            let at = dir_base + i * DIRENTRY_SIZE;
            out[at + 68..at + 80].fill(0xFF);
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if starts[i] != ENDOFCHAIN {
                let at = SECTOR * (starts[i] as usize + 1);
                out[at..at + node.data.len()].copy_from_slice(&node.data);
            }
        }

        out
    }
}
