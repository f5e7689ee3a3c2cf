//! File format type enumeration.

use serde::{Deserialize, Serialize};

/// Container formats that can be detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Legacy HWP 5.x document (compound binary container, .hwp)
    Hwp,
    /// HWPX document (XML inside a ZIP package, .hwpx)
    Hwpx,
}

impl FileFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Hwp => "hwp",
            FileFormat::Hwpx => "hwpx",
        }
    }
}
