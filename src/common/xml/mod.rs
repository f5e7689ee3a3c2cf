//! XML text helpers shared by the HWPX reader and writer.

pub mod escape;

pub use escape::{escape_xml, unescape_xml};
