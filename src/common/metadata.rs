//! Unified metadata representation for HWP and HWPX documents.
//!
//! Legacy documents carry their properties in the `\x05HwpSummaryInformation`
//! property set; HWPX packages carry them in the `<opf:metadata>` block of
//! `Contents/content.hpf`. Both are folded into this one structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unified document metadata structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Document subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Document author/creator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Keywords associated with the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Document description/comments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Last person to modify the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Creation date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Last modification date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Number of pages recorded by the authoring application
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Language tag of the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Metadata {
    /// Check if the metadata contains any actual data.
    pub fn has_data(&self) -> bool {
        self.title.is_some()
            || self.subject.is_some()
            || self.author.is_some()
            || self.keywords.is_some()
            || self.description.is_some()
            || self.last_modified_by.is_some()
            || self.revision.is_some()
            || self.created.is_some()
            || self.modified.is_some()
            || self.page_count.is_some()
            || self.language.is_some()
    }
}

#[cfg(feature = "hwp")]
impl From<crate::ole::OleMetadata> for Metadata {
    fn from(ole_metadata: crate::ole::OleMetadata) -> Self {
        Self {
            title: ole_metadata.title,
            subject: ole_metadata.subject,
            author: ole_metadata.author,
            keywords: ole_metadata.keywords,
            description: ole_metadata.comments,
            last_modified_by: ole_metadata.last_saved_by,
            revision: ole_metadata.revision_number,
            created: ole_metadata.create_time,
            modified: ole_metadata.last_saved_time,
            page_count: ole_metadata.num_pages,
            language: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_has_data() {
        let empty_metadata = Metadata::default();
        assert!(!empty_metadata.has_data());

        let metadata_with_title = Metadata {
            title: Some("Test Document".to_string()),
            ..Default::default()
        };
        assert!(metadata_with_title.has_data());
    }

    #[test]
    fn test_metadata_json_skips_empty_fields() {
        let metadata = Metadata {
            author: Some("Hong Gildong".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"author":"Hong Gildong"}"#);
    }

    #[test]
    #[cfg(feature = "hwp")]
    fn test_ole_metadata_conversion() {
        let ole_metadata = crate::ole::OleMetadata {
            title: Some("Report".to_string()),
            comments: Some("Quarterly".to_string()),
            ..Default::default()
        };

        let metadata: Metadata = ole_metadata.into();
        assert_eq!(metadata.title, Some("Report".to_string()));
        assert_eq!(metadata.description, Some("Quarterly".to_string()));
    }
}
