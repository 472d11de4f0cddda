//! Construction-time configuration for [`crate::DriveFs`].

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, TypeTags};

pub const DEFAULT_ROOT_ID: &str = "root";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const FILE_FIELDS: &str = "parents,id,name,mimeType,size,modifiedTime,shortcutDetails,webViewLink";
pub const LIST_FIELDS: &str =
    "nextPageToken,files(parents,id,name,mimeType,size,modifiedTime,shortcutDetails,webViewLink)";
pub const PERMISSION_FIELDS: &str = "id,type,emailAddress,domain,role,allowFileDiscovery";
pub const PERMISSION_LIST_FIELDS: &str =
    "nextPageToken,permissions(id,type,emailAddress,domain,role,allowFileDiscovery)";

/// Settings shared by every operation of one [`crate::DriveFs`].
///
/// The type tags and field selectors are data handed to the node
/// accessor; resolvers never look at raw type strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveFsConfig {
    /// Where reverse resolution stops
    pub root_id: NodeId,
    /// Page size requested when draining listings
    pub page_size: usize,
    pub type_tags: TypeTags,
    pub file_fields: String,
    pub list_fields: String,
    pub permission_fields: String,
    pub permission_list_fields: String,
    /// Upper bound on reverse-resolution depth; `None` walks until a root
    pub max_depth: Option<usize>,
}

impl Default for DriveFsConfig {
    fn default() -> Self {
        Self {
            root_id: NodeId::from(DEFAULT_ROOT_ID),
            page_size: DEFAULT_PAGE_SIZE,
            type_tags: TypeTags::default(),
            file_fields: FILE_FIELDS.to_string(),
            list_fields: LIST_FIELDS.to_string(),
            permission_fields: PERMISSION_FIELDS.to_string(),
            permission_list_fields: PERMISSION_LIST_FIELDS.to_string(),
            max_depth: None,
        }
    }
}

impl DriveFsConfig {
    pub fn new(root_id: impl Into<NodeId>) -> Self {
        Self {
            root_id: root_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    #[must_use]
    pub fn with_type_tags(mut self, type_tags: TypeTags) -> Self {
        self.type_tags = type_tags;
        self
    }
}
