use serde::{Deserialize, Serialize};

/// Structured extraction of one rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    pub image_count: u32,
    pub images_without_alt: u32,
    pub internal_links: u32,
    pub external_links: u32,
    /// Characters of text content in the document body
    pub content_length: usize,
    pub load_time_ms: u64,
    pub status_code: u16,

    /// Absolute link targets found on the page, candidates for discovery
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

impl PageSnapshot {
    /// An empty snapshot for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}
