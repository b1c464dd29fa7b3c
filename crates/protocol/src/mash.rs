//! Mash backend request/response types.

use serde::{Deserialize, Serialize};

use crate::clipboard::MetadataEntry;

/// Path of the ingestion endpoint, relative to the mash base URL.
pub const PROCESS_ENTRIES_PATH: &str = "/api/mash/process-entries";

/// One element of the ingestion response, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedEntry {
	pub metadata: MetadataEntry,
	#[serde(default)]
	pub image_base64: Option<String>,
	/// Generated description of the image, when the backend produced one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}
