//! Clipboard metadata document written by the SOOT desktop app.
//!
//! The document travels in a custom clipboard representation whose identifier
//! contains [`METADATA_KEYWORD`] (platforms may add a vendor prefix such as
//! `web text/soot-json`). Its shape is:
//!
//! ```json
//! { "spaces": [ { "spaceId": "s1", "operation": "copy",
//!                 "entries": [ { "imageURL": "...", "instanceId": "i1", "filename": "a.png" } ] } ] }
//! ```
//!
//! [`MetadataDocument::flatten`] turns it into one [`MetadataEntry`] per entry,
//! in space order then entry order.

use serde::{Deserialize, Deserializer, Serialize};

/// Keyword identifying the metadata representation (case-insensitive substring).
pub const METADATA_KEYWORD: &str = "soot-json";

/// Representation identifier carrying raw PNG bytes.
pub const IMAGE_PNG: &str = "image/png";

/// Top-level metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
	pub spaces: Vec<MetadataSpace>,
}

/// One space of copied instances sharing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSpace {
	pub space_id: String,
	/// Operation tag. The desktop app writes text, older builds write integers.
	#[serde(deserialize_with = "string_or_number")]
	pub operation: String,
	pub entries: Vec<MetadataRecord>,
}

/// One copied instance inside a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
	#[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	pub instance_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub filename: Option<String>,
}

/// Flattened metadata record: one copied instance plus its space context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
	#[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	pub instance_id: String,
	#[serde(default)]
	pub filename: Option<String>,
	pub space_id: String,
	#[serde(deserialize_with = "string_or_number")]
	pub operation: String,
}

impl MetadataDocument {
	/// Flattens spaces into entries, preserving space order then entry order.
	///
	/// Empty filenames are normalized to [`None`].
	pub fn flatten(&self) -> Vec<MetadataEntry> {
		self.spaces
			.iter()
			.flat_map(|space| {
				space.entries.iter().map(move |entry| MetadataEntry {
					image_url: entry.image_url.clone(),
					instance_id: entry.instance_id.clone(),
					filename: entry.filename.clone().filter(|f| !f.is_empty()),
					space_id: space.space_id.clone(),
					operation: space.operation.clone(),
				})
			})
			.collect()
	}
}

/// Composite of one metadata entry and its correlated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositePayload {
	pub metadata: MetadataEntry,
	/// Standard base64 (with padding) of the image bytes.
	#[serde(default)]
	pub image_base64: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Number(serde_json::Number),
	}

	Ok(match Raw::deserialize(deserializer)? {
		Raw::Text(s) => s,
		Raw::Number(n) => n.to_string(),
	})
}
