//! Metadata extraction and positional image pairing.
//!
//! The clipboard format carries no per-entry image identifier, so metadata
//! entry `i` is paired with PNG representation `i` in encounter order. That
//! contract lives in [`pair_positionally`] alone; swap it out if the format
//! ever gains explicit identifiers.

use std::future::Future;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use soot_protocol::{CompositePayload, IMAGE_PNG, METADATA_KEYWORD, MetadataDocument, MetadataEntry};
use tracing::{debug, info, warn};

use super::{ClipboardSnapshot, ClipboardSource};
use crate::authenticated::AuthenticatedClient;
use crate::error::{Error, Result};

/// How metadata documents from several items combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataPolicy {
	/// Each valid document replaces the entries collected so far.
	#[default]
	LastWins,
	/// Entries from every valid document are concatenated in item order.
	Accumulate,
}

/// A clipboard item whose metadata representation failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedItem {
	/// Index of the item in the snapshot.
	pub item: usize,
	/// Representation identifier that matched the metadata keyword.
	pub kind: String,
	pub reason: String,
}

impl From<MalformedItem> for Error {
	fn from(m: MalformedItem) -> Self {
		Error::MalformedMetadata {
			item: m.item,
			reason: m.reason,
		}
	}
}

/// Output of one correlation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationReport {
	/// One payload per metadata entry, in metadata order.
	pub payloads: Vec<CompositePayload>,
	/// Items skipped because their metadata did not parse.
	pub malformed: Vec<MalformedItem>,
	/// Images beyond the last metadata entry.
	pub unused_images: usize,
}

/// Finds, validates, and flattens SOOT metadata across the snapshot.
///
/// Malformed documents are reported and skipped; they never abort the pass.
pub fn extract_metadata(snapshot: &ClipboardSnapshot, policy: MetadataPolicy) -> (Vec<MetadataEntry>, Vec<MalformedItem>) {
	let mut entries = Vec::new();
	let mut malformed = Vec::new();

	for (index, item) in snapshot.items().iter().enumerate() {
		let Some(kind) = item.types().find(|t| t.to_lowercase().contains(METADATA_KEYWORD)) else {
			continue;
		};
		debug!(target = "soot.clipboard", item = index, kind, "found metadata representation");

		let parsed = match item.get_text(kind) {
			Some(Ok(text)) => parse_document(text),
			Some(Err(err)) => Err(format!("metadata is not UTF-8: {err}")),
			None => Err("metadata representation vanished".to_string()),
		};

		match parsed {
			Ok(document) => {
				let flattened = document.flatten();
				info!(target = "soot.clipboard", item = index, entries = flattened.len(), "extracted metadata entries");
				match policy {
					MetadataPolicy::LastWins => entries = flattened,
					MetadataPolicy::Accumulate => entries.extend(flattened),
				}
			}
			Err(reason) => {
				warn!(target = "soot.clipboard", item = index, %reason, "skipping malformed metadata");
				malformed.push(MalformedItem {
					item: index,
					kind: kind.to_string(),
					reason,
				});
			}
		}
	}

	(entries, malformed)
}

fn parse_document(text: &str) -> std::result::Result<MetadataDocument, String> {
	let value: serde_json::Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
	if !value.get("spaces").is_some_and(serde_json::Value::is_array) {
		return Err("missing \"spaces\" array".to_string());
	}
	serde_json::from_value(value).map_err(|e| format!("invalid metadata document: {e}"))
}

/// Every PNG representation across all items, in item then representation order.
pub fn collect_images(snapshot: &ClipboardSnapshot) -> Vec<&[u8]> {
	snapshot
		.items()
		.iter()
		.flat_map(|item| item.representations())
		.filter(|r| r.kind.eq_ignore_ascii_case(IMAGE_PNG))
		.map(|r| r.data.as_slice())
		.collect()
}

/// Pairs `entries[i]` with `images[i]`.
///
/// Entries past the end of `images` fall back to fetching their `imageURL`
/// with `fetch`; entries with neither get no image. Surplus images are ignored.
pub async fn pair_positionally<F, Fut>(entries: Vec<MetadataEntry>, images: &[&[u8]], mut fetch: F) -> Result<Vec<CompositePayload>>
where
	F: FnMut(String) -> Fut,
	Fut: Future<Output = Result<Vec<u8>>>,
{
	let mut payloads = Vec::with_capacity(entries.len());
	for (index, metadata) in entries.into_iter().enumerate() {
		let image_base64 = match (images.get(index), metadata.image_url.as_deref()) {
			(Some(bytes), _) => Some(STANDARD.encode(bytes)),
			(None, Some(url)) => {
				debug!(target = "soot.clipboard", index, url, "no clipboard image, fetching by URL");
				Some(STANDARD.encode(fetch(url.to_string()).await?))
			}
			(None, None) => None,
		};

		debug!(
			target = "soot.clipboard",
			index,
			instance_id = %metadata.instance_id,
			image_len = image_base64.as_ref().map(String::len),
			"payload ready"
		);
		payloads.push(CompositePayload { metadata, image_base64 });
	}
	Ok(payloads)
}

/// Correlates clipboard snapshots, fetching missing images through the session.
#[derive(Debug, Clone)]
pub struct Correlator {
	client: AuthenticatedClient,
	policy: MetadataPolicy,
}

impl Correlator {
	pub fn new(client: AuthenticatedClient) -> Self {
		Self {
			client,
			policy: MetadataPolicy::default(),
		}
	}

	pub fn with_policy(mut self, policy: MetadataPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub async fn correlate(&self, snapshot: &ClipboardSnapshot) -> Result<CorrelationReport> {
		if snapshot.is_empty() {
			debug!(target = "soot.clipboard", "empty snapshot");
			return Ok(CorrelationReport::default());
		}

		let (entries, malformed) = extract_metadata(snapshot, self.policy);
		let images = collect_images(snapshot);
		let unused_images = images.len().saturating_sub(entries.len());
		info!(
			target = "soot.clipboard",
			items = snapshot.len(),
			entries = entries.len(),
			images = images.len(),
			"correlating clipboard"
		);

		let client = &self.client;
		let payloads = pair_positionally(entries, &images, |url| async move { client.get_bytes(&url).await }).await?;

		Ok(CorrelationReport {
			payloads,
			malformed,
			unused_images,
		})
	}

	/// Reads `source` once and correlates the snapshot.
	pub async fn read_and_correlate(&self, source: &dyn ClipboardSource) -> Result<CorrelationReport> {
		let snapshot = source.read().await?;
		self.correlate(&snapshot).await
	}
}
