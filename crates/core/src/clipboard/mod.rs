//! Clipboard snapshot model and the metadata/image correlation engine.
//!
//! A [`ClipboardSource`] captures a [`ClipboardSnapshot`] in one read. The
//! [`Correlator`] pulls the SOOT metadata document and the PNG images out of
//! it and pairs them into [`CompositePayload`]s.
//!
//! [`CompositePayload`]: soot_protocol::CompositePayload

mod correlate;


use async_trait::async_trait;

pub use self::correlate::{CorrelationReport, Correlator, MalformedItem, MetadataPolicy, collect_images, extract_metadata, pair_positionally};
use crate::error::Result;

/// One typed view of a clipboard item, already materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
	/// Representation identifier, usually a MIME type (`image/png`, `web text/soot-json`).
	pub kind: String,
	pub data: Vec<u8>,
}

/// A logical clipboard item exposing one or more representations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardItem {
	representations: Vec<Representation>,
}

impl ClipboardItem {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a representation, keeping insertion order.
	pub fn with(mut self, kind: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
		self.representations.push(Representation {
			kind: kind.into(),
			data: data.into(),
		});
		self
	}

	/// Representation identifiers in platform order.
	pub fn types(&self) -> impl Iterator<Item = &str> {
		self.representations.iter().map(|r| r.kind.as_str())
	}

	pub fn get_type(&self, kind: &str) -> Option<&[u8]> {
		self.representations
			.iter()
			.find(|r| r.kind == kind)
			.map(|r| r.data.as_slice())
	}

	/// Materializes a representation as UTF-8 text.
	pub fn get_text(&self, kind: &str) -> Option<std::result::Result<&str, std::str::Utf8Error>> {
		self.get_type(kind).map(std::str::from_utf8)
	}

	pub fn representations(&self) -> &[Representation] {
		&self.representations
	}
}

/// Items captured by a single clipboard read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardSnapshot {
	items: Vec<ClipboardItem>,
}

impl ClipboardSnapshot {
	pub fn new(items: Vec<ClipboardItem>) -> Self {
		Self { items }
	}

	pub fn items(&self) -> &[ClipboardItem] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

impl From<Vec<ClipboardItem>> for ClipboardSnapshot {
	fn from(items: Vec<ClipboardItem>) -> Self {
		Self::new(items)
	}
}

/// Clipboard read capability.
///
/// Implementations return [`Error::UnsupportedEnvironment`] when the host has
/// no readable clipboard at all.
///
/// [`Error::UnsupportedEnvironment`]: crate::Error::UnsupportedEnvironment
#[async_trait]
pub trait ClipboardSource: Send + Sync {
	async fn read(&self) -> Result<ClipboardSnapshot>;
}
