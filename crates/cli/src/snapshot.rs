//! Clipboard snapshots loaded from a JSON file.
//!
//! The file is an array of items, each mapping representation identifiers to
//! their content in platform order:
//!
//! ```json
//! [
//!   { "types": { "web text/soot-json": { "text": "{\"spaces\": []}" } } },
//!   { "types": { "image/png": { "path": "shot.png" } } },
//!   { "types": { "image/png": { "base64": "iVBORw0KGgo=" } } }
//! ]
//! ```
//!
//! Relative `path`s resolve against the snapshot file's directory.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use soot::{ClipboardItem, ClipboardSnapshot, ClipboardSource};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SnapshotItem {
	types: Representations,
}

/// Representation map that keeps document order.
#[derive(Debug, Default)]
struct Representations(Vec<(String, Content)>);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Content {
	Text(String),
	Base64(String),
	Path(PathBuf),
}

impl<'de> Deserialize<'de> for Representations {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct OrderedVisitor;

		impl<'de> Visitor<'de> for OrderedVisitor {
			type Value = Representations;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("a map of representation type to content")
			}

			fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
				let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
				while let Some(entry) = map.next_entry::<String, Content>()? {
					entries.push(entry);
				}
				Ok(Representations(entries))
			}
		}

		deserializer.deserialize_map(OrderedVisitor)
	}
}

/// [`ClipboardSource`] backed by a snapshot file, re-read on every call.
#[derive(Debug, Clone)]
pub struct FileClipboard {
	path: PathBuf,
}

impl FileClipboard {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	fn base_dir(&self) -> &Path {
		self.path.parent().unwrap_or_else(|| Path::new("."))
	}

	async fn load(&self) -> anyhow::Result<ClipboardSnapshot> {
		let raw = tokio::fs::read(&self.path).await.context("cannot read snapshot")?;
		let items: Vec<SnapshotItem> = serde_json::from_slice(&raw).context("snapshot is not a JSON array of items")?;

		let mut snapshot = Vec::with_capacity(items.len());
		for (index, item) in items.into_iter().enumerate() {
			let mut clipboard_item = ClipboardItem::new();
			for (kind, content) in item.types.0 {
				let data = self
					.materialize(content)
					.await
					.with_context(|| format!("item {index}, type {kind:?}"))?;
				clipboard_item = clipboard_item.with(kind, data);
			}
			snapshot.push(clipboard_item);
		}
		Ok(ClipboardSnapshot::new(snapshot))
	}

	async fn materialize(&self, content: Content) -> anyhow::Result<Vec<u8>> {
		match content {
			Content::Text(text) => Ok(text.into_bytes()),
			Content::Base64(encoded) => STANDARD.decode(encoded.trim()).context("invalid base64"),
			Content::Path(path) => {
				let path = self.base_dir().join(path);
				tokio::fs::read(&path)
					.await
					.with_context(|| format!("cannot read {}", path.display()))
			}
		}
	}
}

#[async_trait]
impl ClipboardSource for FileClipboard {
	async fn read(&self) -> soot::Result<ClipboardSnapshot> {
		let snapshot = self
			.load()
			.await
			.map_err(|err| soot::Error::Clipboard(format!("{}: {err:#}", self.path.display())))?;
		debug!(target = "soot.cli", path = %self.path.display(), items = snapshot.len(), "snapshot loaded");
		Ok(snapshot)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn loads_items_in_document_order() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("shot.png"), b"png-bytes").unwrap();
		let path = dir.path().join("clip.json");
		std::fs::write(
			&path,
			r#"[
				{ "types": { "text/plain": { "text": "hi" }, "web text/soot-json": { "text": "{}" } } },
				{ "types": { "image/png": { "path": "shot.png" } } },
				{ "types": { "image/png": { "base64": "AQID" } } }
			]"#,
		)
		.unwrap();

		let snapshot = FileClipboard::new(&path).read().await.unwrap();
		assert_eq!(snapshot.len(), 3);
		let kinds: Vec<_> = snapshot.items()[0].types().collect();
		assert_eq!(kinds, vec!["text/plain", "web text/soot-json"]);
		assert_eq!(snapshot.items()[1].get_type("image/png"), Some(&b"png-bytes"[..]));
		assert_eq!(snapshot.items()[2].get_type("image/png"), Some(&[1u8, 2, 3][..]));
	}

	#[tokio::test]
	async fn missing_file_is_a_clipboard_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = FileClipboard::new(dir.path().join("nope.json")).read().await.unwrap_err();
		assert!(matches!(err, soot::Error::Clipboard(_)));
	}

	#[tokio::test]
	async fn bad_base64_names_the_item() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("clip.json");
		std::fs::write(&path, r#"[{ "types": { "image/png": { "base64": "***" } } }]"#).unwrap();

		let err = FileClipboard::new(&path).read().await.unwrap_err();
		let message = err.to_string();
		assert!(message.contains("item 0"), "{message}");
		assert!(message.contains("invalid base64"), "{message}");
	}

	#[tokio::test]
	async fn unknown_content_kind_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("clip.json");
		std::fs::write(&path, r#"[{ "types": { "image/png": { "url": "http://x" } } }]"#).unwrap();

		assert!(FileClipboard::new(&path).read().await.is_err());
	}
}
