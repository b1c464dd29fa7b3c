//! Submission of correlated clipboard entries to the mash backend.

use soot_protocol::{CompositePayload, MetadataEntry, PROCESS_ENTRIES_PATH, ProcessedEntry};
use tracing::{debug, info, warn};

use crate::authenticated::AuthenticatedClient;
use crate::clipboard::{ClipboardSource, CorrelationReport, Correlator};
use crate::error::Result;
use crate::http::join_url;

/// Local correlation output plus what the backend made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingestion {
	pub report: CorrelationReport,
	/// Empty when there was nothing to submit.
	pub processed: Vec<ProcessedEntry>,
}

/// Client for the mash backend's ingestion endpoint.
#[derive(Debug, Clone)]
pub struct MashBackend {
	client: AuthenticatedClient,
	base_url: String,
}

impl MashBackend {
	pub fn new(client: AuthenticatedClient, base_url: impl Into<String>) -> Self {
		Self {
			client,
			base_url: base_url.into(),
		}
	}

	pub fn client(&self) -> &AuthenticatedClient {
		&self.client
	}

	/// Posts the payloads' metadata, in order, and returns the processed entries.
	///
	/// A response whose length differs from the request is logged and returned
	/// as is.
	pub async fn process_entries(&self, payloads: &[CompositePayload]) -> Result<Vec<ProcessedEntry>> {
		let url = join_url(&self.base_url, PROCESS_ENTRIES_PATH);
		let entries: Vec<&MetadataEntry> = payloads.iter().map(|p| &p.metadata).collect();
		debug!(target = "soot.backend", %url, entries = entries.len(), "submitting entries");

		let response = self.client.post_json(&url, &entries).await?.error_for_status(&url)?;
		let processed: Vec<ProcessedEntry> = response.json()?;

		if processed.len() != entries.len() {
			warn!(
				target = "soot.backend",
				sent = entries.len(),
				received = processed.len(),
				"backend returned a different number of entries"
			);
		}
		info!(target = "soot.backend", processed = processed.len(), "entries processed");
		Ok(processed)
	}

	/// Reads the clipboard once, correlates it, and submits the result.
	///
	/// Nothing is posted when the clipboard yields no metadata entries.
	pub async fn ingest(&self, correlator: &Correlator, source: &dyn ClipboardSource) -> Result<Ingestion> {
		let report = correlator.read_and_correlate(source).await?;
		if report.payloads.is_empty() {
			info!(target = "soot.backend", "no clipboard entries to submit");
			return Ok(Ingestion {
				report,
				processed: Vec::new(),
			});
		}

		let processed = self.process_entries(&report.payloads).await?;
		Ok(Ingestion { report, processed })
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::clipboard::{ClipboardItem, ClipboardSnapshot};
	use crate::error::Error;
	use crate::testing::{Harness, Reply};

	const MASH: &str = "http://mash.test";

	fn backend(h: &Harness) -> MashBackend {
		MashBackend::new(AuthenticatedClient::new(h.manager.clone()), MASH)
	}

	fn payload(id: &str) -> CompositePayload {
		CompositePayload {
			metadata: MetadataEntry {
				image_url: None,
				instance_id: id.into(),
				filename: None,
				space_id: "s1".into(),
				operation: "copy".into(),
			},
			image_base64: Some("AAAA".into()),
		}
	}

	fn processed(id: &str) -> serde_json::Value {
		json!({
			"metadata": { "instanceId": id, "filename": null, "spaceId": "s1", "operation": 0 },
			"imageBase64": "AAAA",
			"description": "Fake description"
		})
	}

	struct Fixed(ClipboardSnapshot);

	#[async_trait::async_trait]
	impl ClipboardSource for Fixed {
		async fn read(&self) -> Result<ClipboardSnapshot> {
			Ok(self.0.clone())
		}
	}

	#[tokio::test]
	async fn posts_metadata_array_in_order() {
		let h = Harness::with_session(60);
		h.http.on(PROCESS_ENTRIES_PATH, Reply::json(200, json!([processed("a"), processed("b")])));

		let result = backend(&h).process_entries(&[payload("a"), payload("b")]).await.unwrap();
		assert_eq!(result.len(), 2);
		assert_eq!(result[1].metadata.instance_id, "b");
		assert_eq!(result[0].description.as_deref(), Some("Fake description"));

		let request = h.http.requests().into_iter().find(|r| r.url.ends_with(PROCESS_ENTRIES_PATH)).unwrap();
		assert_eq!(request.url, format!("{MASH}{PROCESS_ENTRIES_PATH}"));
		let body: serde_json::Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
		assert_eq!(body[0]["instanceId"], "a");
		assert_eq!(body[1]["instanceId"], "b");
		assert!(body[0].get("imageBase64").is_none(), "only metadata is submitted");
	}

	#[tokio::test]
	async fn error_status_is_reported() {
		let h = Harness::with_session(60);
		h.http.on(PROCESS_ENTRIES_PATH, Reply::status(500));

		let err = backend(&h).process_entries(&[payload("a")]).await.unwrap_err();
		assert!(matches!(err, Error::Status { status: 500, .. }));
	}

	#[tokio::test]
	async fn non_array_body_is_a_json_error() {
		let h = Harness::with_session(60);
		h.http.on(PROCESS_ENTRIES_PATH, Reply::json(200, json!({ "detail": "nope" })));

		let err = backend(&h).process_entries(&[payload("a")]).await.unwrap_err();
		assert!(matches!(err, Error::Json(_)));
	}

	#[tokio::test]
	async fn cardinality_mismatch_is_returned() {
		let h = Harness::with_session(60);
		h.http.on(PROCESS_ENTRIES_PATH, Reply::json(200, json!([processed("a")])));

		let result = backend(&h).process_entries(&[payload("a"), payload("b")]).await.unwrap();
		assert_eq!(result.len(), 1);
	}

	#[tokio::test]
	async fn ingest_correlates_then_submits() {
		let h = Harness::with_session(60);
		h.http.on(PROCESS_ENTRIES_PATH, Reply::json(200, json!([processed("i1")])));
		let source = Fixed(ClipboardSnapshot::from(vec![
			ClipboardItem::new().with(
				"text/soot-json",
				json!({ "spaces": [{ "spaceId": "s1", "operation": "copy", "entries": [{ "instanceId": "i1" }] }] }).to_string(),
			),
			ClipboardItem::new().with("image/png", b"png".to_vec()),
		]));

		let ingestion = backend(&h).ingest(&Correlator::new(backend(&h).client().clone()), &source).await.unwrap();
		assert_eq!(ingestion.report.payloads.len(), 1);
		assert_eq!(ingestion.processed.len(), 1);
		assert_eq!(h.http.count(PROCESS_ENTRIES_PATH), 1);
	}

	#[tokio::test]
	async fn ingest_skips_submission_without_entries() {
		let h = Harness::with_session(60);
		let source = Fixed(ClipboardSnapshot::from(vec![ClipboardItem::new().with("image/png", b"png".to_vec())]));

		let ingestion = backend(&h).ingest(&Correlator::new(backend(&h).client().clone()), &source).await.unwrap();
		assert!(ingestion.processed.is_empty());
		assert_eq!(ingestion.report.unused_images, 1);
		assert!(h.http.requests().is_empty());
	}
}
