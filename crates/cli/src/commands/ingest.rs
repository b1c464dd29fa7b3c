use serde::Serialize;
use soot::{CompositePayload, Correlator, MashBackend, MetadataPolicy, ProcessedEntry};
use tracing::info;

use super::CommandOutcome;
use crate::cli::IngestArgs;
use crate::context::CommandContext;
use crate::error::Result;
use crate::snapshot::FileClipboard;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestData {
	pub payloads: Vec<CompositePayload>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub malformed: Vec<MalformedData>,
	pub unused_images: usize,
	pub submitted: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub processed: Option<Vec<ProcessedEntry>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MalformedData {
	pub item: usize,
	pub kind: String,
	pub reason: String,
}

pub async fn execute(ctx: &CommandContext, args: &IngestArgs) -> Result<CommandOutcome<IngestData>> {
	let policy = if args.accumulate {
		MetadataPolicy::Accumulate
	} else {
		MetadataPolicy::LastWins
	};
	let correlator = Correlator::new(ctx.client()).with_policy(policy);
	let source = FileClipboard::new(&args.snapshot);

	let (report, processed) = if args.no_submit {
		(correlator.read_and_correlate(&source).await?, None)
	} else {
		let backend = MashBackend::new(ctx.client(), ctx.config().mash_base_url.clone());
		let ingestion = backend.ingest(&correlator, &source).await?;
		let submitted = (!ingestion.report.payloads.is_empty()).then_some(ingestion.processed);
		(ingestion.report, submitted)
	};

	let mut warnings = Vec::new();
	if !report.malformed.is_empty() {
		warnings.push(format!("{} clipboard item(s) carried malformed metadata", report.malformed.len()));
	}
	if report.unused_images > 0 {
		warnings.push(format!("{} image(s) had no matching metadata entry", report.unused_images));
	}
	if let Some(ref processed) = processed {
		if processed.len() != report.payloads.len() {
			warnings.push(format!(
				"backend returned {} entries for {} submitted",
				processed.len(),
				report.payloads.len()
			));
		}
	}
	info!(target = "soot.cli", entries = report.payloads.len(), submitted = processed.is_some(), "ingest finished");

	let data = IngestData {
		malformed: report
			.malformed
			.into_iter()
			.map(|m| MalformedData {
				item: m.item,
				kind: m.kind,
				reason: m.reason,
			})
			.collect(),
		unused_images: report.unused_images,
		submitted: processed.is_some(),
		payloads: report.payloads,
		processed,
	};
	Ok(CommandOutcome { data, warnings })
}
