//! Drives one merge job from record slots to a written PDF.
//!
//! Job states: resolving, converting each image, concatenating, then
//! succeeded or failed. The job's [`ArtifactScope`] is released on entering
//! either terminal state, and on drop if a panic cuts the job short.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info_span;
use uuid::Uuid;

use crate::candidate::{FileFormat, MergeCandidate, MergeJob};
use crate::config::Config;
use crate::error::{ArtifactError, MergeError};
use crate::io::{PdfReader, PdfWriter, WriteOptions};
use crate::lifecycle::ArtifactScope;
use crate::merge::merger::PdfConcatenator;
use crate::normalize::ImageNormalizer;
use crate::record::{CaseRecord, FileReference, Slot, UploadSlot};
use crate::utils::{format_file_size, merged_file_name};

/// One source that contributed pages to a merged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    /// Slot the file came from.
    pub slot: Slot,
    /// Reference as stored on the record.
    pub reference: FileReference,
    /// Original format of the file.
    pub format: FileFormat,
    /// Pages it contributed.
    pub pages: usize,
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Id of the job that produced the file.
    pub job_id: Uuid,
    /// File name of the merged PDF, relative to the storage root.
    pub file_name: String,
    /// Total pages in the merged PDF.
    pub page_count: usize,
    /// Contributing sources in page order.
    pub sources: Vec<SourceSummary>,
    /// Temp files deleted when the job finished.
    pub temp_files_released: usize,
    /// Size of the merged PDF in bytes.
    pub output_size: u64,
}

type JobFailure = (Option<Slot>, ArtifactError);

/// Merges a record's slots into one PDF inside the storage root.
#[derive(Debug, Clone)]
pub struct MergeOrchestrator {
    config: Arc<Config>,
    normalizer: ImageNormalizer,
    reader: PdfReader,
    concatenator: PdfConcatenator,
    writer: PdfWriter,
}

impl MergeOrchestrator {
    /// Create an orchestrator for `config`.
    pub fn new(config: Config) -> Self {
        let writer = PdfWriter::with_options(WriteOptions {
            compress: config.compression.compresses(),
            ..Default::default()
        });

        Self {
            config: Arc::new(config),
            normalizer: ImageNormalizer::new(),
            reader: PdfReader::new(),
            concatenator: PdfConcatenator::new(),
            writer,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Merge a record, naming the output after its id and label.
    pub async fn merge_record(&self, record: &CaseRecord) -> Result<MergeOutcome, MergeError> {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let output_name = merged_file_name(record.id, record.label.as_deref(), timestamp_ms);
        self.merge(record.id, record.slots(), output_name).await
    }

    /// Merge `slots` in order into `output_name` under the storage root.
    ///
    /// The job runs on a blocking worker. If the caller stops awaiting, the
    /// job still runs to the end and still removes its temp files.
    ///
    /// # Errors
    ///
    /// Returns a [`MergeError`] naming the job, the record and (when one
    /// file was at fault) the slot. Nothing is left at the output path and
    /// no temp file survives.
    pub async fn merge(
        &self,
        record_id: i64,
        slots: impl IntoIterator<Item = UploadSlot>,
        output_name: impl Into<String>,
    ) -> Result<MergeOutcome, MergeError> {
        let job_id = Uuid::new_v4();
        let slots: Vec<UploadSlot> = slots.into_iter().collect();
        let output_name = output_name.into();

        let span = info_span!("merge_job", %job_id, record_id);
        let orchestrator = self.clone();

        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            orchestrator.merge_blocking(job_id, record_id, &slots, output_name)
        })
        .await
        .map_err(|e| {
            MergeError::new(
                job_id,
                record_id,
                None,
                ArtifactError::Interrupted {
                    reason: e.to_string(),
                },
            )
        })?
    }

    /// Run a whole job on the current thread.
    pub fn merge_blocking(
        &self,
        job_id: Uuid,
        record_id: i64,
        slots: &[UploadSlot],
        output_name: String,
    ) -> Result<MergeOutcome, MergeError> {
        let root = self.config.storage_root.as_path();
        tracing::info!(output = %output_name, "merge job started");

        let candidates = slots.iter().filter_map(|upload| {
            let candidate = MergeCandidate::resolve(root, upload);
            match &candidate {
                Some(c) => tracing::debug!(
                    slot = %c.slot,
                    path = %c.path.display(),
                    exists = c.exists,
                    format = ?c.format,
                    "resolved slot"
                ),
                None => tracing::debug!(slot = %upload.slot, "slot not provided"),
            }
            candidate
        });

        let job = MergeJob::plan(job_id, record_id, candidates, output_name)
            .map_err(|e| MergeError::new(job_id, record_id, None, e))?;

        let mut scope = ArtifactScope::new(root, job_id);
        let result = self.run(&job, &mut scope, root);
        let released = scope.release_all();

        match result {
            Ok(mut outcome) => {
                outcome.temp_files_released = released.removed;
                tracing::info!(
                    file = %outcome.file_name,
                    pages = outcome.page_count,
                    size = %format_file_size(outcome.output_size),
                    temp_files_released = released.removed,
                    "merge job succeeded"
                );
                Ok(outcome)
            }
            Err((slot, cause)) => {
                let err = MergeError::new(job_id, record_id, slot, cause);
                tracing::error!(
                    error = %err,
                    temp_files_released = released.removed,
                    "merge job failed"
                );
                Err(err)
            }
        }
    }

    fn run(
        &self,
        job: &MergeJob,
        scope: &mut ArtifactScope,
        root: &Path,
    ) -> Result<MergeOutcome, JobFailure> {
        let mut documents = Vec::with_capacity(job.candidates.len());
        let mut sources = Vec::with_capacity(job.candidates.len());

        for candidate in &job.candidates {
            let at_slot = |e: ArtifactError| (Some(candidate.slot), e);

            let pdf_path = if candidate.format.is_image() {
                let temp = scope.temp_pdf_path(&candidate.path);
                self.normalizer
                    .normalize(&candidate.path, &temp)
                    .map_err(at_slot)?
            } else {
                candidate.path.clone()
            };

            let loaded = self.reader.load(&pdf_path).map_err(at_slot)?;

            sources.push(SourceSummary {
                slot: candidate.slot,
                reference: candidate.reference.clone(),
                format: candidate.format,
                pages: loaded.page_count,
            });
            documents.push(loaded.document);
        }

        let merged = self
            .concatenator
            .concatenate(documents)
            .map_err(|e| (None, e))?;
        let page_count = merged.get_pages().len();

        let output_path = root.join(&job.output_name);
        let stats = self
            .writer
            .save(merged, &output_path)
            .map_err(|e| (None, e))?;

        Ok(MergeOutcome {
            job_id: job.id,
            file_name: job.output_name.clone(),
            page_count,
            sources,
            temp_files_released: 0,
            output_size: stats.file_size,
        })
    }
}
