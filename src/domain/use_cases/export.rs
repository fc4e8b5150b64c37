use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;

use crate::{
    archive::zip_archive::write_zip,
    entities::{
        export::{
            ArchiveJob, ExportMode, ExportOutcome, ExportPhase, ExportReport, ExportStatus,
            FailedRendition, SavedFile, StatusSignal,
        },
        image::ImageRecord,
        transformation::TransformationDescriptor,
    },
    errors::ExportError,
    repositories::{downloads::SaveTarget, rendition::RenditionSource},
    utils::file_name::{archive_entry_name, index_width, rendition_file_name},
};

const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Export state of one session. Only one export may run at a time.
#[derive(Debug, Default)]
pub struct ExportTracker {
    status: Mutex<ExportStatus>,
}

impl ExportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ExportStatus {
        self.status.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.status.lock().is_busy()
    }

    /// Claims the tracker for one export, or fails with `Busy`.
    pub fn try_begin(self: &Arc<Self>, mode: ExportMode) -> Result<ExportRun, ExportError> {
        let mut status = self.status.lock();
        if status.is_busy() {
            return Err(ExportError::Busy);
        }

        status.phase = ExportPhase::Collecting;
        status.signal = StatusSignal::Busy;
        status.mode = Some(mode);
        status.updated_at = Utc::now();

        Ok(ExportRun {
            tracker: Arc::clone(self),
            finished: false,
        })
    }

    fn update(&self, f: impl FnOnce(&mut ExportStatus)) {
        let mut status = self.status.lock();
        f(&mut status);
        status.updated_at = Utc::now();
    }
}

/// A claimed export. Dropping it without finishing returns the tracker to idle.
#[derive(Debug)]
pub struct ExportRun {
    tracker: Arc<ExportTracker>,
    finished: bool,
}

impl ExportRun {
    fn advance(&self, phase: ExportPhase) {
        self.tracker.update(|status| status.phase = phase);
    }

    fn finish(mut self, outcome: ExportOutcome) {
        let signal = match outcome {
            ExportOutcome::Failed { .. } => StatusSignal::Error,
            _ => StatusSignal::Idle,
        };
        self.tracker.update(|status| {
            status.phase = ExportPhase::Idle;
            status.signal = signal;
            status.last_outcome = Some(outcome);
        });
        self.finished = true;
    }

    fn fail(self, err: &ExportError) {
        let outcome = match err {
            ExportError::Discarded => ExportOutcome::Discarded,
            other => ExportOutcome::Failed { message: other.to_string() },
        };
        self.finish(outcome);
    }
}

impl Drop for ExportRun {
    fn drop(&mut self) {
        if !self.finished {
            self.tracker.update(|status| {
                status.phase = ExportPhase::Idle;
                status.signal = StatusSignal::Idle;
            });
        }
    }
}

pub struct ExportCoordinator<R, T>
where
    R: RenditionSource,
    T: SaveTarget,
{
    pub rendition_source: R,
    pub save_target: T,
    archive_name: String,
}

impl<R, T> ExportCoordinator<R, T>
where
    R: RenditionSource,
    T: SaveTarget,
{
    pub fn new(rendition_source: R, save_target: T, archive_name: impl Into<String>) -> Self {
        ExportCoordinator {
            rendition_source,
            save_target,
            archive_name: archive_name.into(),
        }
    }

    /// Fetches one rendition and saves it under its derived file name.
    pub async fn download_single<L>(
        &self,
        tracker: &Arc<ExportTracker>,
        record: &ImageRecord,
        descriptor: &TransformationDescriptor,
        is_live: L,
    ) -> Result<ExportReport, ExportError>
    where
        L: Fn() -> bool,
    {
        let run = tracker.try_begin(ExportMode::Single)?;

        let bytes = match self.rendition_source.fetch_rendition(record, descriptor).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(record_id = %record.id, "Single download failed: {}", e);
                let err = into_download_failure(e);
                run.fail(&err);
                return Err(err);
            }
        };

        if !is_live() {
            run.fail(&ExportError::Discarded);
            return Err(ExportError::Discarded);
        }

        run.advance(ExportPhase::Saving);
        let file_name = rendition_file_name(record, descriptor);
        let file = SavedFile {
            file_name: file_name.clone(),
            content_type: descriptor.output_format.content_type().to_string(),
            bytes,
        };

        let ticket = match self.save_target.save(file) {
            Ok(ticket) => ticket,
            Err(e) => {
                let err = ExportError::DownloadFailed(e.to_string());
                run.fail(&err);
                return Err(err);
            }
        };

        run.finish(ExportOutcome::Completed {
            file_name: file_name.clone(),
            items: 1,
        });
        tracing::info!(record_id = %record.id, %file_name, "Prepared single download");

        Ok(ExportReport {
            mode: ExportMode::Single,
            ticket: Some(ticket),
            file_name: Some(file_name),
            succeeded: 1,
            failed: 0,
            failures: Vec::new(),
        })
    }

    /// Fetches every record concurrently, archives the successes and saves
    /// the archive. Failed records are skipped and reported.
    pub async fn export_batch<L>(
        &self,
        tracker: &Arc<ExportTracker>,
        records: &[ImageRecord],
        descriptor: &TransformationDescriptor,
        is_live: L,
    ) -> Result<ExportReport, ExportError>
    where
        L: Fn() -> bool,
    {
        if records.is_empty() {
            return Ok(ExportReport::empty(ExportMode::Batch));
        }

        let run = tracker.try_begin(ExportMode::Batch)?;
        let width = index_width(records.len());

        let fetches = records.iter().map(|record| async move {
            let result = self.rendition_source.fetch_rendition(record, descriptor).await;
            (record, result)
        });
        let settled = join_all(fetches).await;

        if !is_live() {
            tracing::info!("Session changed during batch export; discarding results");
            run.fail(&ExportError::Discarded);
            return Err(ExportError::Discarded);
        }

        let mut job = ArchiveJob::new();
        let mut failures = Vec::new();
        for (index, (record, result)) in settled.into_iter().enumerate() {
            match result {
                Ok(bytes) => job.push(archive_entry_name(index + 1, width, record, descriptor), bytes),
                Err(e) => {
                    tracing::warn!(record_id = %record.id, "Rendition failed: {}", e);
                    failures.push(FailedRendition {
                        record_id: record.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let succeeded = job.len();
        let failed = failures.len();

        if job.is_empty() {
            let err = ExportError::DownloadFailed(format!("all {} renditions failed", failed));
            run.fail(&err);
            return Err(err);
        }

        run.advance(ExportPhase::Archiving);
        let bytes = match tokio::task::spawn_blocking(move || write_zip(job)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => {
                tracing::error!("Archive creation failed: {}", err);
                run.fail(&err);
                return Err(err);
            }
            Err(join_err) => {
                let err = ExportError::ArchiveCreationFailed(join_err.to_string());
                tracing::error!("Archive task failed: {}", join_err);
                run.fail(&err);
                return Err(err);
            }
        };

        if !is_live() {
            run.fail(&ExportError::Discarded);
            return Err(ExportError::Discarded);
        }

        run.advance(ExportPhase::Saving);
        let archive = SavedFile {
            file_name: self.archive_name.clone(),
            content_type: ARCHIVE_CONTENT_TYPE.to_string(),
            bytes,
        };

        let ticket = match self.save_target.save(archive) {
            Ok(ticket) => ticket,
            Err(e) => {
                let err = ExportError::ArchiveCreationFailed(e.to_string());
                run.fail(&err);
                return Err(err);
            }
        };

        let file_name = self.archive_name.clone();
        let outcome = if failed > 0 {
            ExportOutcome::PartialBatchFailure {
                file_name: file_name.clone(),
                succeeded,
                failed,
            }
        } else {
            ExportOutcome::Completed {
                file_name: file_name.clone(),
                items: succeeded,
            }
        };
        run.finish(outcome);

        tracing::info!(succeeded, failed, "Prepared batch archive");

        Ok(ExportReport {
            mode: ExportMode::Batch,
            ticket: Some(ticket),
            file_name: Some(file_name),
            succeeded,
            failed,
            failures,
        })
    }
}

fn into_download_failure(err: ExportError) -> ExportError {
    match err {
        ExportError::DownloadFailed(_) => err,
        other => ExportError::DownloadFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use zip::ZipArchive;

    use super::*;
    use crate::{
        entities::transformation::OutputFormat,
        repositories::downloads::DownloadSlots,
    };

    mock! {
        pub Source {}

        #[async_trait]
        impl RenditionSource for Source {
            async fn fetch_rendition(
                &self,
                record: &ImageRecord,
                descriptor: &TransformationDescriptor,
            ) -> Result<Vec<u8>, ExportError>;
        }
    }

    fn record(id: &str, name: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            source_url: format!("https://cdn.example.com/{id}.png"),
            original_name: name.to_string(),
            natural_width: None,
            natural_height: None,
            uploaded_at: Utc::now(),
        }
    }

    fn descriptor() -> TransformationDescriptor {
        TransformationDescriptor {
            target_width: Some(100),
            target_height: Some(50),
            output_format: OutputFormat::Png,
            ..TransformationDescriptor::default()
        }
    }

    fn coordinator(source: MockSource) -> ExportCoordinator<MockSource, DownloadSlots> {
        ExportCoordinator::new(source, DownloadSlots::new(8), "images.zip")
    }

    fn failing_for(ids: &'static [&'static str]) -> MockSource {
        let mut source = MockSource::new();
        source.expect_fetch_rendition().returning(move |record, _| {
            if ids.contains(&record.id.as_str()) {
                Err(ExportError::DownloadFailed(format!("{}: 500", record.id)))
            } else {
                Ok(format!("bytes of {}", record.id).into_bytes())
            }
        });
        source
    }

    fn archive_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn batch_skips_failed_records_and_reports_them() {
        let coordinator = coordinator(failing_for(&["b"]));
        let tracker = Arc::new(ExportTracker::new());
        let records = vec![record("a", "Same Name"), record("b", "other"), record("c", "same-name")];

        let report = coordinator
            .export_batch(&tracker, &records, &descriptor(), || true)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(report.is_partial());
        assert_eq!(report.failures[0].record_id, "b");

        let archive = coordinator.save_target.take(&report.ticket.unwrap()).unwrap();
        assert_eq!(archive.file_name, "images.zip");
        let names = archive_names(archive.bytes);
        assert_eq!(names, ["001-same-name-100x50.png", "003-same-name-100x50.png"]);

        let status = tracker.status();
        assert_eq!(status.phase, ExportPhase::Idle);
        assert_eq!(
            status.last_outcome,
            Some(ExportOutcome::PartialBatchFailure {
                file_name: "images.zip".into(),
                succeeded: 2,
                failed: 1
            })
        );
    }

    /// Every fetch parks until all of them have started.
    struct RendezvousSource {
        barrier: tokio::sync::Barrier,
    }

    #[async_trait]
    impl RenditionSource for RendezvousSource {
        async fn fetch_rendition(
            &self,
            record: &ImageRecord,
            _descriptor: &TransformationDescriptor,
        ) -> Result<Vec<u8>, ExportError> {
            self.barrier.wait().await;
            Ok(record.id.clone().into_bytes())
        }
    }

    #[tokio::test]
    async fn batch_fetches_run_concurrently() {
        let records = vec![record("a", "a"), record("b", "b"), record("c", "c")];
        let coordinator = ExportCoordinator::new(
            RendezvousSource {
                barrier: tokio::sync::Barrier::new(records.len()),
            },
            DownloadSlots::new(8),
            "images.zip",
        );
        let tracker = Arc::new(ExportTracker::new());

        let report = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            coordinator.export_batch(&tracker, &records, &descriptor(), || true),
        )
        .await
        .expect("fetches were not all in flight at once")
        .unwrap();

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let mut source = MockSource::new();
        source.expect_fetch_rendition().never();
        let coordinator = coordinator(source);
        let tracker = Arc::new(ExportTracker::new());

        let report = coordinator
            .export_batch(&tracker, &[], &descriptor(), || true)
            .await
            .unwrap();

        assert_eq!(report, ExportReport::empty(ExportMode::Batch));
        assert_eq!(coordinator.save_target.pending(), 0);
        assert_eq!(tracker.status().last_outcome, None);
    }

    #[tokio::test]
    async fn batch_where_everything_fails_saves_nothing() {
        let coordinator = coordinator(failing_for(&["a", "b"]));
        let tracker = Arc::new(ExportTracker::new());

        let err = coordinator
            .export_batch(&tracker, &[record("a", "a"), record("b", "b")], &descriptor(), || true)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::DownloadFailed(_)));
        assert_eq!(coordinator.save_target.pending(), 0);
        assert_eq!(tracker.status().signal, StatusSignal::Error);
    }

    #[tokio::test]
    async fn stale_session_discards_results() {
        let coordinator = coordinator(failing_for(&[]));
        let tracker = Arc::new(ExportTracker::new());

        let err = coordinator
            .export_batch(&tracker, &[record("a", "a")], &descriptor(), || false)
            .await
            .unwrap_err();

        assert_eq!(err, ExportError::Discarded);
        assert_eq!(coordinator.save_target.pending(), 0);
        assert_eq!(tracker.status().last_outcome, Some(ExportOutcome::Discarded));
        assert!(!tracker.is_busy());
    }

    #[tokio::test]
    async fn second_export_is_rejected_while_busy() {
        let coordinator = coordinator(failing_for(&[]));
        let tracker = Arc::new(ExportTracker::new());
        let _claimed = tracker.try_begin(ExportMode::Batch).unwrap();

        let err = coordinator
            .download_single(&tracker, &record("a", "a"), &descriptor(), || true)
            .await
            .unwrap_err();

        assert_eq!(err, ExportError::Busy);
    }

    #[tokio::test]
    async fn tracker_returns_to_idle_when_run_is_dropped() {
        let tracker = Arc::new(ExportTracker::new());
        {
            let _run = tracker.try_begin(ExportMode::Single).unwrap();
            assert!(tracker.is_busy());
        }
        assert!(!tracker.is_busy());
        assert!(tracker.try_begin(ExportMode::Batch).is_ok());
    }

    #[tokio::test]
    async fn single_download_uses_derived_file_name() {
        let coordinator = coordinator(failing_for(&[]));
        let tracker = Arc::new(ExportTracker::new());

        let report = coordinator
            .download_single(&tracker, &record("uploads/x", "Beach Day.jpg"), &descriptor(), || true)
            .await
            .unwrap();

        assert_eq!(report.file_name.as_deref(), Some("beach-day-100x50.png"));
        let file = coordinator.save_target.take(&report.ticket.unwrap()).unwrap();
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.bytes, b"bytes of uploads/x");
    }

    #[tokio::test]
    async fn single_download_failure_is_reported() {
        let coordinator = coordinator(failing_for(&["a"]));
        let tracker = Arc::new(ExportTracker::new());

        let err = coordinator
            .download_single(&tracker, &record("a", "a"), &descriptor(), || true)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::DownloadFailed(_)));
        let status = tracker.status();
        assert_eq!(status.signal, StatusSignal::Error);
        assert!(matches!(status.last_outcome, Some(ExportOutcome::Failed { .. })));
    }
}
