use crate::config::{DocumentConfig, SyncConfig};
use crate::error::{AppError, Result};
use crate::sheets::{Authorizer, SheetSession};
use crate::sync::merge::{MergeStats, merge_into_file};
use indicatif::ProgressStyle;
use tracing::{Span, info, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Receives per-document progress from the sync loop.
pub trait ProgressSink {
    fn start(&self, total: usize) -> Result<()>;

    fn set_label(&self, label: &str);

    fn advance(&self);
}

/// Progress bar attached to the current tracing span.
pub struct SpanProgress;

impl ProgressSink for SpanProgress {
    fn start(&self, total: usize) -> Result<()> {
        let span = Span::current();
        span.pb_set_style(
            &ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .map_err(|e| AppError::Other(e.into()))?,
        );
        span.pb_set_length(total as u64);
        Ok(())
    }

    fn set_label(&self, label: &str) {
        Span::current().pb_set_message(label);
    }

    fn advance(&self) {
        Span::current().pb_inc(1);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub documents: usize,
    pub updated_records: usize,
}

pub struct SyncEngine<A: Authorizer> {
    config: SyncConfig,
    session: SheetSession<A>,
}

impl<A: Authorizer> SyncEngine<A> {
    pub fn new(config: SyncConfig, session: SheetSession<A>) -> Self {
        Self { config, session }
    }

    /// Fetch every configured document and merge it into its record file.
    ///
    /// `only` restricts the run to the named documents when non-empty. The
    /// first failure stops the run.
    #[instrument(name = "Sync", skip_all)]
    pub async fn sync<P: ProgressSink>(&self, only: &[String], progress: &P) -> Result<SyncReport> {
        let documents: Vec<&DocumentConfig> = self
            .config
            .documents
            .iter()
            .filter(|doc| only.is_empty() || only.contains(&doc.name))
            .collect();

        if documents.is_empty() {
            return Err(AppError::Config(
                "No documents configured for sync".to_string(),
            ));
        }

        progress.start(documents.len())?;

        let mut report = SyncReport::default();
        for doc in documents {
            progress.set_label(&doc.name);
            let stats = self.sync_document(doc).await?;
            report.documents += 1;
            report.updated_records += stats.updated_records;
            progress.advance();
        }

        Ok(report)
    }

    #[instrument(name = "Syncing document", skip_all, fields(document = %doc.name))]
    async fn sync_document(&self, doc: &DocumentConfig) -> Result<MergeStats> {
        let id = match &doc.id {
            Some(id) => id.clone(),
            None => {
                self.session
                    .find_document(&doc.name, self.config.drive_folder.as_deref())
                    .await?
            }
        };

        self.session.open_document(&id).await?;
        let table = self.session.get_sheet(doc.sheet).await?;

        let record_path = self.config.record_dir.join(&doc.name);
        let stats = merge_into_file(&table, &record_path)?;

        info!(
            rows = stats.rows,
            skipped = stats.skipped_rows,
            updated = stats.updated_records,
            "Document synced"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod mocks {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingProgress {
        pub events: Mutex<Vec<String>>,
    }

    impl ProgressSink for RecordingProgress {
        fn start(&self, total: usize) -> Result<()> {
            self.events.lock().unwrap().push(format!("start:{total}"));
            Ok(())
        }

        fn set_label(&self, label: &str) {
            self.events.lock().unwrap().push(format!("label:{label}"));
        }

        fn advance(&self) {
            self.events.lock().unwrap().push("advance".to_string());
        }
    }
}
