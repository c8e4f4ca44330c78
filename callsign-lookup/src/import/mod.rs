//! Bulk roster import
//!
//! Replaces the whole member directory with the contents of an uploaded CSV
//! roster:
//!
//! 1. Snapshot every stored callsign (the reconciliation index)
//! 2. Read the header row and resolve column offsets
//! 3. Stream data rows: normalize, drop in-batch duplicates, classify as
//!    added or updated, and queue each member on the write pool
//! 4. Close the queue and wait for every writer
//! 5. Delete every stored callsign the upload did not mention
//!
//! Row problems and individual write failures are reported and skipped.
//! Only CSV read errors and store-level failures (scan, bulk delete) abort
//! the import. Writes already applied are not rolled back.
//!
//! # Example
//! ```rust,ignore
//! let importer = Importer::new(store, ImportConfig::default());
//! let summary = importer.run(std::io::Cursor::new(csv_bytes)).await?;
//! println!("{}", summary);
//! ```

pub mod columns;
pub mod reconcile;
pub mod rows;
pub mod writer;

use callsign_common::config::ImportSettings;
use callsign_common::{MemberStore, StoreError};
use csv::ByteRecord;
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use columns::{ColumnMap, Field};
pub use reconcile::{BatchTracker, ReconciliationIndex, RowClass};
pub use rows::{parse_row, ParsedRow, RowDiagnostic, RowError};
pub use writer::{WriteFailure, WritePool};

/// Importer sizing, passed explicitly per import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportConfig {
    /// Concurrent store writers
    pub writers: usize,
    /// Bounded queue capacity between the CSV reader and the writers
    pub queue_capacity: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::from(&ImportSettings::default())
    }
}

impl From<&ImportSettings> for ImportConfig {
    fn from(settings: &ImportSettings) -> Self {
        Self {
            writers: settings.writers,
            queue_capacity: settings.queue_capacity,
        }
    }
}

/// Fatal import errors; everything else is reported and skipped
#[derive(Debug, Error)]
pub enum ImportError {
    /// CSV stream could not be read
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    /// Upload has no header row
    #[error("CSV file is empty (no header row)")]
    MissingHeader,

    /// Key scan or bulk delete failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Every writer exited while rows were still being queued
    #[error("Write queue closed unexpectedly")]
    WritersStopped,

    /// A writer task panicked
    #[error("Writer task failed: {0}")]
    WriterPanicked(String),

    /// Import was cancelled after a fatal error
    #[error("Import cancelled")]
    Cancelled,
}

/// Progress reported while an import runs, in the order it happens
#[derive(Debug)]
pub enum ImportEvent {
    /// Row accepted with a callsign not previously stored
    Adding(String),
    /// Non-fatal problem in an accepted row
    Diagnostic(RowDiagnostic),
    /// Row skipped
    RowRejected(RowError),
    /// Store rejected a write
    WriteFailed(WriteFailure),
    /// Stored callsign absent from the upload; about to be deleted
    Deleting(String),
    /// Import completed
    Finished(ImportSummary),
    /// Import stopped on a fatal error; no further events follow
    Aborted(String),
}

/// Final tally of an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Callsigns seen more than once in the upload, sorted
    pub duplicates: Vec<String>,
    /// Rows skipped for a missing callsign or short row
    pub rejected: usize,
    /// Writes the store refused
    pub write_failures: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Added {}, updated {}, deleted {}.",
            self.added, self.updated, self.deleted
        )
    }
}

/// Full-replace roster importer
pub struct Importer {
    store: Arc<dyn MemberStore>,
    config: ImportConfig,
    event_tx: Option<mpsc::Sender<ImportEvent>>,
}

impl Importer {
    pub fn new(store: Arc<dyn MemberStore>, config: ImportConfig) -> Self {
        Self {
            store,
            config,
            event_tx: None,
        }
    }

    /// Create an importer that reports progress on `event_tx`
    pub fn with_events(
        store: Arc<dyn MemberStore>,
        config: ImportConfig,
        event_tx: mpsc::Sender<ImportEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_tx: Some(event_tx),
        }
    }

    /// Snapshot existing keys and read the header row
    ///
    /// Nothing has been written when this returns, so callers can still turn
    /// an error here into a plain failure response.
    pub async fn prepare<R: Read>(self, input: R) -> Result<PreparedImport<R>, ImportError> {
        debug!("Reading all member keys");
        let index = ReconciliationIndex::snapshot(self.store.as_ref()).await?;
        debug!(existing = index.len(), "Keys all read");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let mut header = ByteRecord::new();
        if !reader.read_byte_record(&mut header)? {
            return Err(ImportError::MissingHeader);
        }
        let columns = ColumnMap::from_header(header.iter().map(String::from_utf8_lossy));
        if !columns.is_mapped(Field::Call) {
            warn!("Upload header has no CALL column; every row will be rejected");
        }
        let unmapped = columns.unmapped();
        if !unmapped.is_empty() {
            debug!(?unmapped, "Header columns not present; fields read as empty");
        }

        Ok(PreparedImport {
            importer: self,
            index,
            columns,
            reader,
        })
    }

    /// Prepare and run in one step
    pub async fn run<R: Read>(self, input: R) -> Result<ImportSummary, ImportError> {
        self.prepare(input).await?.run().await
    }

    async fn emit_event(&self, event: ImportEvent) {
        if let Some(tx) = &self.event_tx {
            // A closed receiver means the client went away; the import still finishes
            if tx.send(event).await.is_err() {
                debug!("Import event receiver dropped");
            }
        }
    }
}

/// Import with its index snapshot and header already read
pub struct PreparedImport<R> {
    importer: Importer,
    index: ReconciliationIndex,
    columns: ColumnMap,
    reader: csv::Reader<R>,
}

impl<R: Read> PreparedImport<R> {
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Number of members stored before the upload
    pub fn existing_count(&self) -> usize {
        self.index.len()
    }

    /// Stream the data rows through the write pool and reconcile
    pub async fn run(self) -> Result<ImportSummary, ImportError> {
        let PreparedImport {
            importer,
            index,
            columns,
            mut reader,
        } = self;

        match run_rows(&importer, index, &columns, &mut reader).await {
            Ok(summary) => {
                info!(
                    added = summary.added,
                    updated = summary.updated,
                    deleted = summary.deleted,
                    duplicates = summary.duplicates.len(),
                    rejected = summary.rejected,
                    write_failures = summary.write_failures,
                    "Import complete"
                );
                importer
                    .emit_event(ImportEvent::Finished(summary.clone()))
                    .await;
                Ok(summary)
            }
            Err(e) => {
                error!("Import aborted: {}", e);
                importer.emit_event(ImportEvent::Aborted(e.to_string())).await;
                Err(e)
            }
        }
    }
}

async fn run_rows<R: Read>(
    importer: &Importer,
    mut index: ReconciliationIndex,
    columns: &ColumnMap,
    reader: &mut csv::Reader<R>,
) -> Result<ImportSummary, ImportError> {
    let cancel = CancellationToken::new();

    debug!(writers = importer.config.writers, "Starting writers");
    let pool = WritePool::spawn(
        Arc::clone(&importer.store),
        importer.config.writers,
        importer.config.queue_capacity,
        cancel.clone(),
    );

    let mut summary = ImportSummary::default();
    let mut tracker = BatchTracker::new();
    let mut record = ByteRecord::new();

    debug!("Begin writing");
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                pool.abort().await;
                return Err(e.into());
            }
        }

        let parsed = match parse_row(columns, &record) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Rejected row: {}", e);
                summary.rejected += 1;
                importer.emit_event(ImportEvent::RowRejected(e)).await;
                continue;
            }
        };

        for diagnostic in parsed.diagnostics {
            warn!("{}", diagnostic);
            importer
                .emit_event(ImportEvent::Diagnostic(diagnostic))
                .await;
        }

        let member = parsed.member;
        match tracker.classify(&member.callsign, &mut index) {
            RowClass::Duplicate => {
                debug!(callsign = %member.callsign, "Skipping duplicate");
                continue;
            }
            RowClass::Added => {
                summary.added += 1;
                importer
                    .emit_event(ImportEvent::Adding(member.callsign.clone()))
                    .await;
            }
            RowClass::Updated => summary.updated += 1,
        }

        if let Err(e) = pool.submit(member).await {
            pool.abort().await;
            return Err(e);
        }
    }

    debug!("Closing write queue, waiting for results");
    let failures = pool.finish().await?;
    summary.write_failures = failures.len();
    for failure in failures {
        importer.emit_event(ImportEvent::WriteFailed(failure)).await;
    }

    debug!("Deleting stale keys");
    let stale = index.into_stale();
    for callsign in &stale {
        importer
            .emit_event(ImportEvent::Deleting(callsign.clone()))
            .await;
    }
    importer.store.delete_multi(&stale).await?;

    summary.deleted = stale.len();
    summary.duplicates = tracker.into_duplicates();
    Ok(summary)
}
