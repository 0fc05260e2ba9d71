//! CSV Transform Engine
//!
//! Drives one import or export call over a file:
//!
//! ```text
//! export: Collection ─batches─▶ to_row ─hook─▶ CsvSink ─▶ file
//! import: file ─▶ CsvSource ─rows─▶ to_attrs ─hook─▶ Collection::create
//! ```
//!
//! Both flows are single pass. Export holds one batch of records at a time,
//! import holds one row at a time. The file handle belongs to the flow and is
//! released when the flow returns, whether it finished or failed.

use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::options::CsvOptions;
use super::row::{ExportHook, ImportHook, Outcome, Row};
use crate::error::{CsvError, CsvResult, TransformError, TransformResult};
use crate::mapping::columns::Column;
use crate::models::{Attributes, Record};
use crate::store::{Collection, Criteria};

// =============================================================================
// Summaries
// =============================================================================

/// Result of an import call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Data rows read from the file
    pub rows: usize,
    /// Records created
    pub created: usize,
    /// Rows the hook skipped
    pub skipped: usize,
}

impl ImportSummary {
    pub fn summary(&self) -> String {
        format!(
            "Imported: {} rows, {} created, {} skipped",
            self.rows, self.created, self.skipped
        )
    }
}

/// Result of an export call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Batches fetched from the collection
    pub batches: usize,
    /// Lines written (header excluded)
    pub written: usize,
    /// Records the hook skipped
    pub skipped: usize,
}

impl ExportSummary {
    pub fn summary(&self) -> String {
        format!(
            "Exported: {} rows in {} batches, {} skipped",
            self.written, self.batches, self.skipped
        )
    }
}

// =============================================================================
// Write flow
// =============================================================================

/// Output side of an export: owns the created file.
pub struct CsvSink {
    path: PathBuf,
    columns: Vec<Column>,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Create or truncate `path`, writing the header line when enabled.
    pub fn create(path: &Path, columns: Vec<Column>, options: &CsvOptions) -> CsvResult<Self> {
        let delimiter = options.delimiter_byte()?;
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(file);

        if options.headers {
            writer.write_record(columns.iter().map(|c| c.label.as_str()))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            writer,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Append one row. Only the sink's columns are written, in order.
    pub fn write_row(&mut self, row: &Row) -> CsvResult<()> {
        self.writer.write_record(
            self.columns
                .iter()
                .map(|c| row.get(&c.field).unwrap_or_default()),
        )?;
        Ok(())
    }

    /// Flush and release the file.
    pub fn close(mut self) -> CsvResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Build the row for a record and run the export hook over it.
pub fn to_row(
    columns: &[Column],
    record: &Record,
    hook: Option<&ExportHook>,
) -> TransformResult<Outcome<Row>> {
    let row = Row::new(
        columns.iter().map(|c| c.field.clone()).collect(),
        columns.iter().map(|c| record.render(&c.field)).collect(),
    );

    match hook {
        None => Ok(Outcome::Emit(row)),
        Some(hook) => hook(row, record)
            .map_err(|e| TransformError::hook(format!("record {}", record.id), e)),
    }
}

/// Export the records selected by `criteria` to `path`.
///
/// The file is closed before any error is returned; lines written before
/// the error stay in the file.
pub fn export_records<C: Collection + ?Sized>(
    path: &Path,
    columns: Vec<Column>,
    options: &CsvOptions,
    collection: &C,
    criteria: &Criteria,
    hook: Option<&ExportHook>,
) -> TransformResult<ExportSummary> {
    let mut sink = CsvSink::create(path, columns, options)?;

    match stream_batches(&mut sink, collection, criteria, hook, options.effective_batch_size()) {
        Ok(summary) => {
            sink.close()?;
            info!(
                path = %path.display(),
                written = summary.written,
                skipped = summary.skipped,
                batches = summary.batches,
                "export finished"
            );
            Ok(summary)
        }
        Err(err) => {
            let sink_path = sink.path.clone();
            if let Err(close_err) = sink.close() {
                warn!(
                    path = %sink_path.display(),
                    error = %close_err,
                    "failed to close export file"
                );
            }
            Err(err)
        }
    }
}

fn stream_batches<C: Collection + ?Sized>(
    sink: &mut CsvSink,
    collection: &C,
    criteria: &Criteria,
    hook: Option<&ExportHook>,
    batch_size: usize,
) -> TransformResult<ExportSummary> {
    let mut summary = ExportSummary::default();

    for batch in collection.batches(criteria, batch_size)? {
        let records = batch?;
        summary.batches += 1;
        debug!(batch = summary.batches, size = records.len(), "exporting batch");

        for record in &records {
            match to_row(sink.columns(), record, hook)? {
                Outcome::Emit(row) => {
                    sink.write_row(&row)?;
                    summary.written += 1;
                }
                Outcome::Skip => summary.skipped += 1,
            }
        }
    }

    Ok(summary)
}

// =============================================================================
// Read flow
// =============================================================================

/// Input side of an import: a lazy, single-pass sequence of rows.
///
/// Iteration stops for good after the first error.
pub struct CsvSource {
    reader: csv::Reader<File>,
    columns: Vec<Column>,
    keys: Vec<String>,
    record: csv::StringRecord,
    finished: bool,
}

impl CsvSource {
    /// Open `path`.
    ///
    /// With headers enabled the first line is consumed and its labels key
    /// every following row. The header may carry columns the mapping does
    /// not read, but every mapped column must appear in it, by label or by
    /// field name. Without headers, rows are keyed by the column labels in
    /// declaration order.
    pub fn open(path: &Path, columns: Vec<Column>, options: &CsvOptions) -> CsvResult<Self> {
        let delimiter = options.delimiter_byte()?;
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut keys: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();
        let mut finished = false;

        if options.headers {
            let mut header = csv::StringRecord::new();
            if reader.read_record(&mut header)? {
                keys = header.iter().map(|h| h.trim().to_string()).collect();
                let missing = columns
                    .iter()
                    .find(|c| !keys.iter().any(|k| *k == c.label || *k == c.field));
                if let Some(column) = missing {
                    return Err(CsvError::MissingColumn {
                        line: line_of(&header),
                        column: column.field.clone(),
                    });
                }
            } else {
                finished = true;
            }
        }

        Ok(Self {
            reader,
            columns,
            keys,
            record: csv::StringRecord::new(),
            finished,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Keys used for every row: the header line, or the column labels.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Iterator for CsvSource {
    type Item = CsvResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                let line = line_of(&self.record);
                if self.record.len() != self.keys.len() {
                    self.finished = true;
                    return Some(Err(CsvError::MalformedRow {
                        line,
                        expected: self.keys.len(),
                        found: self.record.len(),
                    }));
                }
                let values = self.record.iter().map(String::from).collect();
                Some(Ok(Row::new(self.keys.clone(), values).with_line(line)))
            }
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            }
        }
    }
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Build the attributes for a row and run the import hook over them.
///
/// Each column takes the value keyed by its label, else by its field name.
/// A column the row has neither key for is an error.
pub fn to_attrs(
    columns: &[Column],
    row: &Row,
    hook: Option<&ImportHook>,
) -> TransformResult<Outcome<Attributes>> {
    let mut attrs = Attributes::new();
    for column in columns {
        let value = row
            .get(&column.label)
            .or_else(|| row.get(&column.field))
            .ok_or_else(|| CsvError::MissingColumn {
                line: row.line().unwrap_or(0),
                column: column.field.clone(),
            })?;
        attrs.insert(column.field.clone(), Value::String(value.to_string()));
    }

    match hook {
        None => Ok(Outcome::Emit(attrs)),
        Some(hook) => hook(row, attrs).map_err(|e| {
            let at = row
                .line()
                .map(|l| format!("line {}", l))
                .unwrap_or_else(|| "row".to_string());
            TransformError::hook(at, e)
        }),
    }
}

/// Import every row of `path` into `collection`.
///
/// A malformed row, a hook error or a persistence error stops the import;
/// records created before it are kept.
pub fn import_rows<C: Collection + ?Sized>(
    path: &Path,
    columns: Vec<Column>,
    options: &CsvOptions,
    collection: &mut C,
    hook: Option<&ImportHook>,
) -> TransformResult<ImportSummary> {
    let mut source = CsvSource::open(path, columns, options)?;
    let columns = source.columns().to_vec();
    let mut summary = ImportSummary::default();

    for row in source.by_ref() {
        let row = row?;
        summary.rows += 1;

        match to_attrs(&columns, &row, hook)? {
            Outcome::Emit(attrs) => {
                collection.create(attrs)?;
                summary.created += 1;
            }
            Outcome::Skip => summary.skipped += 1,
        }
    }

    info!(
        path = %path.display(),
        rows = summary.rows,
        created = summary.created,
        skipped = summary.skipped,
        "import finished"
    );
    Ok(summary)
}
