use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::classify::is_exportable;
use super::csv::{CsvFlavor, MatrixWriter};
use super::progress::{CancellationToken, Pass, ProgressReporter, ProgressSink};
use super::row::{materialize_row, DuplicatePolicy};
use super::schema::{collect_schema, Schema};
use crate::error::ExportError;
use crate::model::Element;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub flavor: CsvFlavor,
    pub duplicates: DuplicatePolicy,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    /// Elements rejected by the classifier.
    pub skipped: usize,
}

/// One export run: classify, collect the schema, write the matrix.
///
/// The matrix is written to `<file>.partial` next to the target and only
/// renamed onto it after the last row is flushed. Cancellation or any
/// error removes the partial file, so a file at the target path always
/// comes from a completed run.
#[derive(Debug, Clone)]
pub struct ExportJob {
    output: PathBuf,
    options: ExportOptions,
    token: CancellationToken,
}

impl ExportJob {
    #[must_use]
    pub fn new(output: impl Into<PathBuf>, token: CancellationToken) -> Self {
        Self {
            output: output.into(),
            options: ExportOptions::default(),
            token,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn run(
        &self,
        elements: &[Element],
        sink: &dyn ProgressSink,
    ) -> Result<ExportSummary, ExportError> {
        let span = tracing::info_span!("export", output = %self.output.display());
        let _guard = span.enter();

        let exportable: Vec<&Element> = elements.iter().filter(|e| is_exportable(e)).collect();
        let total = exportable.len();
        let skipped = elements.len() - total;
        tracing::info!(total, skipped, "export started");

        let mut reporter = ProgressReporter::new(sink, &self.token);
        let schema = collect_schema(&exportable, &mut reporter).inspect_err(log_abort)?;

        remove_stale(&self.output)?;
        let partial = PartialFile::create(&self.output)?;
        let file = partial.open()?;
        let mut writer = MatrixWriter::new(BufWriter::new(file), self.options.flavor)?;

        write_matrix(
            &mut writer,
            &schema,
            &exportable,
            &mut reporter,
            self.options.duplicates,
        )
        .inspect_err(log_abort)?;

        let file = writer.finish()?.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        partial.commit()?;

        reporter.report(100, &format!("Export ready at: {}", self.output.display()));
        tracing::info!(rows = total, columns = schema.len(), "export finished");

        Ok(ExportSummary {
            path: self.output.clone(),
            rows: total,
            columns: schema.len(),
            skipped,
        })
    }
}

/// Second pass: header, then one row per element with progress in 50–100.
fn write_matrix<W: Write>(
    writer: &mut MatrixWriter<W>,
    schema: &Schema,
    elements: &[&Element],
    reporter: &mut ProgressReporter<'_>,
    duplicates: DuplicatePolicy,
) -> Result<(), ExportError> {
    let total = elements.len();
    writer.write_header(schema)?;
    for (count, element) in elements.iter().enumerate() {
        reporter.checkpoint(Pass::WriteData, count, total)?;
        let row = materialize_row(element, schema, duplicates)?;
        writer.write_row(&row)?;
    }
    Ok(())
}

fn log_abort(err: &ExportError) {
    if err.is_cancelled() {
        tracing::warn!("export cancelled by user");
    } else {
        tracing::error!(error = %err, "export failed");
    }
}

fn remove_stale(path: &Path) -> Result<(), ExportError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed previous export");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ExportError::FileCreate {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Sibling file that becomes the target on commit and is removed otherwise.
struct PartialFile {
    target: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn create(target: &Path) -> Result<Self, ExportError> {
        let mut name = target.file_name().unwrap_or_default().to_os_string();
        name.push(".partial");
        let path = target.with_file_name(name);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ExportError::FileCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Ok(Self {
            target: target.to_path_buf(),
            path,
            committed: false,
        })
    }

    fn open(&self) -> Result<File, ExportError> {
        File::create(&self.path).map_err(|source| ExportError::FileCreate {
            path: self.path.clone(),
            source,
        })
    }

    fn commit(mut self) -> Result<(), ExportError> {
        fs::rename(&self.path, &self.target).map_err(|source| ExportError::Commit {
            path: self.target.clone(),
            source,
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "could not remove partial export");
            }
        }
    }
}

/// Copies a finished export to `destination`, replacing an existing file.
pub fn copy_export(from: &Path, destination: &Path) -> Result<u64, ExportError> {
    let bytes = fs::copy(from, destination).map_err(|source| ExportError::Copy {
        path: destination.to_path_buf(),
        source,
    })?;
    tracing::info!(destination = %destination.display(), bytes, "export copied");
    Ok(bytes)
}
