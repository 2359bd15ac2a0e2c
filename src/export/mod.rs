//! The export pipeline: classifier → schema collector → row materializer
//! → CSV writer, run as a cancellable [`ExportJob`].

pub mod classify;
pub mod csv;
pub mod job;
pub mod progress;
pub mod row;
pub mod schema;

pub use crate::error::ExportError;
pub use classify::is_exportable;
pub use self::csv::{CsvFlavor, MatrixWriter};
pub use job::{copy_export, ExportJob, ExportOptions, ExportSummary};
pub use progress::{CancellationToken, JobEvent, NullSink, ProgressSink};
pub use row::{materialize_row, DuplicatePolicy, ExportRow};
pub use schema::{collect_schema, Schema};
