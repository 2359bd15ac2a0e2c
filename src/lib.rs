//! # DatenExport
//!
//! Exports the parameters of every model element in a building model to a
//! `;`-separated CSV matrix: one row per element, one column per distinct
//! parameter name.
//!
//! ## Features
//!
//! - Parse IFC files (IFC2x3 and IFC4 schemas) into elements with parameters
//! - Keep only model elements (no annotations, view-specific or zone elements)
//! - Two-pass export with progress reporting and cooperative cancellation
//! - Terminal status window, or a console progress bar for headless runs
//!
//! ## Example
//!
//! ```no_run
//! use daten_export::export::{CancellationToken, ExportJob, NullSink};
//! use daten_export::parser::parse_ifc_file;
//!
//! let model = parse_ifc_file("model.ifc").expect("Failed to parse");
//! let job = ExportJob::new("revitExport.csv", CancellationToken::new());
//! let summary = job.run(&model.elements, &NullSink).expect("Export failed");
//! println!("{} rows, {} columns", summary.rows, summary.columns);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod parser;
pub mod ui;
