use std::io::Write;

use serde::{Deserialize, Serialize};

use super::row::ExportRow;
use super::schema::Schema;
use crate::error::ExportError;

pub const DELIMITER: u8 = b';';
pub const FIXED_HEADER: [&str; 3] = ["Name", "Type", "Details"];

/// UTF-8 byte order mark; spreadsheet tools need it to detect the encoding.
pub const BOM: &str = "\u{feff}";

const LINE_BREAK: &str = "\r\n";

/// Output dialect of the parameter matrix. Both start with a UTF-8 BOM.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum CsvFlavor {
    /// Standard quoting for values containing `;`, quotes or line breaks;
    /// every record ends with CRLF.
    #[default]
    Quoted,
    /// Raw values, no header line break, every row prefixed by CRLF.
    Legacy,
}

/// Writes the header and rows of a parameter matrix. Every field, the
/// last one included, is terminated by `;`.
pub enum MatrixWriter<W: Write> {
    Quoted(csv::Writer<W>),
    Legacy(W),
}

impl<W: Write> MatrixWriter<W> {
    /// Writes the BOM straight away, ahead of anything the CSV layer buffers.
    pub fn new(mut inner: W, flavor: CsvFlavor) -> Result<Self, ExportError> {
        inner.write_all(BOM.as_bytes())?;
        Ok(match flavor {
            CsvFlavor::Quoted => Self::Quoted(
                csv::WriterBuilder::new()
                    .delimiter(DELIMITER)
                    .terminator(csv::Terminator::CRLF)
                    .flexible(true)
                    .from_writer(inner),
            ),
            CsvFlavor::Legacy => Self::Legacy(inner),
        })
    }

    pub fn write_header(&mut self, schema: &Schema) -> Result<(), ExportError> {
        let fields = FIXED_HEADER.into_iter().chain(schema.columns());
        match self {
            Self::Quoted(writer) => write_terminated(writer, fields),
            Self::Legacy(writer) => {
                for field in fields {
                    write!(writer, "{field};")?;
                }
                Ok(())
            }
        }
    }

    pub fn write_row(&mut self, row: &ExportRow) -> Result<(), ExportError> {
        match self {
            Self::Quoted(writer) => write_terminated(writer, row.fields()),
            Self::Legacy(writer) => {
                writer.write_all(LINE_BREAK.as_bytes())?;
                for field in row.fields() {
                    write!(writer, "{field};")?;
                }
                Ok(())
            }
        }
    }

    /// Flushes buffered output and hands back the underlying writer.
    pub fn finish(self) -> Result<W, ExportError> {
        match self {
            Self::Quoted(writer) => writer
                .into_inner()
                .map_err(|e| ExportError::from(e.into_error())),
            Self::Legacy(mut writer) => {
                writer.flush()?;
                Ok(writer)
            }
        }
    }
}

/// The trailing empty field turns the last delimiter into a terminator.
fn write_terminated<'a, W: Write>(
    writer: &mut csv::Writer<W>,
    fields: impl Iterator<Item = &'a str>,
) -> Result<(), ExportError> {
    writer.write_record(fields.chain(std::iter::once("")))?;
    Ok(())
}
