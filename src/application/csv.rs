//! Delimited-text output for downloads.
//!
//! Quoting follows RFC 4180: a field containing the delimiter, a double quote,
//! CR or LF is wrapped in double quotes and inner quotes are doubled. Nothing
//! else is rewritten, so every exported value parses back unchanged.

pub const DELIMITER: char = ',';

/// Escape a single field for CSV output.
pub fn escape_csv_field(field: &str) -> String {
    let needs_quoting = field.contains(DELIMITER)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r');

    if needs_quoting {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Accumulates rows into one CSV document.
#[derive(Debug, Default)]
pub struct CsvDocument {
    buf: String,
}

impl CsvDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row<S: AsRef<str>>(&mut self, fields: &[S]) -> &mut Self {
        let line = fields
            .iter()
            .map(|f| escape_csv_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(&DELIMITER.to_string());
        self.buf.push_str(&line);
        self.buf.push('\n');
        self
    }

    pub fn blank_row(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Literal single-cell row naming the section that follows.
    pub fn section_header(&mut self, title: &str) -> &mut Self {
        self.row(&[title])
    }

    pub fn append(&mut self, other: CsvDocument) -> &mut Self {
        self.buf.push_str(&other.buf);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
