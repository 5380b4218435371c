//! Extension-dispatched document loaders
//!
//! Each supported extension maps to a plain loader function. Paginated
//! formats yield one [`Document`] per page, tabular formats one per sheet.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Document;

use super::path::extension_of;

/// Reads a file into logical documents
pub type LoadFn = fn(&Path) -> Result<Vec<Document>>;

/// Strategy map from lowercased extension to loader function
#[derive(Clone)]
pub struct DocumentLoader {
    loaders: BTreeMap<String, LoadFn>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader {
    /// Loader with every format enabled at compile time
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut loader = Self::empty();
        #[cfg(feature = "pdf")]
        loader.register("pdf", load_pdf);
        #[cfg(feature = "xlsx")]
        loader.register("xlsx", load_xlsx);
        loader
    }

    /// Loader without any registered format
    pub fn empty() -> Self {
        Self {
            loaders: BTreeMap::new(),
        }
    }

    /// Register (or replace) the loader for an extension
    pub fn register(&mut self, extension: &str, load: LoadFn) -> &mut Self {
        self.loaders
            .insert(extension.trim_start_matches('.').to_lowercase(), load);
        self
    }

    /// Whether a lowercased extension has a loader
    pub fn supports(&self, extension: &str) -> bool {
        self.loaders.contains_key(extension)
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }

    /// Load a file into documents.
    ///
    /// Either every document is returned or the load fails.
    pub fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let extension = extension_of(path);
        let load = self
            .loaders
            .get(&extension)
            .ok_or_else(|| Error::unsupported(extension.clone()))?;

        let documents = load(path)?;
        tracing::debug!(
            "Loaded {} document(s) from {}",
            documents.len(),
            path.display()
        );
        Ok(documents)
    }
}

/// Normalize ligatures and typographic characters PDF fonts commonly emit
#[cfg(feature = "pdf")]
fn cleanup_pdf_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{2010}', '\u{2011}'], "-")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"");

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One document per page with `source`, `page` (1-based) and `total_pages`
#[cfg(feature = "pdf")]
pub fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    let source = path.to_string_lossy().into_owned();
    let pdf = lopdf::Document::load(path)
        .map_err(|e| Error::file_parse(&source, format!("Failed to load PDF: {}", e)))?;

    let pages = pdf.get_pages();
    let total_pages = pages.len();
    let mut documents = Vec::with_capacity(total_pages);

    for page_number in pages.keys() {
        let text = pdf.extract_text(&[*page_number]).map_err(|e| {
            Error::file_parse(
                &source,
                format!("Failed to extract text from page {}: {}", page_number, e),
            )
        })?;

        documents.push(
            Document::new(cleanup_pdf_text(&text))
                .with_metadata("source", source.clone())
                .with_metadata("page", *page_number)
                .with_metadata("total_pages", total_pages),
        );
    }

    Ok(documents)
}

/// One document per sheet holding at least one data row.
///
/// The text is the sheet as a JSON array of row objects keyed by the
/// header row; metadata is `sheet_name`.
#[cfg(feature = "xlsx")]
pub fn load_xlsx(path: &Path) -> Result<Vec<Document>> {
    use calamine::Reader;

    let source = path.to_string_lossy().into_owned();
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| Error::file_parse(&source, e.to_string()))?;

    let mut documents = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| Error::file_parse(&source, format!("sheet '{}': {}", sheet_name, e)))?;

        let records = sheet_records(range.rows());
        if records.is_empty() {
            tracing::debug!("Skipping empty sheet '{}' in {}", sheet_name, source);
            continue;
        }

        let text = serde_json::to_string(&records)?;
        documents.push(Document::new(text).with_metadata("sheet_name", sheet_name));
    }

    Ok(documents)
}

/// Convert sheet rows to JSON objects keyed by the first row.
///
/// Blank header cells become `Unnamed: <col>`, repeated headers get a
/// `.<n>` suffix, blank rows are dropped.
#[cfg(feature = "xlsx")]
pub fn sheet_records<'a>(
    rows: impl IntoIterator<Item = &'a [calamine::Data]>,
) -> Vec<serde_json::Value> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let name = match cell_value(cell) {
                serde_json::Value::Null => format!("Unnamed: {}", index),
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                format!("{}.{}", name, *count - 1)
            } else {
                name
            }
        })
        .collect();

    rows.filter(|row| row.iter().any(|cell| !matches!(cell, calamine::Data::Empty)))
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    let value = row.get(index).map(cell_value).unwrap_or_default();
                    (column.clone(), value)
                })
                .collect();
            serde_json::Value::Object(object)
        })
        .collect()
}

#[cfg(feature = "xlsx")]
fn cell_value(cell: &calamine::Data) -> serde_json::Value {
    use calamine::Data;

    match cell {
        Data::Empty | Data::Error(_) => serde_json::Value::Null,
        Data::String(s) => serde_json::Value::String(s.clone()),
        Data::Int(i) => serde_json::Value::from(*i),
        // whole floats are integers in the workbook model
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            serde_json::Value::from(*f as i64)
        }
        Data::Float(f) => serde_json::Value::from(*f),
        Data::Bool(b) => serde_json::Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => {
                serde_json::Value::String(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            None => serde_json::Value::from(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => serde_json::Value::String(s.clone()),
    }
}
