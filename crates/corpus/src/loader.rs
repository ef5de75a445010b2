//! CSV loaders for sections and embeddings.
//!
//! Both files carry a header row whose first column is exactly `title`.
//! Anything that does not parse into a well-formed record is a
//! `MalformedCorpus` error; nothing is skipped or defaulted.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use askbook_core::corpus::{EmbeddingVector, Section};
use askbook_core::error::{Error, Result};
use csv::StringRecord;
use tracing::{debug, info};

use crate::{Corpus, TitleMap};

/// Parse `title,content,tokens` rows into sections keyed by title.
///
/// Token counts must be non-negative integers. Extra columns are ignored.
pub fn load_sections<R: Read>(reader: R, source_name: &str) -> Result<TitleMap<Section>> {
    let mut csv = csv_reader(reader);
    let headers = read_headers(&mut csv, source_name)?;

    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::malformed(source_name, format!("missing required column '{name}'"))
        })
    };
    let content_col = column("content")?;
    let tokens_col = column("tokens")?;

    let mut sections = TitleMap::new();
    for record in csv.records() {
        let record = record.map_err(|e| Error::malformed(source_name, e.to_string()))?;
        let line = line_of(&record);
        check_width(&record, headers.len(), source_name, line)?;

        let title = &record[0];
        let raw_tokens = record[tokens_col].trim();
        let tokens = raw_tokens.parse::<usize>().map_err(|_| {
            Error::malformed(
                source_name,
                format!(
                    "line {line}: tokens value '{raw_tokens}' for '{title}' is not a non-negative integer"
                ),
            )
        })?;

        let section = Section::new(title, &record[content_col], tokens);
        sections.insert(title, section).map_err(|_| {
            Error::malformed(source_name, format!("line {line}: duplicate title '{title}'"))
        })?;
    }

    debug!(source = source_name, count = sections.len(), "Sections parsed");
    Ok(sections)
}

/// Parse `title,0,1,...` rows into embedding vectors keyed by title.
///
/// Every column after `title` is one component, in column order. Every row
/// must have exactly as many columns as the header.
pub fn load_embeddings<R: Read>(
    reader: R,
    source_name: &str,
) -> Result<TitleMap<EmbeddingVector>> {
    let mut csv = csv_reader(reader);
    let headers = read_headers(&mut csv, source_name)?;

    let dimensions = headers.len() - 1;
    if dimensions == 0 {
        return Err(Error::malformed(
            source_name,
            "header has no embedding dimension columns",
        ));
    }

    let mut embeddings = TitleMap::new();
    for record in csv.records() {
        let record = record.map_err(|e| Error::malformed(source_name, e.to_string()))?;
        let line = line_of(&record);
        check_width(&record, headers.len(), source_name, line)?;

        let title = &record[0];
        let components = record
            .iter()
            .skip(1)
            .enumerate()
            .map(|(dim, raw)| {
                let value = raw.trim().parse::<f32>().map_err(|_| {
                    Error::malformed(
                        source_name,
                        format!("line {line}: component {dim} of '{title}' is not a number: '{raw}'"),
                    )
                })?;
                if !value.is_finite() {
                    return Err(Error::malformed(
                        source_name,
                        format!("line {line}: component {dim} of '{title}' is not finite: '{raw}'"),
                    ));
                }
                Ok(value)
            })
            .collect::<Result<Vec<f32>>>()?;

        embeddings
            .insert(title, EmbeddingVector::new(components))
            .map_err(|_| {
                Error::malformed(source_name, format!("line {line}: duplicate title '{title}'"))
            })?;
    }

    debug!(
        source = source_name,
        count = embeddings.len(),
        dimensions,
        "Embeddings parsed"
    );
    Ok(embeddings)
}

/// Load both files from disk and join them into a [`Corpus`].
pub fn load_corpus(sections_path: &Path, embeddings_path: &Path) -> Result<Corpus> {
    let sections = load_sections(open(sections_path)?, &sections_path.display().to_string())?;
    let embeddings = load_embeddings(
        open(embeddings_path)?,
        &embeddings_path.display().to_string(),
    )?;
    let corpus = Corpus::new(sections, embeddings)?;

    info!(
        sections = corpus.len(),
        dimensions = corpus.dimensions(),
        total_tokens = corpus.total_tokens(),
        "Corpus loaded"
    );
    Ok(corpus)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        Error::malformed(path.display().to_string(), format!("cannot open file: {e}"))
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    // Row width is checked by hand so the error can name the line.
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
}

fn read_headers<R: Read>(csv: &mut csv::Reader<R>, source_name: &str) -> Result<StringRecord> {
    let headers = csv
        .headers()
        .map_err(|e| Error::malformed(source_name, format!("unreadable header: {e}")))?
        .clone();

    match headers.get(0).map(|h| h.trim_start_matches('\u{feff}')) {
        Some("title") => Ok(headers),
        Some(other) => Err(Error::malformed(
            source_name,
            format!("first header column must be 'title', found '{other}'"),
        )),
        None => Err(Error::malformed(source_name, "missing header row")),
    }
}

fn check_width(record: &StringRecord, expected: usize, source_name: &str, line: u64) -> Result<()> {
    if record.len() != expected {
        return Err(Error::malformed(
            source_name,
            format!(
                "line {line}: expected {expected} columns, found {}",
                record.len()
            ),
        ));
    }
    Ok(())
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}
