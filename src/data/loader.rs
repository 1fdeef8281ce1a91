// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads the NER-derived frame corpus with the `csv` crate.
//
// File layout (one file per split, under the data directory):
//   ontonotes_ner_train.csv
//   ontonotes_ner_val.csv
//   ontonotes_ner_test.csv
//
// Row layout:
//   TEXT,PERSON,LOC,ORG,WORK_OF_ART,PRODUCT,EVENT,OTHER
//   "barack obama visited paris",1,1,0,0,0,0,0
//
// The first column may carry any name; the remaining seven must
// be the frame classes in order. A malformed row aborts loading.

use anyhow::Result;
use std::{io::Read, path::{Path, PathBuf}};

use crate::data::error::CorpusError;
use crate::domain::example::FrameExample;
use crate::domain::frame::{FrameClass, LabelRow, NUM_FRAMES};
use crate::domain::traits::{CorpusSource, Split};

/// Loads the CSV splits from one directory.
pub struct CsvCorpusLoader {
    dir: PathBuf,
}

impl CsvCorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the file holding `split`.
    pub fn path_for(&self, split: Split) -> PathBuf {
        self.dir.join(format!("ontonotes_ner_{}.csv", split.as_str()))
    }

    fn load_file(&self, path: &Path) -> Result<Vec<FrameExample>, CorpusError> {
        if !path.exists() {
            return Err(CorpusError::MissingFile { path: path.display().to_string() });
        }
        let file = std::fs::File::open(path)?;
        read_examples(file, &path.display().to_string())
    }
}

impl CorpusSource for CsvCorpusLoader {
    fn load_split(&self, split: Split) -> Result<Vec<FrameExample>> {
        let path     = self.path_for(split);
        let examples = self.load_file(&path)?;
        let unlabelled = examples.iter().filter(|e| e.is_unlabelled()).count();
        tracing::info!(
            "Loaded {} {} examples from '{}' ({} with no frame)",
            examples.len(),
            split,
            path.display(),
            unlabelled,
        );
        Ok(examples)
    }
}

/// Parse a whole corpus from any reader. `source` only labels errors.
pub fn read_examples<R: Read>(reader: R, source: &str) -> Result<Vec<FrameExample>, CorpusError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    check_header(csv_reader.headers()?, source)?;

    let mut examples = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line   = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != NUM_FRAMES + 1 {
            return Err(CorpusError::ColumnCount {
                path:     source.to_string(),
                line,
                expected: NUM_FRAMES + 1,
                found:    record.len(),
            });
        }

        let mut labels: LabelRow = [0; NUM_FRAMES];
        for (class, slot) in FrameClass::ALL.iter().zip(labels.iter_mut()) {
            let raw = record.get(class.index() + 1).unwrap_or("").trim();
            *slot = match raw {
                "0" => 0,
                "1" => 1,
                other => {
                    return Err(CorpusError::InvalidLabel {
                        path:   source.to_string(),
                        line,
                        column: class.name().to_string(),
                        value:  other.to_string(),
                    })
                }
            };
        }

        let text = record.get(0).unwrap_or("");
        examples.push(FrameExample::new(text, labels));
    }

    Ok(examples)
}

fn check_header(header: &csv::StringRecord, source: &str) -> Result<(), CorpusError> {
    let expected: Vec<String> = FrameClass::ALL.iter().map(|c| c.name().to_string()).collect();
    let found: Vec<String>    = header.iter().skip(1).map(|h| h.trim().to_string()).collect();

    if header.len() != NUM_FRAMES + 1 || found != expected {
        return Err(CorpusError::HeaderMismatch {
            path: source.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "TEXT,PERSON,LOC,ORG,WORK_OF_ART,PRODUCT,EVENT,OTHER\n";

    #[test]
    fn test_reads_rows_in_order() {
        let csv = format!(
            "{HEADER}\"obama in paris\",1,1,0,0,0,0,0\nthe iphone launch,0,0,1,0,1,1,0\n"
        );
        let rows = read_examples(csv.as_bytes(), "mem").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "obama in paris");
        assert_eq!(rows[0].labels, [1, 1, 0, 0, 0, 0, 0]);
        assert_eq!(rows[1].labels, [0, 0, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn test_rejects_reordered_header() {
        let csv = "TEXT,LOC,PERSON,ORG,WORK_OF_ART,PRODUCT,EVENT,OTHER\nx,0,0,0,0,0,0,0\n";
        let err = read_examples(csv.as_bytes(), "mem").unwrap_err();
        assert!(matches!(err, CorpusError::HeaderMismatch { .. }));
    }

    #[test]
    fn test_rejects_non_binary_label() {
        let csv = format!("{HEADER}hello,0,2,0,0,0,0,0\n");
        match read_examples(csv.as_bytes(), "mem").unwrap_err() {
            CorpusError::InvalidLabel { column, value, line, .. } => {
                assert_eq!(column, "LOC");
                assert_eq!(value, "2");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_short_row() {
        let csv = format!("{HEADER}hello,0,1\n");
        let err = read_examples(csv.as_bytes(), "mem").unwrap_err();
        assert!(matches!(err, CorpusError::ColumnCount { found: 3, .. }));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = CsvCorpusLoader::new(dir.path());
        let err    = loader.load_split(Split::Val).unwrap_err();
        assert!(err.to_string().contains("ontonotes_ner_val.csv"));
    }

    #[test]
    fn test_loads_split_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ontonotes_ner_test.csv"),
            format!("{HEADER}a b c,0,0,0,0,0,0,1\n"),
        )
        .unwrap();
        let loader = CsvCorpusLoader::new(dir.path());
        let rows   = loader.load_split(Split::Test).unwrap();
        assert_eq!(rows, vec![FrameExample::new("a b c", [0, 0, 0, 0, 0, 0, 1])]);
    }
}
