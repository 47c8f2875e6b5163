//! Loads a collection of raw `.txt` documents from a folder.

use crate::error::{EngineError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source file name, unique within a collection.
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// Documents in file-name order plus per-file problems that did not abort the load.
#[derive(Debug, Default)]
pub struct LoadedCollection {
    pub documents: Vec<Document>,
    pub warnings: Vec<String>,
}

pub fn load_folder<P: AsRef<Path>>(folder: P) -> Result<LoadedCollection> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(EngineError::Input(format!("folder {} not found", folder.display())));
    }

    let mut loaded = LoadedCollection::default();
    let mut txt_files = 0usize;
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                loaded.warnings.push(format!("failed to list entry: {e}"));
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("txt") {
            continue;
        }
        txt_files += 1;
        let name = entry.file_name().to_string_lossy().to_string();

        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "failed to read document");
                loaded.warnings.push(format!("failed to read {name}: {e}"));
                continue;
            }
        };
        let text = match String::from_utf8(bytes) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(file = %name, "not valid UTF-8, decoding as Latin-1");
                loaded.warnings.push(format!("encoding fallback for {name}"));
                decode_latin1(e.as_bytes())
            }
        };
        if text.trim().is_empty() {
            tracing::warn!(file = %name, "document is empty");
            loaded.warnings.push(format!("{name} is empty"));
            continue;
        }
        loaded.documents.push(Document { id: name, text });
    }

    if txt_files == 0 {
        return Err(EngineError::Input(format!("folder {} has no .txt files", folder.display())));
    }
    tracing::info!(
        loaded = loaded.documents.len(),
        warnings = loaded.warnings.len(),
        folder = %folder.display(),
        "loaded documents"
    );
    Ok(loaded)
}

/// Latin-1 maps every byte to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Word-count summary of a raw collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionStats {
    pub num_docs: usize,
    pub total_words: usize,
    pub avg_words: f64,
    pub min_words: usize,
    pub max_words: usize,
}

impl CollectionStats {
    pub fn from_documents(documents: &[Document]) -> Self {
        let lengths: Vec<usize> = documents.iter().map(|d| d.text.split_whitespace().count()).collect();
        if lengths.is_empty() {
            return Self::default();
        }
        let total_words: usize = lengths.iter().sum();
        let avg = total_words as f64 / lengths.len() as f64;
        Self {
            num_docs: lengths.len(),
            total_words,
            avg_words: (avg * 100.0).round() / 100.0,
            min_words: lengths.iter().copied().min().unwrap_or(0),
            max_words: lengths.iter().copied().max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_txt_files_in_name_order_with_warnings() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second doc").unwrap();
        fs::write(dir.path().join("a.txt"), "first doc here").unwrap();
        fs::write(dir.path().join("empty.txt"), "   \n").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::write(dir.path().join("latin.txt"), [b'c', b'a', b'f', 0xE9]).unwrap();

        let loaded = load_folder(dir.path()).unwrap();
        let ids: Vec<&str> = loaded.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "b.txt", "latin.txt"]);
        assert_eq!(loaded.documents[2].text, "café");
        assert_eq!(loaded.warnings.len(), 2);
    }

    #[test]
    fn missing_or_txt_free_folder_is_input_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(load_folder(dir.path().join("nope")), Err(EngineError::Input(_))));
        fs::write(dir.path().join("x.md"), "x").unwrap();
        assert!(matches!(load_folder(dir.path()), Err(EngineError::Input(_))));
    }

    #[test]
    fn stats_summarize_word_counts() {
        let docs = vec![Document::new("a", "one two three"), Document::new("b", "one")];
        let stats = CollectionStats::from_documents(&docs);
        assert_eq!(stats.num_docs, 2);
        assert_eq!(stats.total_words, 4);
        assert_eq!(stats.avg_words, 2.0);
        assert_eq!((stats.min_words, stats.max_words), (1, 3));
        assert_eq!(CollectionStats::from_documents(&[]), CollectionStats::default());
    }
}
