//! Voice style store — per-style tables of pre-computed style vectors.
//!
//! The voice directory holds one JSON file per style; the file stem is the
//! style name and the content is an `[L][256]` float matrix.  Row `L` is the
//! style vector for an utterance whose token sequence, excluding the two
//! boundary sentinels, has length `L`.  That coupling makes an out-of-range
//! length a caller error that must fail loudly, never an index to clamp.

use std::{collections::HashMap, path::Path};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::error::KokoroError;

/// Width of every style vector.
pub const STYLE_DIM: usize = 256;

/// One style's matrix, stored flat in row-major order.
pub struct StyleTable {
    rows: usize,
    data: Vec<f32>,
}

impl StyleTable {
    /// Build a table from parsed JSON rows, validating the row width.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * STYLE_DIM);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != STYLE_DIM {
                bail!("style row {i} has {} elements, expected {STYLE_DIM}", row.len());
            }
            data.extend(row);
        }
        Ok(Self { rows: nrows, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * STYLE_DIM..(i + 1) * STYLE_DIM]
    }
}

/// All styles found in the voice directory, read-only after load.
pub struct VoiceStore {
    styles: HashMap<String, StyleTable>,
    available: Vec<String>,
}

impl VoiceStore {
    /// Load every JSON file in `dir` as one style; subdirectories are
    /// skipped.  A missing directory or malformed file is fatal.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Cannot read voice directory: {}", dir.display()))?;

        let mut styles = HashMap::new();
        for entry in entries {
            let path = entry.context("Failed to read voice directory entry")?.path();
            if path.is_dir() {
                continue;
            }
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .with_context(|| format!("Voice file has no usable name: {}", path.display()))?
                .to_string();

            let bytes = std::fs::read(&path)
                .with_context(|| format!("Cannot read voice file: {}", path.display()))?;
            let rows: Vec<Vec<f32>> = serde_json::from_slice(&bytes)
                .with_context(|| format!("Malformed voice file: {}", path.display()))?;

            let table = StyleTable::from_rows(rows)
                .with_context(|| format!("Invalid style table: {}", path.display()))?;
            styles.insert(name, table);
        }

        let mut available: Vec<String> = styles.keys().cloned().collect();
        available.sort();
        info!(count = available.len(), "loaded voice styles");

        Ok(Self { styles, available })
    }

    pub fn from_styles(styles: HashMap<String, StyleTable>) -> Self {
        let mut available: Vec<String> = styles.keys().cloned().collect();
        available.sort();
        Self { styles, available }
    }

    /// Style names present in the store, sorted.
    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// The style vector for an utterance whose full token sequence has
    /// `token_count` entries (sentinels included); row `token_count − 2`.
    pub fn style_for_len(&self, style: &str, token_count: usize) -> Result<&[f32]> {
        let table = self.styles.get(style).ok_or_else(|| KokoroError::UnknownStyle {
            style: style.to_string(),
            available: self.available.clone(),
        })?;

        let index = token_count.saturating_sub(2);
        if index >= table.rows {
            return Err(KokoroError::StyleIndexOutOfRange {
                style: style.to_string(),
                index,
                rows: table.rows,
            }
            .into());
        }
        Ok(table.row(index))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> StyleTable {
        let rows: Vec<Vec<f32>> = (0..rows)
            .map(|r| vec![r as f32; STYLE_DIM])
            .collect();
        StyleTable::from_rows(rows).unwrap()
    }

    fn store() -> VoiceStore {
        let mut styles = HashMap::new();
        styles.insert("af_heart".to_string(), table(4));
        VoiceStore::from_styles(styles)
    }

    #[test]
    fn test_style_row_selection() {
        let store = store();
        // Token count 5 (sentinels included) → row 3.
        let row = store.style_for_len("af_heart", 5).unwrap();
        assert_eq!(row.len(), STYLE_DIM);
        assert!(row.iter().all(|&v| v == 3.0));
    }

    #[test]
    fn test_index_out_of_range_fails_loudly() {
        let store = store();
        let err = store.style_for_len("af_heart", 10).unwrap_err();
        assert!(err.to_string().contains("no vector for utterance length"), "got: {err}");
    }

    #[test]
    fn test_unknown_style() {
        let store = store();
        let err = store.style_for_len("nobody", 4).unwrap_err();
        assert!(err.to_string().contains("unknown style"), "got: {err}");
        assert!(err.to_string().contains("af_heart"), "got: {err}");
    }

    #[test]
    fn test_row_width_validated() {
        let bad = vec![vec![0.0f32; STYLE_DIM], vec![0.0f32; 3]];
        assert!(StyleTable::from_rows(bad).is_err());
    }

    #[test]
    fn test_load_dir() {
        let dir = std::env::temp_dir().join("kokorotts-voices-test");
        std::fs::create_dir_all(&dir).unwrap();
        let rows: Vec<Vec<f32>> = vec![vec![0.5; STYLE_DIM]; 2];
        std::fs::write(dir.join("am_test.json"), serde_json::to_vec(&rows).unwrap()).unwrap();

        let store = VoiceStore::load_dir(&dir).unwrap();
        assert_eq!(store.available(), &["am_test".to_string()]);
        let row = store.style_for_len("am_test", 3).unwrap();
        assert!(row.iter().all(|&v| v == 0.5));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
