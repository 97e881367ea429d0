use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use regex::Regex;

use crate::tools::ToolError;

pub const DEFAULT_TOP: usize = 10;

/// Most frequent lower-cased words, ties in order of first appearance.
pub fn word_frequencies(text: &str, top: usize) -> Result<Vec<(String, usize)>, ToolError> {
    if text.trim().is_empty() {
        return Err(ToolError::EmptyInput);
    }
    let lowered = text.to_lowercase();
    let word = Regex::new(r"\b\w+\b")?;

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for m in word.find_iter(&lowered) {
        match index.get(m.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(m.as_str(), counts.len());
                counts.push((m.as_str(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts
        .into_iter()
        .take(top)
        .map(|(w, n)| (w.to_string(), n))
        .collect())
}

/// Reads a `.txt` file; other extensions are rejected.
pub fn read_text_file(path: &Path) -> Result<String, ToolError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ext != "txt" {
        return Err(ToolError::UnsupportedFileType(format!(".{ext}")));
    }
    Ok(std::fs::read_to_string(path)?)
}

pub fn render(frequencies: &[(String, usize)]) -> String {
    frequencies
        .iter()
        .map(|(w, n)| format!("{w}: {n}\n"))
        .collect()
}

pub fn export(path: &Path, frequencies: &[(String, usize)]) -> Result<(), ToolError> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    writer.write_all(render(frequencies).as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/tools/words.rs"]
mod tests;
