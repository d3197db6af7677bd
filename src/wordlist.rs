//! Base wordlist loading
//!
//! Loads the source dictionary, normalizes words to lowercase, and filters
//! them to the configured length bounds (and optional regex pattern) before
//! the generation pipeline sees them. Falls back to a small built-in word set
//! when the dictionary file is missing.

use regex::Regex;
use std::fs::File;
use std::path::Path;

/// Built-in words used when the system dictionary is unavailable.
const FALLBACK_WORDS: &[&str] = &["cat", "dog", "sun", "bird", "password", "hello"];

/// Length bounds and optional pattern applied to base words.
#[derive(Debug, Clone)]
pub struct WordFilter {
    pub min_length: usize,
    pub max_length: usize,
    pub pattern: Option<Regex>,
}

impl WordFilter {
    pub fn new(
        min_length: usize,
        max_length: usize,
        pattern: Option<&str>,
    ) -> anyhow::Result<Self> {
        if min_length == 0 || min_length > max_length {
            anyhow::bail!(
                "Invalid word length bounds: min ({}) must be >= 1 and <= max ({})",
                min_length,
                max_length
            );
        }

        let pattern = match pattern {
            Some(p) if !p.is_empty() => Some(
                Regex::new(p)
                    .map_err(|e| anyhow::anyhow!("Invalid word pattern '{}': {}", p, e))?,
            ),
            _ => None,
        };

        Ok(Self {
            min_length,
            max_length,
            pattern,
        })
    }

    #[inline]
    pub fn matches(&self, word: &str) -> bool {
        let len = if word.is_ascii() {
            word.len()
        } else {
            word.chars().count()
        };
        if len < self.min_length || len > self.max_length {
            return false;
        }
        if let Some(ref pattern) = self.pattern {
            if !pattern.is_match(word) {
                return false;
            }
        }
        true
    }
}

/// Memory-mapped line iterator over the dictionary file.
///
/// Dictionaries can be large (cracking wordlists run to gigabytes), so lines
/// are split directly over the mapping instead of going through a buffered
/// reader.
struct MmapLines {
    mmap: memmap2::Mmap,
    position: usize,
}

impl MmapLines {
    fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { memmap2::Mmap::map(&file)? };

        // Skip a UTF-8 BOM if present
        let position = if mmap.len() >= 3 && mmap[0..3] == [0xEF, 0xBB, 0xBF] {
            3
        } else {
            0
        };

        Ok(Self { mmap, position })
    }
}

impl Iterator for MmapLines {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.mmap.len() {
            return None;
        }

        let remaining = &self.mmap[self.position..];
        let line_end = memchr::memchr(b'\n', remaining)
            .map(|i| i + 1)
            .unwrap_or(remaining.len());

        let line = &remaining[..line_end];
        self.position += line_end;

        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        Some(String::from_utf8_lossy(line).into_owned())
    }
}

/// Load, normalize, and filter the base wordlist.
///
/// Words are trimmed and lowercased before filtering. A missing dictionary is
/// not fatal: the built-in fallback set is used with a logged warning, so the
/// tool stays usable on systems without `/usr/share/dict/words`.
pub fn load_words(path: &Path, filter: &WordFilter) -> anyhow::Result<Vec<String>> {
    let lines: Box<dyn Iterator<Item = String>> = match MmapLines::open(path) {
        Ok(lines) => Box::new(lines),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!(
                "Dictionary not found at {:?}, using built-in fallback words",
                path
            );
            Box::new(FALLBACK_WORDS.iter().map(|w| w.to_string()))
        }
        Err(e) => {
            return Err(anyhow::anyhow!(e).context(format!("Failed to open dictionary {:?}", path)))
        }
    };

    let words: Vec<String> = lines
        .map(|line| line.trim().to_lowercase())
        .filter(|word| !word.is_empty() && filter.matches(word))
        .collect();

    log::info!("Loaded {} base words from {:?}", words.len(), path);
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_length_bounds() {
        let filter = WordFilter::new(4, 8, None).unwrap();

        assert!(filter.matches("bird"));
        assert!(filter.matches("password"));
        assert!(!filter.matches("cat"));
        assert!(!filter.matches("wordsmith"));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(WordFilter::new(0, 8, None).is_err());
        assert!(WordFilter::new(9, 8, None).is_err());
    }

    #[test]
    fn test_pattern_filter() {
        let filter = WordFilter::new(4, 8, Some(r"^[a-z]+$")).unwrap();

        assert!(filter.matches("bird"));
        assert!(!filter.matches("bird1"));
    }

    #[test]
    fn test_load_filters_and_lowercases() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Bird").unwrap();
        writeln!(file, "cat").unwrap();
        writeln!(file, "  hello  ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "unreasonablylong").unwrap();

        let filter = WordFilter::new(4, 8, None).unwrap();
        let words = load_words(file.path(), &filter).unwrap();

        assert_eq!(words, vec!["bird", "hello"]);
    }

    #[test]
    fn test_missing_dictionary_falls_back() {
        let filter = WordFilter::new(4, 8, None).unwrap();
        let words = load_words(Path::new("/nonexistent/words"), &filter).unwrap();

        assert!(words.contains(&"password".to_string()));
        assert!(words.iter().all(|w| filter.matches(w)));
    }

    #[test]
    fn test_crlf_lines() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"bird\r\nhello\r\n").unwrap();

        let filter = WordFilter::new(4, 8, None).unwrap();
        let words = load_words(file.path(), &filter).unwrap();

        assert_eq!(words, vec!["bird", "hello"]);
    }
}
