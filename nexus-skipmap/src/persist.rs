//! Delimited text dump and load for [`SkipMap`].
//!
//! The format is one entry per line, in iteration order:
//!
//! ```text
//! key<delimiter>value
//! ```
//!
//! Loading splits each line on the first delimiter. Lines that are not
//! UTF-8, have no delimiter, an empty side, or a side that fails to parse
//! are skipped with a warning. Nothing is escaped, so a key containing the delimiter does not
//! survive a round trip. A dump overwrites the target file in place.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use core::fmt::Display;

use rand_core::RngCore;
use tracing::{debug, warn};

use crate::error::PersistError;
use crate::map::SkipMap;
use crate::order::Comparator;

/// Delimiter used by [`SkipMap::dump`] and [`SkipMap::load`].
pub const DEFAULT_DELIMITER: &str = ":";

/// Outcome of a load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Lines that added a new key.
    pub inserted: usize,
    /// Lines that overwrote an existing key.
    pub updated: usize,
    /// Malformed lines.
    pub skipped: usize,
}

/// Decodes one raw line, dropping a trailing `\r`. `None` if not UTF-8.
fn trim_line(raw: &[u8]) -> Option<&str> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    core::str::from_utf8(raw).ok()
}

/// Splits on the first `delimiter`, rejecting empty sides.
fn split_line<'a>(line: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    let (key, value) = line.split_once(delimiter)?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

impl<K, V, C, R> SkipMap<K, V, C, R>
where
    C: Comparator<K>,
    R: RngCore,
{
    /// Writes every entry as a `key<delimiter>value` line.
    ///
    /// Returns the number of lines written.
    pub fn write_to<W>(&self, mut writer: W, delimiter: &str) -> Result<usize, PersistError>
    where
        W: Write,
        K: Display,
        V: Display,
    {
        if delimiter.is_empty() {
            return Err(PersistError::EmptyDelimiter);
        }

        let mut written = 0;
        for (key, value) in self.iter() {
            writeln!(writer, "{key}{delimiter}{value}")?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }

    /// Dumps the map to `path` with the default `:` delimiter.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<usize, PersistError>
    where
        K: Display,
        V: Display,
    {
        self.dump_with_delimiter(path, DEFAULT_DELIMITER)
    }

    /// Dumps the map to `path`, truncating whatever was there.
    pub fn dump_with_delimiter(
        &self,
        path: impl AsRef<Path>,
        delimiter: &str,
    ) -> Result<usize, PersistError>
    where
        K: Display,
        V: Display,
    {
        let path = path.as_ref();
        let file = File::create(path)?;
        let written = self.write_to(BufWriter::new(file), delimiter)?;
        debug!(path = %path.display(), entries = written, "dumped skip map");
        Ok(written)
    }

    /// Reads `key<delimiter>value` lines and upserts each valid pair.
    ///
    /// A later line for the same key overwrites an earlier one.
    pub fn read_from<B>(&mut self, reader: B, delimiter: &str) -> Result<LoadStats, PersistError>
    where
        B: BufRead,
        K: FromStr,
        V: FromStr,
    {
        if delimiter.is_empty() {
            return Err(PersistError::EmptyDelimiter);
        }

        let mut stats = LoadStats::default();
        for (number, raw) in reader.split(b'\n').enumerate() {
            let raw = raw?;
            let parsed = trim_line(&raw)
                .and_then(|line| split_line(line, delimiter))
                .and_then(|(k, v)| Some((k.parse::<K>().ok()?, v.parse::<V>().ok()?)));

            match parsed {
                Some((key, value)) => match self.upsert(key, value) {
                    Some(_) => stats.updated += 1,
                    None => stats.inserted += 1,
                },
                None => {
                    warn!(line = number + 1, "skipping malformed line");
                    stats.skipped += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Loads `path` with the default `:` delimiter.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadStats, PersistError>
    where
        K: FromStr,
        V: FromStr,
    {
        self.load_with_delimiter(path, DEFAULT_DELIMITER)
    }

    /// Loads `path`, merging its entries into the map.
    pub fn load_with_delimiter(
        &mut self,
        path: impl AsRef<Path>,
        delimiter: &str,
    ) -> Result<LoadStats, PersistError>
    where
        K: FromStr,
        V: FromStr,
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        let stats = self.read_from(BufReader::new(file), delimiter)?;
        debug!(
            path = %path.display(),
            inserted = stats.inserted,
            updated = stats.updated,
            skipped = stats.skipped,
            "loaded skip map"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dump_string(map: &SkipMap<String, String>, delimiter: &str) -> String {
        let mut out = Vec::new();
        map.write_to(&mut out, delimiter).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn split_rules() {
        assert_eq!(split_line("a:b", ":"), Some(("a", "b")));
        assert_eq!(split_line("a:b:c", ":"), Some(("a", "b:c")));
        assert_eq!(split_line("ab", ":"), None);
        assert_eq!(split_line(":b", ":"), None);
        assert_eq!(split_line("a:", ":"), None);
        assert_eq!(split_line("", ":"), None);
        assert_eq!(split_line("k=>v", "=>"), Some(("k", "v")));
    }

    #[test]
    fn writes_in_key_order() {
        let mut map = SkipMap::new();
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());

        assert_eq!(dump_string(&map, ":"), "a:1\nb:2\n");
        assert_eq!(dump_string(&map, "\t"), "a\t1\nb\t2\n");
    }

    #[test]
    fn reads_and_counts() {
        let input = "1:one\nbad line\n2:two\n:empty\n3:\nx:nan\n1:uno\n";
        let mut map: SkipMap<u64, String> = SkipMap::new();

        let stats = map.read_from(Cursor::new(input), ":").unwrap();
        assert_eq!(
            stats,
            LoadStats {
                inserted: 2,
                updated: 1,
                skipped: 4,
            }
        );
        assert_eq!(map.get(&1).map(String::as_str), Some("uno"));
        assert_eq!(map.get(&2).map(String::as_str), Some("two"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn skips_non_utf8_line_and_keeps_reading() {
        let input: &[u8] = b"1:one\n2:\xff\xfe\n3:three\r\n";
        let mut map: SkipMap<u64, String> = SkipMap::new();

        let stats = map.read_from(Cursor::new(input), ":").unwrap();
        assert_eq!(
            stats,
            LoadStats {
                inserted: 2,
                updated: 0,
                skipped: 1,
            }
        );
        assert_eq!(map.get(&1).map(String::as_str), Some("one"));
        assert!(!map.contains_key(&2));
        assert_eq!(map.get(&3).map(String::as_str), Some("three"));
    }

    #[test]
    fn trim_line_rules() {
        assert_eq!(trim_line(b"a:b"), Some("a:b"));
        assert_eq!(trim_line(b"a:b\r"), Some("a:b"));
        assert_eq!(trim_line(b""), Some(""));
        assert_eq!(trim_line(b"\xff"), None);
    }

    #[test]
    fn rejects_empty_delimiter() {
        let mut map: SkipMap<u64, u64> = SkipMap::new();
        assert!(matches!(
            map.write_to(Vec::new(), ""),
            Err(PersistError::EmptyDelimiter)
        ));
        assert!(matches!(
            map.read_from(Cursor::new("1:2"), ""),
            Err(PersistError::EmptyDelimiter)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut map: SkipMap<u64, u64> = SkipMap::new();
        let path = std::env::temp_dir().join("nexus-skipmap-does-not-exist.txt");
        assert!(matches!(map.load(&path), Err(PersistError::Io(_))));
    }
}
