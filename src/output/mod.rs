pub mod tags;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::ScrapeError;
use crate::quote::Quote;
use crate::settings::OutputFormat;

const HEADER: [&str; 3] = ["text", "author", "tags"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    text: String,
    author: String,
    tags: String,
}

/// Write all quotes to `path`, replacing it only once the write has succeeded.
pub fn write_quotes(path: &Path, quotes: &[Quote], format: OutputFormat) -> Result<(), ScrapeError> {
    let tmp = temp_path(path);
    let io_err = |source| ScrapeError::Output {
        path: path.to_path_buf(),
        source,
    };

    let result = File::create(&tmp).map_err(io_err).and_then(|file| {
        let mut w = BufWriter::new(file);
        match format {
            OutputFormat::Csv => write_csv(&mut w, quotes)?,
            OutputFormat::Jsonl => write_jsonl(&mut w, quotes)?,
        }
        w.flush().map_err(io_err)
    });

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }

    info!("Saved {} quotes to {}", quotes.len(), path.display());
    Ok(())
}

/// Header `text,author,tags`, then one row per quote. CRLF line endings.
pub fn write_csv<W: Write>(w: W, quotes: &[Quote]) -> Result<(), ScrapeError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(w);

    writer.write_record(HEADER)?;
    for q in quotes {
        let tags = tags::encode(&q.tags);
        writer.write_record([q.text.as_str(), q.author.as_str(), tags.as_str()])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// One JSON object per line.
pub fn write_jsonl<W: Write>(mut w: W, quotes: &[Quote]) -> Result<(), ScrapeError> {
    for q in quotes {
        serde_json::to_writer(&mut w, q)?;
        w.write_all(b"\n").map_err(serde_json::Error::io)?;
    }
    Ok(())
}

/// Read a CSV written by [`write_csv`] back into quotes.
pub fn read_csv(path: &Path) -> Result<Vec<Quote>, ScrapeError> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<CsvRow>()
        .map(|row| -> Result<Quote, ScrapeError> {
            let row = row?;
            Ok(Quote {
                text: row.text,
                author: row.author,
                tags: tags::decode(&row.tags)?,
            })
        })
        .collect()
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "quotes".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quote(text: &str, author: &str, tags: &[&str]) -> Quote {
        Quote {
            text: text.to_string(),
            author: author.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample() -> Vec<Quote> {
        vec![
            quote("\u{201c}Be yourself.\u{201d}", "Oscar Wilde", &["be-yourself", "honesty"]),
            quote("A line, with a comma", "Jane Austen", &[]),
            quote("She said \"hi\"", "Anon", &["don't", "quotes", "quotes"]),
        ]
    }

    #[test]
    fn csv_layout() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample()[..2]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "text,author,tags\r\n\
             \u{201c}Be yourself.\u{201d},Oscar Wilde,\"['be-yourself', 'honesty']\"\r\n\
             \"A line, with a comma\",Jane Austen,[]\r\n"
        );
    }

    #[test]
    fn header_only_when_empty() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert_eq!(buf, b"text,author,tags\r\n");
    }

    #[test]
    fn writes_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.csv");
        write_quotes(&path, &sample(), OutputFormat::Csv).unwrap();
        assert_eq!(read_csv(&path).unwrap(), sample());
        assert!(!dir.path().join(".quotes.csv.tmp").exists());
    }

    #[test]
    fn identical_input_gives_identical_bytes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        write_quotes(&a, &sample(), OutputFormat::Csv).unwrap();
        write_quotes(&b, &sample(), OutputFormat::Csv).unwrap();
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.csv");
        fs::write(&path, "stale").unwrap();
        write_quotes(&path, &sample()[..1], OutputFormat::Csv).unwrap();
        assert_eq!(read_csv(&path).unwrap(), sample()[..1].to_vec());
    }

    #[test]
    fn jsonl_lines() {
        let mut buf = Vec::new();
        write_jsonl(&mut buf, &sample()[1..2]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"text\":\"A line, with a comma\",\"author\":\"Jane Austen\",\"tags\":[]}\n"
        );
    }

    #[test]
    fn missing_directory_is_an_output_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("quotes.csv");
        let err = write_quotes(&path, &sample(), OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, ScrapeError::Output { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn failed_rename_cleans_up_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "occupied").unwrap();

        let err = write_quotes(&path, &sample(), OutputFormat::Csv).unwrap_err();
        assert!(matches!(err, ScrapeError::Output { .. }));
        assert!(!dir.path().join(".quotes.csv.tmp").exists());
        assert!(path.join("keep.txt").exists());
    }

    #[test]
    fn malformed_tags_cell_fails_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "text,author,tags\r\nx,y,not-a-list\r\n").unwrap();
        assert!(matches!(read_csv(&path), Err(ScrapeError::InvalidTags(_))));
    }
}
