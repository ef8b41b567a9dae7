//! JSON5 documents on disk, plain or gzip-compressed.
//!
//! An unmodified document saves back to its original bytes.

use crate::statics;
use crate::value::Value;
use anyhow::Context;
use flate2::{Compression, GzBuilder, read::GzDecoder};
use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json5,
    GzipJson5,
}

impl DocumentFormat {
    /// Format implied by a file name: `.gz` means gzip.
    pub fn for_path(path: &Path) -> Self {
        if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            DocumentFormat::GzipJson5
        } else {
            DocumentFormat::Json5
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => statics::NL_LF,
            LineEnding::CrLf => statics::NL_CRLF,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub source_path: Option<PathBuf>,
    pub format: DocumentFormat,
    pub line_ending: LineEnding,
    pub original_bytes: Vec<u8>,
    pub root: Value,
    pub dirty: bool,
}

impl Document {
    pub fn from_text(text: &str) -> anyhow::Result<Self> {
        let root = Value::parse_json5(text).context("parsing JSON5")?;
        Ok(Self {
            source_path: None,
            format: DocumentFormat::Json5,
            line_ending: detect_line_ending(text.as_bytes()),
            original_bytes: text.as_bytes().to_vec(),
            root,
            dirty: false,
        })
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let format = detect_format(path, &bytes);
        let text_bytes = match format {
            DocumentFormat::Json5 => bytes.clone(),
            DocumentFormat::GzipJson5 => {
                let mut decoder = GzDecoder::new(&bytes[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).context("gzip decompress")?;
                out
            }
        };
        let text = std::str::from_utf8(&text_bytes).context("document is not valid UTF-8")?;
        let root = Value::parse_json5(text).with_context(|| format!("parsing {path:?}"))?;
        tracing::debug!(path = %path.display(), ?format, "document loaded");

        Ok(Self {
            source_path: Some(path.to_path_buf()),
            format,
            line_ending: detect_line_ending(&text_bytes),
            original_bytes: bytes,
            root,
            dirty: false,
        })
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replace the root value; the document becomes dirty when it differs.
    pub fn set_root(&mut self, root: Value) {
        if root != self.root {
            self.root = root;
            self.dirty = true;
        }
    }

    /// Serialize the current root regardless of `dirty`.
    pub fn generate_bytes(&self, format: DocumentFormat) -> anyhow::Result<Vec<u8>> {
        let text = self.root.to_json5_pretty_with_newline(self.line_ending.as_str());
        match format {
            DocumentFormat::Json5 => Ok(text.into_bytes()),
            DocumentFormat::GzipJson5 => {
                let mut encoder = GzBuilder::new()
                    .mtime(0)
                    .write(Vec::new(), Compression::default());
                encoder.write_all(text.as_bytes()).context("gzip compress")?;
                encoder.finish().context("gzip finish")
            }
        }
    }

    /// Bytes to write; the original bytes while nothing changed.
    pub fn save_bytes(&self, format: DocumentFormat) -> anyhow::Result<Vec<u8>> {
        if !self.dirty && format == self.format {
            return Ok(self.original_bytes.clone());
        }
        self.generate_bytes(format)
    }

    pub fn save_to_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let format = DocumentFormat::for_path(path);
        let bytes = self.save_bytes(format)?;
        fs::write(path, &bytes).with_context(|| format!("writing {path:?}"))?;
        tracing::debug!(path = %path.display(), ?format, bytes = bytes.len(), "document saved");

        self.source_path = Some(path.to_path_buf());
        self.format = format;
        self.original_bytes = bytes;
        self.dirty = false;
        Ok(())
    }
}

/// Majority line terminator of `text_bytes`.
fn detect_line_ending(text_bytes: &[u8]) -> LineEnding {
    let mut lf = 0usize;
    let mut crlf = 0usize;
    for (i, b) in text_bytes.iter().enumerate() {
        if *b != b'\n' {
            continue;
        }
        if i > 0 && text_bytes[i - 1] == b'\r' {
            crlf += 1;
        } else {
            lf += 1;
        }
    }
    if crlf > lf { LineEnding::CrLf } else { LineEnding::Lf }
}

fn detect_format(path: &Path, bytes: &[u8]) -> DocumentFormat {
    // Gzip magic: 1F 8B
    if bytes.starts_with(&[0x1F, 0x8B]) {
        return DocumentFormat::GzipJson5;
    }
    DocumentFormat::for_path(path)
}
