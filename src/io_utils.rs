//! CSV output plumbing for the `.csv` export target.
//!
//! - **Encoding**: output is transcoded with `encoding_rs` (UTF-8 by default,
//!   `windows-1258` and friends on request).
//! - **stdout**: the `-` path routes through standard output.
//! - **Quoting**: every field is quoted so Excel keeps leading zeros in codes.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_writer(
    path: Option<&Path>,
    encoding: &'static Encoding,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };

    let writer: Box<dyn Write> = if encoding == UTF_8 {
        base
    } else {
        Box::new(TranscodingWriter::new(base, encoding))
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

/// Re-encodes UTF-8 bytes from the CSV writer, holding back a trailing
/// partial character until the rest of it arrives.
struct TranscodingWriter<W: Write> {
    inner: W,
    encoding: &'static Encoding,
    pending: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            pending: Vec::new(),
        }
    }

    fn drain_complete(&mut self, at_end: bool) -> io::Result<()> {
        let complete = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_some() => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Invalid UTF-8 sequence in output stream",
                ));
            }
            Err(_) if at_end => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Incomplete UTF-8 sequence at end of output stream",
                ));
            }
            Err(err) => err.valid_up_to(),
        };
        if complete == 0 {
            return Ok(());
        }
        let text = std::str::from_utf8(&self.pending[..complete])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let (encoded, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to encode text using {}", self.encoding.name()),
            ));
        }
        self.inner.write_all(encoded.as_ref())?;
        self.pending.drain(..complete);
        Ok(())
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_complete(false)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_complete(true)?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some(" windows-1258 ")).unwrap().name(),
            "windows-1258"
        );
        assert!(resolve_encoding(Some("klingon")).is_err());
    }

    #[test]
    fn transcoder_handles_split_characters() {
        let mut out = Vec::new();
        {
            let mut writer = TranscodingWriter::new(&mut out, encoding_rs::WINDOWS_1252);
            let bytes = "café".as_bytes();
            writer.write_all(&bytes[..4]).unwrap();
            writer.write_all(&bytes[4..]).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(out, b"caf\xe9");
    }

    #[test]
    fn transcoder_rejects_unmappable_text() {
        let mut out = Vec::new();
        let mut writer = TranscodingWriter::new(&mut out, encoding_rs::WINDOWS_1252);
        assert!(writer.write_all("Tiền".as_bytes()).is_err());
    }
}
