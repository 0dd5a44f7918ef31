//! Script export to disk.
//!
//! Scripts are encoded with the configured charset and written through a
//! temporary file in the target directory that is renamed over the
//! destination, so a reader never sees a partially written script.

use crate::error::ExportError;
use encoding_rs::{EncoderResult, Encoding};
use log::info;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const WRITER_BUFFER_SIZE: usize = 64 * 1024;

const ENCODER_CHUNK: usize = 4 * 1024;

/// Output character encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Latin1,
    Utf16Be,
    Utf16Le,
    /// Big-endian with a byte order mark
    Utf16,
    /// Any other encoding known to `encoding_rs` (windows-1252, KOI8-R, Shift_JIS, ...)
    Legacy(&'static Encoding),
}

impl Charset {
    /// Resolve an encoding name (case-insensitive, common aliases accepted)
    pub fn resolve(name: &str) -> Result<Self, ExportError> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "us-ascii" | "ascii" => Ok(Charset::UsAscii),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            "utf-16be" | "utf16be" => Ok(Charset::Utf16Be),
            "utf-16le" | "utf16le" => Ok(Charset::Utf16Le),
            "utf-16" | "utf16" => Ok(Charset::Utf16),
            _ => match Encoding::for_label(name.trim().as_bytes()) {
                // Encodings without an encoder of their own write UTF-8 instead
                Some(encoding) if encoding.output_encoding() == encoding => {
                    Ok(Charset::Legacy(encoding))
                }
                _ => Err(ExportError::UnknownEncoding(name.to_string())),
            },
        }
    }

    /// Encode text; characters the charset cannot represent become `?`
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::UsAscii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Charset::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Charset::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Charset::Utf16 => [0xFE, 0xFF]
                .into_iter()
                .chain(text.encode_utf16().flat_map(u16::to_be_bytes))
                .collect(),
            Charset::Legacy(encoding) => encode_legacy(*encoding, text),
        }
    }
}

fn encode_legacy(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut chunk = [0u8; ENCODER_CHUNK];
    let mut rest = text;
    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(rest, &mut chunk, true);
        out.extend_from_slice(&chunk[..written]);
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => return out,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => out.push(b'?'),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16 => "UTF-16",
            Charset::Legacy(encoding) => encoding.name(),
        };
        f.write_str(name)
    }
}

/// A script written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    /// Number of encoded bytes written
    pub bytes: usize,
    /// Hex SHA-256 of the written bytes
    pub sha256: String,
}

/// Write `content` to `dir/file_name` in the named encoding.
///
/// The encoding is checked before anything touches the file system. Any
/// existing file is replaced as a whole.
pub fn export(
    dir: &Path,
    file_name: &str,
    content: &str,
    encoding: &str,
) -> Result<ExportedFile, ExportError> {
    let charset = Charset::resolve(encoding)?;
    let bytes = charset.encode(content);

    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file_name);
    let write_err = |source| ExportError::Write {
        path: path.clone(),
        source,
    };

    // Dropping the temp file on an early return removes it
    let tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::with_capacity(WRITER_BUFFER_SIZE, tmp.as_file());
        writer.write_all(&bytes).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    info!("wrote: {}", path.display());

    Ok(ExportedFile {
        sha256: hex::encode(Sha256::digest(&bytes)),
        bytes: bytes.len(),
        path,
    })
}
