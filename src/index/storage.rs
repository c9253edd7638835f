//! Single-file persistence for the similarity index.
//!
//! # Storage Format
//!
//! All integers and floats are little-endian.
//! - Header (16 bytes): magic `QVEC`, version, dimension, vector count
//! - Model name: `u32` byte length followed by UTF-8 bytes
//! - Records: for each position, the `u32` question id followed by
//!   `dimension` f32 values
//!
//! Record order is the build order, which makes the position to id mapping
//! implicit. The file is written to a temporary sibling and renamed into
//! place, so readers never observe a half-written artifact.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::MmapOptions;
use tempfile::NamedTempFile;

use crate::error::{IndexError, IndexResult};
use crate::types::QuestionId;

/// Current artifact format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the fixed header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes to identify index artifacts.
const MAGIC_BYTES: &[u8; 4] = b"QVEC";

const BYTES_PER_F32: usize = 4;
const BYTES_PER_ID: usize = 4;

/// Decoded contents of an artifact.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Artifact {
    pub model_name: String,
    pub dimension: usize,
    pub ids: Vec<QuestionId>,
    /// Row-major, `ids.len() * dimension` values.
    pub vectors: Vec<f32>,
}

/// Write `artifact` to `path`, replacing any previous file.
pub(crate) fn write_artifact(path: &Path, artifact: &Artifact) -> IndexResult<()> {
    let write_err = |source: io::Error| IndexError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let count = header_u32(artifact.ids.len(), "vector count")?;
    let dimension = header_u32(artifact.dimension, "dimension")?;
    let model = artifact.model_name.as_bytes();
    let model_len = header_u32(model.len(), "model name length")?;

    let temp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    {
        let mut out = BufWriter::new(temp.as_file());
        out.write_all(MAGIC_BYTES).map_err(write_err)?;
        out.write_all(&STORAGE_VERSION.to_le_bytes()).map_err(write_err)?;
        out.write_all(&dimension.to_le_bytes()).map_err(write_err)?;
        out.write_all(&count.to_le_bytes()).map_err(write_err)?;
        out.write_all(&model_len.to_le_bytes()).map_err(write_err)?;
        out.write_all(model).map_err(write_err)?;

        for (id, vector) in artifact
            .ids
            .iter()
            .zip(artifact.vectors.chunks_exact(artifact.dimension))
        {
            out.write_all(&id.to_le_bytes()).map_err(write_err)?;
            for &value in vector {
                out.write_all(&value.to_le_bytes()).map_err(write_err)?;
            }
        }
        out.flush().map_err(write_err)?;
    }
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

/// Header fields are `u32`; larger values cannot be represented.
fn header_u32(value: usize, field: &str) -> IndexResult<u32> {
    u32::try_from(value).map_err(|_| IndexError::Validation {
        reason: format!("{field} {value} exceeds the artifact limit"),
    })
}

/// Load the artifact at `path`.
///
/// Any problem locating or decoding the file is reported as
/// [`IndexError::IndexNotFound`].
pub(crate) fn read_artifact(path: &Path) -> IndexResult<Artifact> {
    let not_found = |reason: String| IndexError::IndexNotFound {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => not_found("file does not exist".to_string()),
        _ => not_found(format!("cannot open file: {e}")),
    })?;

    let file_len = file
        .metadata()
        .map_err(|e| not_found(format!("cannot stat file: {e}")))?
        .len() as usize;
    if file_len < HEADER_SIZE {
        return Err(not_found("file too small to contain header".to_string()));
    }

    let mmap = unsafe { MmapOptions::new().map(&file) }
        .map_err(|e| not_found(format!("cannot map file: {e}")))?;

    decode(&mmap).map_err(not_found)
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

const OVERSIZED_HEADER: &str = "header describes more data than the file holds";

fn decode(bytes: &[u8]) -> Result<Artifact, String> {
    if bytes.len() < HEADER_SIZE || &bytes[0..4] != MAGIC_BYTES {
        return Err("invalid magic bytes".to_string());
    }

    let version = read_u32(bytes, 4).ok_or("truncated header")?;
    if version != STORAGE_VERSION {
        return Err(format!(
            "unsupported version {version}, expected {STORAGE_VERSION}"
        ));
    }

    let dimension = read_u32(bytes, 8).ok_or("truncated header")? as usize;
    if dimension == 0 {
        return Err("dimension is zero".to_string());
    }
    let count = read_u32(bytes, 12).ok_or("truncated header")? as usize;

    let model_len = read_u32(bytes, HEADER_SIZE).ok_or("missing model name")? as usize;
    let model_start = HEADER_SIZE + 4;
    let records_start = model_start
        .checked_add(model_len)
        .ok_or(OVERSIZED_HEADER)?;
    let model_bytes = bytes
        .get(model_start..records_start)
        .ok_or("truncated model name")?;
    let model_name = std::str::from_utf8(model_bytes)
        .map_err(|e| format!("model name is not UTF-8: {e}"))?
        .to_string();

    let record_size = dimension
        .checked_mul(BYTES_PER_F32)
        .and_then(|floats| floats.checked_add(BYTES_PER_ID))
        .ok_or(OVERSIZED_HEADER)?;
    let expected_len = count
        .checked_mul(record_size)
        .and_then(|records| records.checked_add(records_start))
        .ok_or(OVERSIZED_HEADER)?;
    if bytes.len() != expected_len {
        return Err(format!(
            "expected {expected_len} bytes for {count} vectors, found {}",
            bytes.len()
        ));
    }

    let mut ids = Vec::with_capacity(count);
    let mut vectors = Vec::with_capacity(count * dimension);
    for record in bytes[records_start..].chunks_exact(record_size) {
        let id = QuestionId::from_le_bytes([record[0], record[1], record[2], record[3]])
            .ok_or("zero question id in records")?;
        ids.push(id);

        vectors.extend(
            record[BYTES_PER_ID..]
                .chunks_exact(BYTES_PER_F32)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
    }

    Ok(Artifact {
        model_name,
        dimension,
        ids,
        vectors,
    })
}
