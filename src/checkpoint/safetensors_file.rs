//! SafeTensors checkpoint backend.

use super::{resolve_destination, resolve_source, CheckpointReader, CheckpointWriter, Tensor};
use crate::{Error, Result};
use safetensors::{Dtype, SafeTensorError, SafeTensors};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Little-endian `u64` header length that prefixes every file.
const HEADER_LEN_BYTES: usize = 8;

/// Header entry for one stored tensor.
#[derive(Debug, Clone)]
struct IndexEntry {
    dtype: Dtype,
    shape: Vec<usize>,
    range: Range<usize>,
}

/// Reads tensors from a `.safetensors` file.
///
/// The file is loaded into memory once and its header is parsed at open
/// time, so a corrupt file fails before any conversion work starts and each
/// `read_tensor` is a slice copy.
pub struct SafeTensorsReader {
    path: PathBuf,
    buffer: Vec<u8>,
    index: BTreeMap<String, IndexEntry>,
}

impl SafeTensorsReader {
    /// Open a checkpoint by path or prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CheckpointNotFound`] if neither the path nor
    /// `<path>.safetensors` exists, and [`Error::CheckpointRead`] if the
    /// file cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_source(path.as_ref())?;
        tracing::info!("Reading checkpoint {}", path.display());

        let buffer = std::fs::read(&path)
            .map_err(|e| Error::CheckpointRead { path: path.clone(), message: e.to_string() })?;
        let index = parse_index(&buffer)
            .map_err(|e| Error::CheckpointRead { path: path.clone(), message: format!("invalid SafeTensors data: {e}") })?;

        Ok(Self { path, buffer, index })
    }

    /// Resolved file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the checkpoint file in bytes.
    pub fn size_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_index(buffer: &[u8]) -> std::result::Result<BTreeMap<String, IndexEntry>, SafeTensorError> {
    // Offsets are validated against the buffer length here.
    let (header_len, metadata) = SafeTensors::read_metadata(buffer)?;
    let data_start = HEADER_LEN_BYTES + header_len;
    Ok(metadata
        .tensors()
        .into_iter()
        .map(|(name, info)| {
            let (begin, end) = info.data_offsets;
            let entry = IndexEntry {
                dtype: info.dtype,
                shape: info.shape.clone(),
                range: data_start + begin..data_start + end,
            };
            (name, entry)
        })
        .collect())
}

impl CheckpointReader for SafeTensorsReader {
    fn list_names_and_shapes(&self) -> Result<BTreeMap<String, Vec<usize>>> {
        Ok(self.index.iter().map(|(name, entry)| (name.clone(), entry.shape.clone())).collect())
    }

    fn read_tensor(&self, name: &str) -> Result<Tensor> {
        let entry = self
            .index
            .get(name)
            .ok_or_else(|| Error::TensorNotFound { name: name.to_string() })?;
        let data = self.buffer.get(entry.range.clone()).ok_or_else(|| Error::CheckpointRead {
            path: self.path.clone(),
            message: format!("data of {name} lies outside the file"),
        })?;
        Ok(Tensor::new(entry.dtype, entry.shape.clone(), data.to_vec()))
    }
}

/// Writes a tensor map as one `.safetensors` file.
///
/// No `__metadata__` is written, so equal maps produce equal files.
pub struct SafeTensorsWriter {
    path: PathBuf,
}

impl SafeTensorsWriter {
    /// Target a path or prefix; a prefix gets the `.safetensors` extension.
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self { path: resolve_destination(path.as_ref()) }
    }

    /// Resolved file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointWriter for SafeTensorsWriter {
    fn write_all(&mut self, tensors: &BTreeMap<String, Tensor>) -> Result<()> {
        tracing::info!("Writing checkpoint {}", self.path.display());

        let write_err = |message: String| Error::CheckpointWrite { path: self.path.clone(), message };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| write_err(format!("creating {}: {e}", parent.display())))?;
        }

        let bytes = safetensors::serialize(tensors.iter(), None)
            .map_err(|e| write_err(format!("SafeTensors serialization failed: {e}")))?;

        std::fs::write(&self.path, bytes).map_err(|e| write_err(e.to_string()))
    }
}
