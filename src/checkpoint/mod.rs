//! Checkpoint storage capabilities.
//!
//! The conversion core only needs to enumerate `{name: shape}`, fetch one
//! tensor at a time, and persist a finished `{name: tensor}` map. Any
//! backend offering these two traits can be converted.

mod memory;
mod safetensors_file;
mod tensor;

pub use memory::MemoryCheckpoint;
pub use safetensors_file::{SafeTensorsReader, SafeTensorsWriter};
pub use tensor::Tensor;

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File extension appended to checkpoint prefixes.
pub const CHECKPOINT_EXTENSION: &str = "safetensors";

/// Read side of a checkpoint.
pub trait CheckpointReader {
    /// All variable names with their shapes, in enumeration order.
    fn list_names_and_shapes(&self) -> Result<BTreeMap<String, Vec<usize>>>;

    /// Fetch one tensor by name.
    fn read_tensor(&self, name: &str) -> Result<Tensor>;
}

/// Write side of a checkpoint.
pub trait CheckpointWriter {
    /// Persist every tensor as one fresh checkpoint.
    fn write_all(&mut self, tensors: &BTreeMap<String, Tensor>) -> Result<()>;
}

/// Resolve a source path or prefix to an existing checkpoint file.
///
/// The path is used as given when it exists; otherwise `<path>.safetensors`
/// is tried.
pub fn resolve_source(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let with_ext = append_extension(path);
    if with_ext.exists() {
        return Ok(with_ext);
    }
    Err(Error::CheckpointNotFound { path: path.to_path_buf() })
}

/// Resolve a destination path or prefix. A path without extension gets
/// `.safetensors` appended.
pub fn resolve_destination(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        append_extension(path)
    }
}

fn append_extension(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(CHECKPOINT_EXTENSION);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_source_existing_path() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let path = dir.path().join("model.ckpt");
        std::fs::write(&path, b"x").expect("write should succeed");
        assert_eq!(resolve_source(&path).expect("resolves"), path);
    }

    #[test]
    fn test_resolve_source_prefix() {
        let dir = TempDir::new().expect("temp dir creation should succeed");
        let file = dir.path().join("bert_model.ckpt-1000.safetensors");
        std::fs::write(&file, b"x").expect("write should succeed");

        let prefix = dir.path().join("bert_model.ckpt-1000");
        assert_eq!(resolve_source(&prefix).expect("resolves"), file);
    }

    #[test]
    fn test_resolve_source_missing() {
        let err = resolve_source(Path::new("/definitely/not/a/checkpoint_abc123")).unwrap_err();
        assert!(matches!(err, Error::CheckpointNotFound { .. }));
    }

    #[test]
    fn test_resolve_destination() {
        assert_eq!(resolve_destination(Path::new("out/new_ckpt")), PathBuf::from("out/new_ckpt.safetensors"));
        assert_eq!(resolve_destination(Path::new("out/model.safetensors")), PathBuf::from("out/model.safetensors"));
    }
}
