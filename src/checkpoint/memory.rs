//! In-memory checkpoint backend.

use super::{CheckpointReader, CheckpointWriter, Tensor};
use crate::{Error, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// A checkpoint held entirely in memory.
///
/// Implements both capabilities and keeps a log of every `read_tensor`
/// call, which lets callers observe exactly which tensors a conversion
/// touched.
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    tensors: BTreeMap<String, Tensor>,
    reads: RefCell<Vec<String>>,
}

impl MemoryCheckpoint {
    /// Create an empty checkpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tensor, replacing any previous value under `name`.
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.tensors.insert(name.into(), tensor);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.insert(name, tensor);
        self
    }

    /// Stored tensors.
    pub fn tensors(&self) -> &BTreeMap<String, Tensor> {
        &self.tensors
    }

    /// Names passed to `read_tensor`, in call order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.borrow().clone()
    }

    /// Number of stored tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether no tensor is stored.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

impl FromIterator<(String, Tensor)> for MemoryCheckpoint {
    fn from_iter<I: IntoIterator<Item = (String, Tensor)>>(iter: I) -> Self {
        Self { tensors: iter.into_iter().collect(), reads: RefCell::default() }
    }
}

impl CheckpointReader for MemoryCheckpoint {
    fn list_names_and_shapes(&self) -> Result<BTreeMap<String, Vec<usize>>> {
        Ok(self.tensors.iter().map(|(name, t)| (name.clone(), t.shape().to_vec())).collect())
    }

    fn read_tensor(&self, name: &str) -> Result<Tensor> {
        self.reads.borrow_mut().push(name.to_string());
        self.tensors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TensorNotFound { name: name.to_string() })
    }
}

impl CheckpointWriter for MemoryCheckpoint {
    fn write_all(&mut self, tensors: &BTreeMap<String, Tensor>) -> Result<()> {
        self.tensors = tensors.clone();
        Ok(())
    }
}
