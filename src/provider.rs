use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ExportError;
use crate::format;
use crate::tensors::Tensor;

/// Source of named weight tensors. Implementations are stateless from the
/// caller's point of view: `get` is a pure function of the name, so export
/// steps can run concurrently against a shared provider.
pub trait TensorProvider: Sync {
    fn get(&self, name: &str) -> Result<Tensor, ExportError>;
}

/// Checkpoint exported as one shape-prefixed `<name>.bin` per tensor in a
/// single directory.
pub struct CheckpointDir {
    root: PathBuf,
    rank: usize,
}

impl CheckpointDir {
    /// `rank` is the dimensionality of every tensor in the directory; the
    /// raw format does not record it (weight matrices here are 2-D).
    pub fn new(root: impl Into<PathBuf>, rank: usize) -> Self {
        Self {
            root: root.into(),
            rank,
        }
    }
}

impl TensorProvider for CheckpointDir {
    fn get(&self, name: &str) -> Result<Tensor, ExportError> {
        let path = self.root.join(format!("{name}.bin"));
        if !path.is_file() {
            return Err(ExportError::MissingTensor(name.to_string()));
        }
        format::read_shape_prefixed(&path, self.rank)
    }
}

/// In-memory provider for tests.
#[derive(Default)]
pub struct InMemoryProvider {
    tensors: HashMap<String, Tensor>,
}

impl InMemoryProvider {
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.tensors.insert(name.into(), tensor);
    }
}

impl TensorProvider for InMemoryProvider {
    fn get(&self, name: &str) -> Result<Tensor, ExportError> {
        self.tensors
            .get(name)
            .cloned()
            .ok_or_else(|| ExportError::MissingTensor(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn checkpoint_dir_reads_what_the_writer_wrote() {
        let dir = tempdir().unwrap();
        let tensor = Tensor::new(vec![0.5, -0.5, 1.0, -1.0], vec![2, 2]);
        format::write_shape_prefixed(&dir.path().join("q_proj.bin"), &tensor).unwrap();

        let provider = CheckpointDir::new(dir.path(), 2);
        assert_eq!(provider.get("q_proj").unwrap(), tensor);
    }

    #[test]
    fn missing_tensor_carries_its_name() {
        let dir = tempdir().unwrap();
        let provider = CheckpointDir::new(dir.path(), 2);

        match provider.get("v_proj") {
            Err(ExportError::MissingTensor(name)) => assert_eq!(name, "v_proj"),
            other => panic!("expected MissingTensor, got {other:?}"),
        }
    }
}
