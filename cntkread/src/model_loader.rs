use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use memmap2::Mmap;

use crate::model::{Model, ModelBytes};
use crate::network::ComputationNetwork;
use crate::{logging, trace};

/// Opens CNTK v1 model files.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    path: PathBuf,
    model: Model,
}

impl ModelLoader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let _scope = logging::scope(path.display().to_string());
        let file = File::open(&path)
            .with_context(|| format!("open model file {}", path.display()))?;
        let mmap = unsafe { Mmap::map(&file).with_context(|| "mmap model file")? };
        trace!("loader: mapped {} bytes", mmap.len());
        let model = load(ModelBytes::Mapped(mmap))
            .with_context(|| format!("load model {}", path.display()))?;
        Ok(Self { path, model })
    }

    /// Load a model from an in-memory buffer. There is no path to keep, so
    /// the model is returned directly.
    pub fn load_bytes(bytes: Vec<u8>) -> Result<Model> {
        load(ModelBytes::Owned(bytes))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }
}

fn load(bytes: ModelBytes) -> Result<Model> {
    if !ComputationNetwork::is_signature(&bytes) {
        return Err(anyhow!("invalid CNTK v1 signature"));
    }
    let network = ComputationNetwork::parse(&bytes)?;
    Ok(Model::new(network, Arc::new(bytes)))
}
