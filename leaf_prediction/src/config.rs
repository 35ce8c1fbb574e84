use crate::labels::LabelTable;
use serde::Deserialize;
use std::{io, path::PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub model_file: String,
}

impl ModelConfig {
    pub fn get_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LabelsConfig {
    #[serde(default)]
    pub labels_file: Option<PathBuf>,
}

impl LabelsConfig {
    /// Loads the configured label file, or the built-in table when none is set.
    pub fn load(&self) -> io::Result<LabelTable> {
        match &self.labels_file {
            Some(path) => LabelTable::from_file(path),
            None => Ok(LabelTable::default()),
        }
    }
}
