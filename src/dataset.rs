use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{LabelPolicy, TrainerConfig};
use crate::csv_loader::load_samples_from_csv;
use crate::feature_extractor::{FeatureExtractor, FeatureVector};
use crate::types::UNKNOWN_LABEL;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("File name {file:?} does not follow <subject>-<label>-<rep>")]
    MalformedLabel { file: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Load(#[from] anyhow::Error),

    #[error("Row {row} does not match the dataset schema: {reason}")]
    Schema { row: usize, reason: String },
}

/// Fila etiquetada: valores en el orden de `LabeledDataset::feature_names`
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub label: String,
    pub values: Vec<f32>,
}

/// Tabla de features etiquetada; inmutable una vez construida
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    feature_names: Vec<String>,
    rows: Vec<LabeledRow>,
}

impl LabeledDataset {
    /// Construye el dataset validando que todas las filas tengan etiqueta y el mismo esquema
    pub fn from_vectors(vectors: Vec<FeatureVector>) -> Result<Self, DatasetError> {
        let feature_names: Vec<String> = vectors
            .first()
            .map(|v| v.names().map(str::to_string).collect())
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(vectors.len());
        for (row, vector) in vectors.into_iter().enumerate() {
            let label = vector
                .label()
                .ok_or_else(|| DatasetError::Schema {
                    row,
                    reason: "missing label".to_string(),
                })?
                .to_string();
            if !vector.names().eq(feature_names.iter().map(String::as_str)) {
                return Err(DatasetError::Schema {
                    row,
                    reason: "feature names differ from the first row".to_string(),
                });
            }
            rows.push(LabeledRow {
                label,
                values: vector.values(),
            });
        }

        Ok(Self {
            feature_names,
            rows,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Etiquetas distintas, ordenadas
    pub fn distinct_labels(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }
}

/// Extrae la etiqueta del nombre `<subject>-<label>-<rep>.csv`
pub fn label_from_path(path: &Path, policy: LabelPolicy) -> Result<String, DatasetError> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    match stem.split('-').nth(1) {
        Some(label) => Ok(label.to_string()),
        None => match policy {
            LabelPolicy::Sentinel => {
                log::warn!(
                    "{:?} no sigue <sujeto>-<ejercicio>-<rep>; se etiqueta como '{}'",
                    path,
                    UNKNOWN_LABEL
                );
                Ok(UNKNOWN_LABEL.to_string())
            }
            LabelPolicy::FailFast => Err(DatasetError::MalformedLabel {
                file: path.to_path_buf(),
            }),
        },
    }
}

/// Recorre un directorio de sesiones grabadas y produce la tabla de entrenamiento
pub struct DatasetBuilder {
    extractor: FeatureExtractor,
    window_size: usize,
    label_policy: LabelPolicy,
    vocabulary: Vec<String>,
}

impl DatasetBuilder {
    pub fn new(config: &TrainerConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.window_size),
            window_size: config.window_size,
            label_policy: config.label_policy,
            vocabulary: config.vocabulary.clone(),
        }
    }

    /// Lista los CSV del directorio ordenados por ruta
    fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| ext.eq_ignore_ascii_case("csv"))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Ventanas consecutivas sin solape de un archivo; el resto < W se descarta
    pub fn windows_from_file(&self, path: &Path) -> Result<Vec<FeatureVector>, DatasetError> {
        let label = label_from_path(path, self.label_policy)?;
        if label != UNKNOWN_LABEL && !self.vocabulary.contains(&label) {
            log::warn!("{:?}: '{}' no está en el vocabulario de ejercicios", path, label);
        }

        let samples = load_samples_from_csv(path)?;
        if samples.len() < self.window_size {
            log::warn!(
                "{:?}: {} muestras, menos que una ventana de {}",
                path,
                samples.len(),
                self.window_size
            );
        }

        Ok(samples
            .chunks_exact(self.window_size)
            .map(|window| self.extractor.extract(window).with_label(label.clone()))
            .collect())
    }

    pub fn build(&self, dir: impl AsRef<Path>) -> Result<LabeledDataset, DatasetError> {
        let dir = dir.as_ref();
        let files = Self::csv_files(dir)?;

        let mut vectors = Vec::new();
        for path in &files {
            let windows = self.windows_from_file(path)?;
            log::debug!("{:?}: {} ventanas", path, windows.len());
            vectors.extend(windows);
        }

        let dataset = LabeledDataset::from_vectors(vectors)?;
        log::info!(
            "Dataset construido desde {:?}: {} archivos, {} ventanas, etiquetas {:?}",
            dir,
            files.len(),
            dataset.len(),
            dataset.distinct_labels()
        );
        Ok(dataset)
    }
}
