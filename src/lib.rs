//! Reconocimiento de ejercicios a partir de acelerómetro y giroscopio, y bucle
//! de entrenamiento que mide cuánto tiempo se mantiene el ejercicio correcto.
//!
//! Flujo en vivo: lecturas -> `CaptureBuffer` -> `FeatureExtractor` ->
//! `ExerciseClassifier::predict` -> `ExerciseSession::update`.
//!
//! Flujo offline: CSV etiquetados -> `DatasetBuilder` -> `LabeledDataset` ->
//! `ExerciseClassifier::train`.

pub mod capture_buffer;
pub mod config;
pub mod csv_loader;
pub mod dataset;
pub mod exercise_classifier;
pub mod feature_extractor;
pub mod forest;
pub mod preprocessing;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, LabelPolicy, TrainerConfig};
pub use dataset::{DatasetBuilder, DatasetError, LabeledDataset};
pub use exercise_classifier::{ClassifierError, ExerciseClassifier, Prediction, TrainingReport};
pub use feature_extractor::{FeatureExtractor, FeatureVector};
pub use session::{ExerciseSession, ExerciseSessionState, SessionError, SessionOutput};
pub use types::{AxisReading, SensorSample};
