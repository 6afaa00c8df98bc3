use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use crate::config::TrainerConfig;
use crate::dataset::LabeledDataset;
use crate::feature_extractor::{FeatureExtractor, FeatureVector};
use crate::forest::{Classifier, FitError, RandomForest};
use crate::preprocessing::{LabelEncoder, MinMaxScaler};
use crate::types::SensorSample;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Insufficient training data: {rows} rows, {distinct_labels} distinct labels (need rows and at least 2 labels)")]
    InsufficientData { rows: usize, distinct_labels: usize },

    #[error("Classifier used before training")]
    NotTrained,

    #[error("Classifier is already trained")]
    AlreadyTrained,

    #[error("Feature {index} mismatch: expected '{expected}', got '{actual}'")]
    FeatureShapeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Invalid window length: expected {expected}, got {actual}")]
    WindowLength { expected: usize, actual: usize },

    #[error("Model fit failed: {0}")]
    Fit(#[from] FitError),
}

/// Etiqueta predicha y su probabilidad
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Resumen de un entrenamiento
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Precisión sobre la partición de validación (diagnóstico, no umbral)
    pub accuracy: f32,
    pub labels: Vec<String>,
}

/// Estado ajustado: se crea en `train` y solo se lee después
struct TrainedModel<C> {
    encoder: LabelEncoder,
    scaler: MinMaxScaler,
    classifier: C,
    feature_names: Vec<String>,
}

pub struct ExerciseClassifier<C = RandomForest> {
    extractor: FeatureExtractor,
    window_size: usize,
    test_fraction: f32,
    split_seed: u64,
    untrained: Option<C>,
    model: Option<TrainedModel<C>>,
}

impl ExerciseClassifier<RandomForest> {
    /// Clasificador con el bosque aleatorio de referencia
    pub fn new(config: &TrainerConfig) -> Self {
        Self::with_classifier(config, RandomForest::new(config.n_trees, config.forest_seed))
    }
}

impl<C: Classifier> ExerciseClassifier<C> {
    pub fn with_classifier(config: &TrainerConfig, classifier: C) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.window_size),
            window_size: config.window_size,
            test_fraction: config.test_fraction,
            split_seed: config.split_seed,
            untrained: Some(classifier),
            model: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Etiquetas aprendidas, en orden de código
    pub fn labels(&self) -> Result<&[String], ClassifierError> {
        self.model
            .as_ref()
            .map(|m| m.encoder.classes())
            .ok_or(ClassifierError::NotTrained)
    }

    /// Ajusta codificador, escalador y clasificador. Solo puede llamarse una vez.
    pub fn train(&mut self, dataset: &LabeledDataset) -> Result<TrainingReport, ClassifierError> {
        if self.model.is_some() {
            return Err(ClassifierError::AlreadyTrained);
        }

        let distinct_labels = dataset.distinct_labels().len();
        if dataset.is_empty() || distinct_labels < 2 {
            return Err(ClassifierError::InsufficientData {
                rows: dataset.len(),
                distinct_labels,
            });
        }

        let labels: Vec<&str> = dataset.rows().iter().map(|r| r.label.as_str()).collect();
        let (encoder, targets) = LabelEncoder::fit_transform(&labels);

        let raw: Vec<Vec<f32>> = dataset.rows().iter().map(|r| r.values.clone()).collect();
        let scaler = MinMaxScaler::fit(&raw);
        let scaled: Vec<Vec<f32>> = raw.iter().map(|row| scaler.transform(row)).collect();

        // Partición reproducible train/validación
        let n = scaled.len();
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(self.split_seed));
        // ceil(fracción * n), tolerando el error de representación de la fracción en f32
        let n_test = ((self.test_fraction * n as f32 - 1e-4).ceil() as usize).clamp(1, n - 1);
        let (test_idx, train_idx) = indices.split_at(n_test);

        let train_rows: Vec<Vec<f32>> = train_idx.iter().map(|&i| scaled[i].clone()).collect();
        let train_targets: Vec<usize> = train_idx.iter().map(|&i| targets[i]).collect();

        let mut classifier = self.untrained.take().ok_or(ClassifierError::AlreadyTrained)?;
        if let Err(e) = classifier.fit(&train_rows, &train_targets, encoder.len()) {
            self.untrained = Some(classifier);
            return Err(e.into());
        }

        let correct = test_idx
            .iter()
            .filter(|&&i| argmax(&classifier.predict_proba(&scaled[i])).0 == targets[i])
            .count();
        let accuracy = if test_idx.is_empty() {
            0.0
        } else {
            correct as f32 / test_idx.len() as f32
        };

        let report = TrainingReport {
            rows: n,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            accuracy,
            labels: encoder.classes().to_vec(),
        };
        log::info!(
            "Modelo entrenado con {} ventanas ({} validación). Precisión: {:.3}",
            report.train_rows,
            report.test_rows,
            report.accuracy
        );

        self.model = Some(TrainedModel {
            encoder,
            scaler,
            classifier,
            feature_names: dataset.feature_names().to_vec(),
        });
        Ok(report)
    }

    /// Predice el ejercicio de una ventana de W muestras
    pub fn predict(&self, window: &[SensorSample]) -> Result<Prediction, ClassifierError> {
        if self.model.is_none() {
            return Err(ClassifierError::NotTrained);
        }
        if window.len() != self.window_size {
            return Err(ClassifierError::WindowLength {
                expected: self.window_size,
                actual: window.len(),
            });
        }
        let features = self.extractor.extract(window);
        self.predict_features(&features)
    }

    /// Predice a partir de un vector ya extraído; el esquema debe coincidir con el de entrenamiento
    pub fn predict_features(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;

        let actual: Vec<&str> = features.names().collect();
        let width = actual.len().max(model.feature_names.len());
        for index in 0..width {
            let expected = model.feature_names.get(index).map(String::as_str);
            let got = actual.get(index).copied();
            if expected != got {
                return Err(ClassifierError::FeatureShapeMismatch {
                    index,
                    expected: expected.unwrap_or("<none>").to_string(),
                    actual: got.unwrap_or("<none>").to_string(),
                });
            }
        }

        let scaled = model.scaler.transform(&features.values());
        let proba = model.classifier.predict_proba(&scaled);
        let (best, confidence) = argmax(&proba);
        let label = model
            .encoder
            .decode(best)
            .ok_or(ClassifierError::NotTrained)?
            .to_string();

        Ok(Prediction { label, confidence })
    }
}

/// Índice y valor del máximo; en empate gana el primero
fn argmax(values: &[f32]) -> (usize, f32) {
    let mut best = (0, f32::NEG_INFINITY);
    for (i, &v) in values.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    if values.is_empty() {
        (0, 0.0)
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{exercise_dataset, oscillating_samples, small_config};

    #[test]
    fn test_predict_before_train_fails() {
        let classifier = ExerciseClassifier::new(&small_config(&["a", "b"]));
        let window = oscillating_samples(10, 1.0, 1.0);
        assert_eq!(classifier.predict(&window), Err(ClassifierError::NotTrained));
        assert_eq!(classifier.labels().err(), Some(ClassifierError::NotTrained));
        assert!(!classifier.is_trained());
    }

    #[test]
    fn test_train_rejects_empty_and_single_class() {
        let config = small_config(&["a", "b"]);

        let mut classifier = ExerciseClassifier::new(&config);
        let empty = LabeledDataset::default();
        assert_eq!(
            classifier.train(&empty),
            Err(ClassifierError::InsufficientData {
                rows: 0,
                distinct_labels: 0
            })
        );

        let single = exercise_dataset(&config, &[("a", 2.0, 1.0)], 6);
        assert!(matches!(
            classifier.train(&single),
            Err(ClassifierError::InsufficientData {
                rows: 6,
                distinct_labels: 1
            })
        ));
        assert!(!classifier.is_trained());
    }

    #[test]
    fn test_train_and_predict_separable_exercises() {
        let config = small_config(&["jumpingjack", "lifting"]);
        let dataset = exercise_dataset(
            &config,
            &[("jumpingjack", 6.0, 4.0), ("lifting", 1.0, 1.0)],
            15,
        );

        let mut classifier = ExerciseClassifier::new(&config);
        let report = classifier.train(&dataset).unwrap();

        assert_eq!(report.rows, 30);
        assert_eq!(report.test_rows, 6);
        assert_eq!(report.train_rows, 24);
        assert_eq!(report.labels, vec!["jumpingjack", "lifting"]);
        assert!(report.accuracy > 0.8, "accuracy = {}", report.accuracy);

        let jumping = classifier
            .predict(&oscillating_samples(10, 6.0, 4.0))
            .unwrap();
        assert_eq!(jumping.label, "jumpingjack");
        assert!(jumping.confidence > 0.5 && jumping.confidence <= 1.0);

        let lifting = classifier
            .predict(&oscillating_samples(10, 1.0, 1.0))
            .unwrap();
        assert_eq!(lifting.label, "lifting");
    }

    #[test]
    fn test_predict_is_idempotent() {
        let config = small_config(&["a", "b"]);
        let dataset = exercise_dataset(&config, &[("a", 5.0, 3.0), ("b", 1.0, 1.0)], 10);
        let mut classifier = ExerciseClassifier::new(&config);
        classifier.train(&dataset).unwrap();

        let window = oscillating_samples(10, 3.0, 2.0);
        let first = classifier.predict(&window).unwrap();
        let second = classifier.predict(&window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_training_is_deterministic() {
        let config = small_config(&["a", "b", "c"]);
        let dataset = exercise_dataset(
            &config,
            &[("a", 5.0, 3.0), ("b", 1.0, 1.0), ("c", 3.0, 2.0)],
            10,
        );

        let mut first = ExerciseClassifier::new(&config);
        let mut second = ExerciseClassifier::new(&config);
        let report_a = first.train(&dataset).unwrap();
        let report_b = second.train(&dataset).unwrap();
        assert_eq!(report_a, report_b);

        let window = oscillating_samples(10, 2.0, 1.5);
        assert_eq!(first.predict(&window), second.predict(&window));
    }

    #[test]
    fn test_second_train_is_rejected() {
        let config = small_config(&["a", "b"]);
        let dataset = exercise_dataset(&config, &[("a", 5.0, 3.0), ("b", 1.0, 1.0)], 5);
        let mut classifier = ExerciseClassifier::new(&config);
        classifier.train(&dataset).unwrap();
        assert_eq!(classifier.train(&dataset), Err(ClassifierError::AlreadyTrained));
    }

    #[test]
    fn test_feature_schema_is_enforced() {
        let config = small_config(&["a", "b"]);
        let dataset = exercise_dataset(&config, &[("a", 5.0, 3.0), ("b", 1.0, 1.0)], 5);
        let mut classifier = ExerciseClassifier::new(&config);
        classifier.train(&dataset).unwrap();

        let mut entries: Vec<(String, f32)> = FeatureExtractor::new(10)
            .extract(&oscillating_samples(10, 1.0, 1.0))
            .iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect();
        entries.swap(0, 1);
        let swapped = FeatureVector::from_entries(entries.clone());
        assert_eq!(
            classifier.predict_features(&swapped),
            Err(ClassifierError::FeatureShapeMismatch {
                index: 0,
                expected: "acc_x_mean".to_string(),
                actual: "acc_x_std".to_string(),
            })
        );

        entries.swap(0, 1);
        entries.pop();
        let short = FeatureVector::from_entries(entries);
        assert!(matches!(
            classifier.predict_features(&short),
            Err(ClassifierError::FeatureShapeMismatch { index: 17, .. })
        ));
    }

    #[test]
    fn test_window_length_is_checked() {
        let config = small_config(&["a", "b"]);
        let dataset = exercise_dataset(&config, &[("a", 5.0, 3.0), ("b", 1.0, 1.0)], 5);
        let mut classifier = ExerciseClassifier::new(&config);
        classifier.train(&dataset).unwrap();

        assert_eq!(
            classifier.predict(&oscillating_samples(9, 1.0, 1.0)),
            Err(ClassifierError::WindowLength {
                expected: 10,
                actual: 9
            })
        );
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), (1, 0.4));
        assert_eq!(argmax(&[]), (0, 0.0));
    }
}
