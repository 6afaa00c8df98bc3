//! Datos sintéticos para los tests: cada ejercicio es una oscilación con su propia
//! amplitud y frecuencia.

use std::f32::consts::PI;
use std::fs;
use std::path::PathBuf;

use crate::config::TrainerConfig;
use crate::dataset::LabeledDataset;
use crate::exercise_classifier::ExerciseClassifier;
use crate::feature_extractor::FeatureExtractor;
use crate::types::SensorSample;

pub const TEST_SAMPLING_RATE: f32 = 50.0;

/// Directorio temporal vacío y exclusivo del proceso
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("entrenador_{}_{}", std::process::id(), name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn oscillating_samples(n: usize, amplitude: f32, freq_hz: f32) -> Vec<SensorSample> {
    oscillating_samples_with_phase(n, amplitude, freq_hz, 0.0)
}

pub fn oscillating_samples_with_phase(
    n: usize,
    amplitude: f32,
    freq_hz: f32,
    phase: f32,
) -> Vec<SensorSample> {
    (0..n)
        .map(|i| {
            let t = i as f32 / TEST_SAMPLING_RATE;
            let w = 2.0 * PI * freq_hz * t + phase;
            SensorSample::new(
                t as f64,
                [amplitude * w.sin(), 0.5 * amplitude * w.cos(), 9.81 + 0.3 * amplitude * w.sin()],
                [0.2 * amplitude * w.cos(), 0.1 * amplitude * w.sin(), 0.05 * amplitude],
            )
        })
        .collect()
}

pub fn small_config(vocabulary: &[&str]) -> TrainerConfig {
    TrainerConfig {
        window_size: 10,
        vocabulary: vocabulary.iter().map(|s| s.to_string()).collect(),
        ..TrainerConfig::default()
    }
}

/// `per_label` ventanas por ejercicio (label, amplitud, frecuencia), con variación leve
pub fn exercise_dataset(
    config: &TrainerConfig,
    exercises: &[(&str, f32, f32)],
    per_label: usize,
) -> LabeledDataset {
    let extractor = FeatureExtractor::new(config.window_size);
    let mut vectors = Vec::new();
    for &(label, amplitude, freq_hz) in exercises {
        for k in 0..per_label {
            let window = oscillating_samples_with_phase(
                config.window_size,
                amplitude * (1.0 + 0.02 * k as f32),
                freq_hz,
                0.3 * k as f32,
            );
            vectors.push(extractor.extract(&window).with_label(label));
        }
    }
    LabeledDataset::from_vectors(vectors).unwrap()
}

/// Clasificador entrenado con un ejercicio bien separado por etiqueta del vocabulario
pub fn trained_classifier(config: &TrainerConfig) -> ExerciseClassifier {
    let exercises: Vec<(&str, f32, f32)> = config
        .vocabulary
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), 1.0 + 4.0 * i as f32, 1.0 + 5.0 * i as f32))
        .collect();
    let dataset = exercise_dataset(config, &exercises, 12);
    let mut classifier = ExerciseClassifier::new(config);
    classifier.train(&dataset).unwrap();
    classifier
}
