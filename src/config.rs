use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DEFAULT_WINDOW_SIZE;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Exercise vocabulary is empty")]
    EmptyVocabulary,

    #[error("Exercise '{0}' appears more than once in the vocabulary")]
    DuplicateExercise(String),

    #[error("Window size must be at least 2 samples, got {0}")]
    WindowTooShort(usize),

    #[error("Confidence threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),

    #[error("Target duration must be positive, got {0}")]
    NonPositiveTarget(f32),

    #[error("Test fraction must be within (0, 1), got {0}")]
    TestFractionOutOfRange(f32),

    #[error("Random forest needs at least one tree")]
    NoTrees,

    #[error("Tick rate must be a positive finite frequency, got {0}")]
    InvalidTickRate(f32),
}

/// Qué hacer con un archivo cuyo nombre no contiene etiqueta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Asigna la etiqueta "unknown" y sigue
    #[default]
    Sentinel,
    /// Aborta la construcción del dataset
    FailFast,
}

/// Parámetros de configuración del entrenador
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Muestras por ventana (default: 50, ~1 repetición)
    pub window_size: usize,
    /// Ejercicios en el orden en que se recorren
    pub vocabulary: Vec<String>,
    /// Confianza mínima para contar tiempo (default: 0.65, inclusivo)
    pub confidence_threshold: f32,
    /// Segundos correctos necesarios para avanzar (default: 10)
    pub target_seconds: f32,
    /// Fracción reservada para validación (default: 0.2)
    pub test_fraction: f32,
    pub split_seed: u64,
    pub forest_seed: u64,
    pub n_trees: usize,
    pub label_policy: LabelPolicy,
    /// Frecuencia del tick del bucle en vivo (Hz)
    pub tick_hz: f32,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            vocabulary: ["jumpingjack", "running", "lifting", "rowing"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            confidence_threshold: 0.65,
            target_seconds: 10.0,
            test_fraction: 0.2,
            split_seed: 1234542,
            forest_seed: 1567892,
            n_trees: 12,
            label_policy: LabelPolicy::Sentinel,
            tick_hz: 60.0,
        }
    }
}

impl TrainerConfig {
    /// Carga la configuración desde JSON; los campos ausentes toman el valor por defecto
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer la configuración {:?}", path))?;
        let config: TrainerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Configuración inválida en {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vocabulary.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }
        let mut seen = HashSet::new();
        for exercise in &self.vocabulary {
            if !seen.insert(exercise.as_str()) {
                return Err(ConfigError::DuplicateExercise(exercise.clone()));
            }
        }
        if self.window_size < 2 {
            return Err(ConfigError::WindowTooShort(self.window_size));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.confidence_threshold));
        }
        if self.target_seconds.is_nan() || self.target_seconds <= 0.0 {
            return Err(ConfigError::NonPositiveTarget(self.target_seconds));
        }
        if self.test_fraction.is_nan() || self.test_fraction <= 0.0 || self.test_fraction >= 1.0 {
            return Err(ConfigError::TestFractionOutOfRange(self.test_fraction));
        }
        if self.n_trees == 0 {
            return Err(ConfigError::NoTrees);
        }
        if !self.tick_hz.is_finite() || self.tick_hz <= 0.0 {
            return Err(ConfigError::InvalidTickRate(self.tick_hz));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_size, 50);
        assert_eq!(config.vocabulary.len(), 4);
        assert_eq!(config.vocabulary[2], "lifting");
    }

    #[test]
    fn test_rejects_duplicate_exercise() {
        let config = TrainerConfig {
            vocabulary: vec!["running".into(), "running".into()],
            ..TrainerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateExercise("running".into()))
        );
    }

    #[test]
    fn test_rejects_bad_threshold_and_target() {
        let config = TrainerConfig {
            confidence_threshold: 1.5,
            ..TrainerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ThresholdOutOfRange(_))));

        let config = TrainerConfig {
            target_seconds: 0.0,
            ..TrainerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveTarget(_))));
    }

    #[test]
    fn test_rejects_bad_tick_rate() {
        for tick_hz in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            let config = TrainerConfig {
                tick_hz,
                ..TrainerConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidTickRate(_))),
                "tick_hz = {}",
                tick_hz
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let path = std::env::temp_dir().join(format!(
            "entrenador_config_{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{ "vocabulary": ["a", "b"], "target_seconds": 1.0, "label_policy": "fail_fast" }"#,
        )
        .unwrap();

        let config = TrainerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.vocabulary, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.target_seconds, 1.0);
        assert_eq!(config.label_policy, LabelPolicy::FailFast);
        assert_eq!(config.window_size, 50);

        let _ = fs::remove_file(&path);
    }
}
