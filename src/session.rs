use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::capture_buffer::CaptureBuffer;
use crate::config::{ConfigError, TrainerConfig};
use crate::exercise_classifier::{ClassifierError, ExerciseClassifier, Prediction};
use crate::forest::{Classifier, RandomForest};
use crate::types::AxisReading;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Exercises missing from the trained label set: {missing:?}")]
    VocabularyMismatch { missing: Vec<String> },
}

/// Estado del ciclo de ejercicios
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseSessionState {
    pub exercise_index: usize,
    /// Segundos correctos acumulados en el ejercicio actual
    pub correct_seconds: f32,
    pub last_prediction: Option<Prediction>,
    pub last_correct: bool,
}

/// Lo que consume el front-end tras cada evaluación
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutput {
    pub current_exercise: String,
    pub prediction_label: String,
    pub prediction_confidence: f32,
    pub is_correct: bool,
    pub progress_fraction: f32,
    /// Evento de un solo tick: el ejercicio anterior se completó
    pub advanced_this_tick: bool,
    pub correct_seconds: f32,
    pub target_seconds: f32,
}

impl SessionOutput {
    pub fn prediction_text(&self) -> String {
        format!(
            "Detected: {} ({}%)",
            self.prediction_label,
            (self.prediction_confidence * 100.0) as u32
        )
    }

    pub fn goal_text(&self) -> String {
        format!(
            "Do: {} ({}/{}s)",
            self.current_exercise, self.correct_seconds as u32, self.target_seconds as u32
        )
    }
}

/// Máquina de estados cíclica: un estado por ejercicio del vocabulario
pub struct ExerciseSession<C = RandomForest> {
    classifier: Arc<ExerciseClassifier<C>>,
    vocabulary: Vec<String>,
    confidence_threshold: f32,
    target_seconds: f32,
    buffer: CaptureBuffer,
    clock: f64,
    state: ExerciseSessionState,
}

impl<C: Classifier> ExerciseSession<C> {
    /// Falla si el clasificador no está entrenado o no conoce algún ejercicio
    pub fn new(
        config: &TrainerConfig,
        classifier: Arc<ExerciseClassifier<C>>,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let labels = classifier.labels()?;
        let missing: Vec<String> = config
            .vocabulary
            .iter()
            .filter(|exercise| !labels.contains(*exercise))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SessionError::VocabularyMismatch { missing });
        }

        if classifier.window_size() != config.window_size {
            return Err(ClassifierError::WindowLength {
                expected: classifier.window_size(),
                actual: config.window_size,
            }
            .into());
        }

        Ok(Self {
            classifier,
            vocabulary: config.vocabulary.clone(),
            confidence_threshold: config.confidence_threshold,
            target_seconds: config.target_seconds,
            buffer: CaptureBuffer::new(config.window_size),
            clock: 0.0,
            state: ExerciseSessionState {
                exercise_index: 0,
                correct_seconds: 0.0,
                last_prediction: None,
                last_correct: false,
            },
        })
    }

    pub fn state(&self) -> &ExerciseSessionState {
        &self.state
    }

    pub fn current_exercise(&self) -> &str {
        &self.vocabulary[self.state.exercise_index]
    }

    pub fn progress_fraction(&self) -> f32 {
        (self.state.correct_seconds / self.target_seconds).min(1.0)
    }

    /// Un tick del bucle: acumula las lecturas disponibles y, con el buffer lleno,
    /// clasifica la ventana y actualiza el progreso.
    /// Devuelve None mientras no haya una ventana completa.
    pub fn tick(
        &mut self,
        dt_secs: f32,
        acc: Option<AxisReading>,
        gyro: Option<AxisReading>,
    ) -> Result<Option<SessionOutput>, SessionError> {
        self.clock += dt_secs as f64;
        self.buffer.push(self.clock, acc, gyro);

        let Some(window) = self.buffer.window() else {
            return Ok(None);
        };

        let prediction = match self.classifier.predict(&window) {
            Ok(prediction) => prediction,
            Err(e) => {
                // Se congela el último estado conocido
                log::error!("Error clasificando ventana: {}", e);
                return Err(e.into());
            }
        };
        log::debug!(
            "Detectado: {} ({:.1}%)",
            prediction.label,
            prediction.confidence * 100.0
        );

        Ok(Some(self.update(prediction, dt_secs)))
    }

    /// Transición de estado para una predicción y el tiempo transcurrido desde el tick anterior
    pub fn update(&mut self, prediction: Prediction, dt_secs: f32) -> SessionOutput {
        let correct = prediction.label == self.current_exercise()
            && prediction.confidence >= self.confidence_threshold;

        if correct {
            self.state.correct_seconds += dt_secs.max(0.0);
        }

        let progress_fraction = self.progress_fraction();
        let correct_seconds = self.state.correct_seconds;

        let advanced = self.state.correct_seconds >= self.target_seconds;
        if advanced {
            log::info!(
                "Ejercicio completado: {} ({:.1}s)",
                self.current_exercise(),
                self.state.correct_seconds
            );
            self.state.exercise_index = (self.state.exercise_index + 1) % self.vocabulary.len();
            self.state.correct_seconds = 0.0;
        }

        let output = SessionOutput {
            current_exercise: self.current_exercise().to_string(),
            prediction_label: prediction.label.clone(),
            prediction_confidence: prediction.confidence,
            is_correct: correct,
            progress_fraction,
            advanced_this_tick: advanced,
            correct_seconds: if advanced { 0.0 } else { correct_seconds },
            target_seconds: self.target_seconds,
        };

        self.state.last_prediction = Some(prediction);
        self.state.last_correct = correct;
        output
    }
}
