use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::types::{Axis, SensorSample, TOTAL_FEATURES};

/// Estadísticas por eje, en el orden en que aparecen en el vector
const STATS: [&str; 3] = ["mean", "std", "energy"];

/// Vector de características con nombre: 3 estadísticas x 6 ejes = 18
/// La etiqueta solo se usa durante el entrenamiento
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, f32)>,
    label: Option<String>,
}

impl FeatureVector {
    pub fn from_entries(entries: Vec<(String, f32)>) -> Self {
        Self { entries, label: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> Vec<f32> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

/// Nombres de las 18 features en orden: acc_x_mean, acc_x_std, acc_x_energy, ...
pub fn feature_names() -> Vec<String> {
    let mut names = Vec::with_capacity(TOTAL_FEATURES);
    for axis in Axis::ALL {
        for stat in STATS {
            names.push(format!("{}_{}", axis.name(), stat));
        }
    }
    names
}

/// Extractor sin estado: el plan FFT se crea una vez para la longitud de ventana
pub struct FeatureExtractor {
    window_size: usize,
    fft: Arc<dyn Fft<f32>>,
    names: Vec<String>,
}

impl FeatureExtractor {
    pub fn new(window_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            window_size,
            fft: planner.plan_fft_forward(window_size.max(1)),
            names: feature_names(),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Extrae las 18 características de una ventana
    /// La ventana no debe contener NaN (el loader descarta esas filas)
    pub fn extract(&self, window: &[SensorSample]) -> FeatureVector {
        let mut values = Vec::with_capacity(TOTAL_FEATURES);
        for axis in Axis::ALL {
            let signal: Vec<f32> = window.iter().map(|s| s.axis(axis)).collect();
            values.push(mean(&signal));
            values.push(std(&signal));
            values.push(self.spectral_energy(&signal));
        }

        FeatureVector::from_entries(self.names.iter().cloned().zip(values).collect())
    }

    /// Media de |X[k]| para k = 1..=n/2 (FFT unilateral sin la componente DC)
    fn spectral_energy(&self, signal: &[f32]) -> f32 {
        if signal.len() < 2 {
            return 0.0;
        }

        let mut buffer: Vec<Complex<f32>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();

        if signal.len() == self.window_size {
            self.fft.process(&mut buffer);
        } else {
            // Longitud no planificada: plan temporal
            let mut planner = FftPlanner::new();
            planner.plan_fft_forward(signal.len()).process(&mut buffer);
        }

        let one_sided = &buffer[1..=signal.len() / 2];
        one_sided.iter().map(|c| c.norm()).sum::<f32>() / one_sided.len() as f32
    }
}

// ========== Funciones estadísticas ==========

fn mean(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f32>() / data.len() as f32
}

/// Desviación estándar poblacional (divide por n)
fn std(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let mean = mean(data);
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / data.len() as f32;
    variance.sqrt()
}
