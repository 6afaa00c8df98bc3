/// Codificador etiqueta <-> índice, ordenado alfabéticamente
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Ajusta el codificador y devuelve la columna codificada
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> (Self, Vec<usize>) {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        let encoder = Self { classes };
        let codes = labels
            .iter()
            .map(|l| encoder.encode(l.as_ref()).unwrap_or_default())
            .collect();
        (encoder, codes)
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(|c| c.as_str())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Escalado min-max por feature a [0, 1], ajustado una sola vez al entrenar
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Vec<f32>,
    range: Vec<f32>,
}

impl MinMaxScaler {
    /// Ajusta sobre todas las filas (todas con la misma longitud)
    pub fn fit(rows: &[Vec<f32>]) -> Self {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut min = vec![f32::INFINITY; width];
        let mut max = vec![f32::NEG_INFINITY; width];

        for row in rows {
            for (j, &value) in row.iter().enumerate().take(width) {
                min[j] = min[j].min(value);
                max[j] = max[j].max(value);
            }
        }

        // Features constantes: rango 1 para no dividir por cero
        let range = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| {
                let r = hi - lo;
                if r > 0.0 {
                    r
                } else {
                    1.0
                }
            })
            .collect();

        Self { min, range }
    }

    pub fn width(&self) -> usize {
        self.min.len()
    }

    /// Aplica el escalado aprendido; valores fuera del rango de entrenamiento no se recortan
    pub fn transform(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .zip(self.min.iter().zip(&self.range))
            .map(|(x, (lo, r))| (x - lo) / r)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoder_is_sorted_and_bijective() {
        let labels = ["running", "jumpingjack", "running", "lifting"];
        let (encoder, codes) = LabelEncoder::fit_transform(&labels);

        assert_eq!(encoder.classes(), &["jumpingjack", "lifting", "running"]);
        assert_eq!(codes, vec![2, 0, 2, 1]);
        for (code, class) in encoder.classes().iter().enumerate() {
            assert_eq!(encoder.encode(class), Some(code));
            assert_eq!(encoder.decode(code), Some(class.as_str()));
        }
        assert_eq!(encoder.encode("rowing"), None);
        assert_eq!(encoder.decode(3), None);
    }

    #[test]
    fn test_scaler_maps_training_range_to_unit_interval() {
        let rows = vec![vec![0.0, 10.0, 5.0], vec![2.0, 20.0, 5.0], vec![1.0, 15.0, 5.0]];
        let scaler = MinMaxScaler::fit(&rows);

        assert_eq!(scaler.width(), 3);
        assert_eq!(scaler.transform(&rows[0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(scaler.transform(&rows[1]), vec![1.0, 1.0, 0.0]);
        assert_eq!(scaler.transform(&rows[2]), vec![0.5, 0.5, 0.0]);
        // No se reajusta con datos nuevos
        assert_eq!(scaler.transform(&[4.0, 0.0, 6.0]), vec![2.0, -1.0, 1.0]);
    }
}
