use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::types::{SensorSample, CSV_HEADERS};

/// Carga una sesión grabada en el formato
/// id,timestamp,acc_x,acc_y,acc_z,gyro_x,gyro_y,gyro_z
/// Las filas incompletas (celdas vacías, NaN, infinitos o columnas de menos) se descartan.
pub fn load_samples_from_csv(path: impl AsRef<Path>) -> Result<Vec<SensorSample>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;

    let mut samples = Vec::new();
    let mut dropped = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Fila {} inválida en {:?}", row_idx + 1, path))?;
        // Grabación interrumpida: la última línea puede quedar truncada
        if record.len() < CSV_HEADERS.len() {
            dropped += 1;
            continue;
        }

        match parse_row(&record)
            .with_context(|| format!("Valor inválido en fila {} de {:?}", row_idx + 1, path))?
        {
            Some(sample) => samples.push(sample),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("{:?}: {} filas incompletas descartadas", path, dropped);
    }

    Ok(samples)
}

/// Devuelve None si la fila tiene algún valor ausente
fn parse_row(record: &StringRecord) -> Result<Option<SensorSample>> {
    if parse_cell::<f64>(&record[0])?.is_none() {
        return Ok(None);
    }
    let Some(timestamp) = parse_cell::<f64>(&record[1])? else {
        return Ok(None);
    };

    let mut channels = [0.0f32; 6];
    for (i, channel) in channels.iter_mut().enumerate() {
        match parse_cell::<f32>(&record[2 + i])? {
            Some(value) => *channel = value,
            None => return Ok(None),
        }
    }

    Ok(Some(SensorSample::new(
        timestamp,
        [channels[0], channels[1], channels[2]],
        [channels[3], channels[4], channels[5]],
    )))
}

fn parse_cell<T>(cell: &str) -> Result<Option<T>>
where
    T: std::str::FromStr + IsMissing,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let value: T = cell
        .parse()
        .with_context(|| format!("'{}' no es un número", cell))?;
    Ok(if value.is_missing() { None } else { Some(value) })
}

trait IsMissing {
    fn is_missing(&self) -> bool;
}

impl IsMissing for f32 {
    fn is_missing(&self) -> bool {
        !self.is_finite()
    }
}

impl IsMissing for f64 {
    fn is_missing(&self) -> bool {
        !self.is_finite()
    }
}

/// Escribe muestras en el mismo formato que los archivos de entrenamiento
pub fn write_samples_to_csv(path: impl AsRef<Path>, samples: &[SensorSample]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("No se pudo crear el CSV {:?}", path))?;

    writer.write_record(CSV_HEADERS)?;
    for (id, sample) in samples.iter().enumerate() {
        writer.write_record(&[
            id.to_string(),
            sample.timestamp.to_string(),
            sample.acc[0].to_string(),
            sample.acc[1].to_string(),
            sample.acc[2].to_string(),
            sample.gyro[0].to_string(),
            sample.gyro[1].to_string(),
            sample.gyro[2].to_string(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("No se pudo escribir {:?}", path))?;
    Ok(())
}
