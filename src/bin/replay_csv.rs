use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use entrenador::csv_loader::load_samples_from_csv;
use entrenador::{DatasetBuilder, ExerciseClassifier, FeatureExtractor, TrainerConfig};

struct ReplayOptions {
    dump_features: bool,
}

const USAGE: &str = "Uso: replay_csv [--dump-features] <data_dir> <archivo.csv>";

fn parse_args() -> Result<(PathBuf, PathBuf, ReplayOptions)> {
    let mut dump_features = false;
    let mut positional: Vec<PathBuf> = Vec::new();

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump-features" => dump_features = true,
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    if positional.len() != 2 {
        bail!(USAGE);
    }
    let csv_path = positional.pop().ok_or_else(|| anyhow!(USAGE))?;
    let data_dir = positional.pop().ok_or_else(|| anyhow!(USAGE))?;
    Ok((data_dir, csv_path, ReplayOptions { dump_features }))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let (data_dir, csv_path, opts) = parse_args()?;
    let config = TrainerConfig::default();

    let dataset = DatasetBuilder::new(&config)
        .build(&data_dir)
        .with_context(|| format!("No se pudo construir el dataset desde {:?}", data_dir))?;
    let mut classifier = ExerciseClassifier::new(&config);
    let training = classifier.train(&dataset)?;
    println!(
        "🧠 Modelo: {} ventanas, precisión {:.3}, clases {:?}",
        training.rows, training.accuracy, training.labels
    );

    println!("🎞️  Clasificando ventanas de {:?}", csv_path);
    let samples = load_samples_from_csv(&csv_path)?;
    let extractor = FeatureExtractor::new(config.window_size);
    let mut histogram: BTreeMap<String, usize> = BTreeMap::new();

    for (idx, window) in samples.chunks_exact(config.window_size).enumerate() {
        let prediction = classifier.predict(window)?;
        println!(
            "  {:>3}. {:<16} {:>6.2}%",
            idx,
            prediction.label,
            prediction.confidence * 100.0
        );

        if opts.dump_features {
            for (name, value) in extractor.extract(window).iter() {
                println!("       {:<14} {:>12.6}", name, value);
            }
        }

        *histogram.entry(prediction.label).or_insert(0) += 1;
    }

    if histogram.is_empty() {
        println!(
            "ℹ️  El archivo tiene {} muestras, menos que una ventana de {}",
            samples.len(),
            config.window_size
        );
        return Ok(());
    }

    println!("\n📊 Resumen:");
    let total: usize = histogram.values().sum();
    for (label, count) in &histogram {
        println!(
            "  {:<16} {:>4} ventanas ({:.1}%)",
            label,
            count,
            *count as f32 * 100.0 / total as f32
        );
    }

    Ok(())
}
