/*
Entrenador de ejercicios en tiempo real

1. Construye el dataset desde un directorio de CSV <sujeto>-<ejercicio>-<rep>.csv
2. Entrena el clasificador (bosque aleatorio)
3. Reproduce una sesión grabada como si fuera el sensor en vivo
4. Recorre el vocabulario de ejercicios contando el tiempo correcto

Uso:
    RUST_LOG=info ./target/release/entrenador data --replay data/david-running-1.csv
    ./target/release/entrenador data --replay sesion.csv --config entrenador.json --json
*/

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, select, tick, Sender};

use entrenador::csv_loader::{load_samples_from_csv, write_samples_to_csv};
use entrenador::{
    AxisReading, DatasetBuilder, ExerciseClassifier, ExerciseSession, SensorSample, SessionOutput,
    TrainerConfig,
};

struct Options {
    data_dir: PathBuf,
    replay: PathBuf,
    config: Option<PathBuf>,
    json: bool,
    record: Option<PathBuf>,
}

const USAGE: &str =
    "Uso: entrenador <data_dir> --replay <sesion.csv> [--config cfg.json] [--json] [--record salida.csv]";

fn parse_args() -> Result<Options> {
    let mut data_dir: Option<PathBuf> = None;
    let mut replay: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut record: Option<PathBuf> = None;
    let mut json = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--replay" => replay = Some(args.next().ok_or_else(|| anyhow!(USAGE))?.into()),
            "--config" => config = Some(args.next().ok_or_else(|| anyhow!(USAGE))?.into()),
            "--record" => record = Some(args.next().ok_or_else(|| anyhow!(USAGE))?.into()),
            "--json" => json = true,
            _ => {
                if data_dir.is_some() {
                    bail!(USAGE);
                }
                data_dir = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(Options {
        data_dir: data_dir.ok_or_else(|| anyhow!("Debes especificar el directorio de datos\n{}", USAGE))?,
        replay: replay.ok_or_else(|| anyhow!("Debes especificar --replay <sesion.csv>\n{}", USAGE))?,
        config,
        json,
        record,
    })
}

/// Hilo productor: emite las lecturas respetando los timestamps de la grabación
fn start_replay(samples: Vec<SensorSample>, tx: Sender<(AxisReading, AxisReading)>) {
    let start = Instant::now();
    let t0 = samples.first().map(|s| s.timestamp).unwrap_or(0.0);

    for sample in samples {
        let Ok(due) = Duration::try_from_secs_f64((sample.timestamp - t0).max(0.0)) else {
            log::warn!("Timestamp fuera de rango ({}), se omite la muestra", sample.timestamp);
            continue;
        };
        if let Some(wait) = due.checked_sub(start.elapsed()) {
            std::thread::sleep(wait);
        }
        let acc = AxisReading::new(sample.acc[0], sample.acc[1], sample.acc[2]);
        let gyro = AxisReading::new(sample.gyro[0], sample.gyro[1], sample.gyro[2]);
        if tx.send((acc, gyro)).is_err() {
            return;
        }
    }
}

fn report(output: &SessionOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(output)?);
        return Ok(());
    }
    if output.advanced_this_tick {
        println!("✅ ¡Ejercicio completado! Siguiente: {}", output.current_exercise);
    }
    let mark = if output.is_correct { "🟢" } else { "🔴" };
    println!(
        "{} {:<32} {:<28} [{:>3.0}%]",
        mark,
        output.prediction_text(),
        output.goal_text(),
        output.progress_fraction * 100.0
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = parse_args()?;

    let config = match &opts.config {
        Some(path) => TrainerConfig::from_json_file(path)?,
        None => TrainerConfig::default(),
    };

    println!("🏋️  Entrenador de ejercicios\n");
    println!("📂 Construyendo dataset desde {:?}...", opts.data_dir);
    let dataset = DatasetBuilder::new(&config)
        .build(&opts.data_dir)
        .with_context(|| format!("No se pudo construir el dataset desde {:?}", opts.data_dir))?;

    let mut classifier = ExerciseClassifier::new(&config);
    let training = classifier.train(&dataset)?;
    println!(
        "✅ Modelo entrenado ({} ventanas). Precisión: {:.3}\n",
        training.rows, training.accuracy
    );

    let classifier = Arc::new(classifier);
    let mut session = ExerciseSession::new(&config, Arc::clone(&classifier))?;

    let samples = load_samples_from_csv(&opts.replay)?;
    println!("🎞️  Reproduciendo {} muestras desde {:?}", samples.len(), opts.replay);
    println!("🎯 Haz: {}\n", session.current_exercise());

    let (tx, rx) = bounded::<(AxisReading, AxisReading)>(100);
    let replay = std::thread::spawn(move || start_replay(samples, tx));

    let tick_period = Duration::try_from_secs_f32(1.0 / config.tick_hz)
        .context("Frecuencia de tick fuera de rango")?;
    let ticker = tick(tick_period);
    let mut last_tick = Instant::now();
    let mut pending: Option<(AxisReading, AxisReading)> = None;
    let mut recorded: Vec<SensorSample> = Vec::new();
    let started = Instant::now();

    loop {
        select! {
            recv(rx) -> msg => {
                match msg {
                    // Como máximo una lectura por tick: se queda la más reciente
                    Ok(readings) => pending = Some(readings),
                    Err(_) => {
                        println!("\n👋 Fin de la reproducción");
                        break;
                    }
                }
            }
            recv(ticker) -> _ => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f32();
                last_tick = now;

                let (acc, gyro) = match pending.take() {
                    Some((acc, gyro)) => {
                        if opts.record.is_some() {
                            let t = started.elapsed().as_secs_f64();
                            recorded.push(SensorSample::from_readings(t, acc, gyro));
                        }
                        (Some(acc), Some(gyro))
                    }
                    None => (None, None),
                };

                match session.tick(dt, acc, gyro) {
                    Ok(Some(output)) => report(&output, opts.json)?,
                    Ok(None) => {}
                    // Error de predicción en vivo: se registra y se mantiene el último estado
                    Err(e) => eprintln!("❌ Error clasificando: {}", e),
                }
            }
        }
    }

    if replay.join().is_err() {
        eprintln!("❌ El hilo de reproducción terminó con pánico");
    }

    if let Some(path) = &opts.record {
        write_samples_to_csv(path, &recorded)?;
        println!("💾 {} muestras guardadas en {:?}", recorded.len(), path);
    }

    let state = session.state();
    println!(
        "📊 Ejercicio actual: {} ({:.1}s correctos)",
        session.current_exercise(),
        state.correct_seconds
    );
    Ok(())
}
