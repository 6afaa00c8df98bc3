/// Lectura de un sensor de 3 ejes tal como llega del transporte: {x, y, z}
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisReading {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisReading {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Canales de una muestra, en el orden fijo usado por las features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    AccX,
    AccY,
    AccZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Axis {
    pub const ALL: [Axis; NUM_AXES] = [
        Axis::AccX,
        Axis::AccY,
        Axis::AccZ,
        Axis::GyroX,
        Axis::GyroY,
        Axis::GyroZ,
    ];

    /// Nombre de columna en los CSV de entrenamiento
    pub fn name(&self) -> &'static str {
        match self {
            Axis::AccX => "acc_x",
            Axis::AccY => "acc_y",
            Axis::AccZ => "acc_z",
            Axis::GyroX => "gyro_x",
            Axis::GyroY => "gyro_y",
            Axis::GyroZ => "gyro_z",
        }
    }
}

/// Una muestra cruda: timestamp (s), aceleración lineal y velocidad angular
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSample {
    pub timestamp: f64,
    pub acc: [f32; 3],
    pub gyro: [f32; 3],
}

impl SensorSample {
    pub fn new(timestamp: f64, acc: [f32; 3], gyro: [f32; 3]) -> Self {
        Self { timestamp, acc, gyro }
    }

    /// Construye una muestra a partir de un par de lecturas en vivo
    pub fn from_readings(timestamp: f64, acc: AxisReading, gyro: AxisReading) -> Self {
        Self {
            timestamp,
            acc: acc.as_array(),
            gyro: gyro.as_array(),
        }
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::AccX => self.acc[0],
            Axis::AccY => self.acc[1],
            Axis::AccZ => self.acc[2],
            Axis::GyroX => self.gyro[0],
            Axis::GyroY => self.gyro[1],
            Axis::GyroZ => self.gyro[2],
        }
    }

    pub fn has_nan(&self) -> bool {
        self.acc.iter().chain(self.gyro.iter()).any(|v| v.is_nan()) || self.timestamp.is_nan()
    }
}

/// Ventana: secuencia ordenada de W muestras (~1 ejecución de un ejercicio)
pub type SensorWindow = Vec<SensorSample>;

/// Constantes del sistema
pub const NUM_AXES: usize = 6;
pub const STATS_PER_AXIS: usize = 3; // mean, std, energy
pub const TOTAL_FEATURES: usize = NUM_AXES * STATS_PER_AXIS; // 18
pub const DEFAULT_WINDOW_SIZE: usize = 50;
pub const UNKNOWN_LABEL: &str = "unknown";

/// Cabecera de los CSV de entrenamiento
pub const CSV_HEADERS: [&str; 8] = [
    "id", "timestamp", "acc_x", "acc_y", "acc_z", "gyro_x", "gyro_y", "gyro_z",
];
