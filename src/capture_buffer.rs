use crate::types::{AxisReading, SensorSample, SensorWindow};

/// Buffer circular de capacidad fija: un arreglo más un cursor de escritura.
/// Al llenarse, cada push sobrescribe el elemento más antiguo.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    /// Próxima posición a escribir
    write_index: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity.max(1)],
            write_index: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        let capacity = self.data.len();
        self.data[self.write_index] = value;
        self.write_index = (self.write_index + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Elementos en orden cronológico, del más antiguo al más reciente
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let capacity = self.data.len();
        let start = (self.write_index + capacity - self.len) % capacity;
        (0..self.len).map(move |i| &self.data[(start + i) % capacity])
    }

    pub fn clear(&mut self) {
        self.write_index = 0;
        self.len = 0;
    }
}

/// Buffers de captura por grupo de ejes (acelerómetro y giroscopio) de W muestras
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    acc: RingBuffer<AxisReading>,
    gyro: RingBuffer<AxisReading>,
    timestamps: RingBuffer<f64>,
}

impl CaptureBuffer {
    pub fn new(window_size: usize) -> Self {
        Self {
            acc: RingBuffer::new(window_size),
            gyro: RingBuffer::new(window_size),
            timestamps: RingBuffer::new(window_size),
        }
    }

    /// Añade un par de lecturas. Si falta alguna no se añade nada:
    /// nunca se rellenan huecos con ceros.
    pub fn push(
        &mut self,
        timestamp: f64,
        acc: Option<AxisReading>,
        gyro: Option<AxisReading>,
    ) -> bool {
        match (acc, gyro) {
            (Some(acc), Some(gyro)) => {
                self.acc.push(acc);
                self.gyro.push(gyro);
                self.timestamps.push(timestamp);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// Hay una ventana completa de W muestras
    pub fn is_ready(&self) -> bool {
        self.acc.is_full()
    }

    /// Ventana más reciente en orden cronológico, o None si aún no está llena
    pub fn window(&self) -> Option<SensorWindow> {
        if !self.is_ready() {
            return None;
        }
        Some(
            self.timestamps
                .iter()
                .zip(self.acc.iter().zip(self.gyro.iter()))
                .map(|(&t, (&acc, &gyro))| SensorSample::from_readings(t, acc, gyro))
                .collect(),
        )
    }

    pub fn clear(&mut self) {
        self.acc.clear();
        self.gyro.clear();
        self.timestamps.clear();
    }
}
