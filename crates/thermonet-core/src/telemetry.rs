//! Telemetry source capability.
//!
//! The physical model behind a sensor lives outside this crate. An endpoint
//! only needs something it can ask for the current reading in kelvin.

/// Provider of kelvin temperature readings.
pub trait TelemetrySource: Send {
    /// Current reading in kelvin.
    fn temperature(&mut self) -> f64;
}

impl<F> TelemetrySource for F
where
    F: FnMut() -> f64 + Send,
{
    fn temperature(&mut self) -> f64 {
        self()
    }
}

/// Source that always reports the same reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSource {
    kelvin: f64,
}

impl FixedSource {
    /// Create a source pinned at `kelvin`.
    pub fn new(kelvin: f64) -> Self {
        Self { kelvin }
    }
}

impl TelemetrySource for FixedSource {
    fn temperature(&mut self) -> f64 {
        self.kelvin
    }
}
