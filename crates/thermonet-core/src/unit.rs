//! Degree units and temperature conversion.

/// Offset between kelvin and Celsius used by the protocol.
///
/// The protocol uses the integer offset 273, not 273.15. Clients convert with
/// the same constant, so changing it would shift every reported reading.
pub const KELVIN_OFFSET: f64 = 273.0;

/// Unit applied to `GET_TEMP` replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegreeUnit {
    /// Raw kelvin (the cached reading, unconverted).
    #[default]
    Kelvin,
    /// Degrees Celsius.
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl DegreeUnit {
    /// Parse a one-letter unit symbol (`K`, `C` or `F`).
    ///
    /// Anything else silently selects [`DegreeUnit::Kelvin`]. Callers rely on
    /// the setter never failing, so the fallback is intentional.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "C" => Self::Celsius,
            "F" => Self::Fahrenheit,
            _ => Self::Kelvin,
        }
    }

    /// One-letter symbol for this unit.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Kelvin => "K",
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    /// Convert a kelvin reading into this unit.
    pub fn convert(self, kelvin: f64) -> f64 {
        match self {
            Self::Kelvin => kelvin,
            Self::Celsius => kelvin - KELVIN_OFFSET,
            Self::Fahrenheit => (kelvin - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0,
        }
    }
}

impl std::fmt::Display for DegreeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
