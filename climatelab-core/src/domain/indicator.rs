use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three climate indicators. Each names one data source and one field of
/// the merged record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    TemperatureAnomaly,
    Co2Emissions,
    SeaLevel,
}

impl Indicator {
    /// Canonical ordering used everywhere a deterministic order matters
    /// (record layout, correlation matrix rows, error reporting).
    pub const ALL: [Indicator; 3] = [
        Indicator::TemperatureAnomaly,
        Indicator::Co2Emissions,
        Indicator::SeaLevel,
    ];

    /// The three unordered pairs, in matrix order.
    pub const PAIRS: [(Indicator, Indicator); 3] = [
        (Indicator::TemperatureAnomaly, Indicator::Co2Emissions),
        (Indicator::TemperatureAnomaly, Indicator::SeaLevel),
        (Indicator::Co2Emissions, Indicator::SeaLevel),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::TemperatureAnomaly => "temperature_anomaly",
            Indicator::Co2Emissions => "co2_emissions",
            Indicator::SeaLevel => "sea_level",
        }
    }

    /// Human-readable chart label including the unit.
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::TemperatureAnomaly => "Temperature Anomaly (°C)",
            Indicator::Co2Emissions => "CO2 Emissions (million tonnes)",
            Indicator::SeaLevel => "Sea Level (inches)",
        }
    }

    /// Position of this indicator in [`Indicator::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Indicator::TemperatureAnomaly => 0,
            Indicator::Co2Emissions => 1,
            Indicator::SeaLevel => 2,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature_anomaly" | "temperature" | "temp" => Ok(Indicator::TemperatureAnomaly),
            "co2_emissions" | "co2" => Ok(Indicator::Co2Emissions),
            "sea_level" | "sea-level" | "sealevel" => Ok(Indicator::SeaLevel),
            other => Err(format!(
                "unknown indicator '{other}' (expected temperature, co2 or sea_level)"
            )),
        }
    }
}
