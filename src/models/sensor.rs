use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// The closed set of sensor kinds the system provisions and ingests.
///
/// Per-kind behavior (backing table, dictionary id, default row values,
/// which reading fields apply) hangs off this type so callers dispatch once
/// instead of branching on strings everywhere.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Light,
    Gas,
    Humidity,
    Ventilation,
    Motion,
}

impl SensorKind {
    pub const ALL: [SensorKind; 6] = [
        SensorKind::Temperature,
        SensorKind::Light,
        SensorKind::Gas,
        SensorKind::Humidity,
        SensorKind::Ventilation,
        SensorKind::Motion,
    ];

    /// Numeric id used by the sensor-type dictionary and application configs.
    pub fn type_id(&self) -> i64 {
        match self {
            SensorKind::Temperature => 1,
            SensorKind::Light => 2,
            SensorKind::Gas => 3,
            SensorKind::Humidity => 4,
            SensorKind::Ventilation => 5,
            SensorKind::Motion => 6,
        }
    }

    pub fn from_type_id(id: i64) -> Option<SensorKind> {
        SensorKind::ALL.into_iter().find(|kind| kind.type_id() == id)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Light => "light",
            SensorKind::Gas => "gas",
            SensorKind::Humidity => "humidity",
            SensorKind::Ventilation => "ventilation",
            SensorKind::Motion => "motion",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature_sensors",
            SensorKind::Light => "light_sensors",
            SensorKind::Gas => "gas_sensors",
            SensorKind::Humidity => "humidity_sensors",
            SensorKind::Ventilation => "ventilation_sensors",
            SensorKind::Motion => "motion_sensors",
        }
    }

    /// Dictionary display name shown to the mobile client.
    pub fn display_name(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "Датчик температуры",
            SensorKind::Light => "Датчик освещения",
            SensorKind::Gas => "Датчик газа",
            SensorKind::Humidity => "Датчик влажности",
            SensorKind::Ventilation => "Датчик вентиляции",
            SensorKind::Motion => "Датчик движения",
        }
    }
}

impl std::str::FromStr for SensorKind {
    type Err = ();

    fn from_str(input: &str) -> Result<SensorKind, Self::Err> {
        SensorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == input)
            .ok_or(())
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gas concentration bucket derived from a CO2 ppm reading.
///
/// Thresholds follow the four-tier table with `<=` boundaries: a reading
/// exactly at a boundary resolves to the lower bucket.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasStatus {
    OutdoorAir,
    Recommended,
    Critical,
    Lethal,
}

impl GasStatus {
    pub fn from_ppm(ppm: f64) -> GasStatus {
        if ppm <= 400.0 {
            GasStatus::OutdoorAir
        } else if ppm <= 1000.0 {
            GasStatus::Recommended
        } else if ppm <= 1500.0 {
            GasStatus::Critical
        } else {
            GasStatus::Lethal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GasStatus::OutdoorAir => "уличный воздух",
            GasStatus::Recommended => "рекомендованная концентрация",
            GasStatus::Critical => "предельная концентрация",
            GasStatus::Lethal => "смертельная концентрация",
        }
    }
}

impl std::fmt::Display for GasStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct TemperatureSensor {
    pub id: i64,
    pub room_id: i64,
    pub sensor_number: i64,
    pub value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct LightSensor {
    pub id: i64,
    pub room_id: i64,
    pub sensor_number: i64,
    pub is_on: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct GasSensor {
    pub id: i64,
    pub room_id: i64,
    pub sensor_number: i64,
    pub ppm: f64,
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct HumiditySensor {
    pub id: i64,
    pub room_id: i64,
    pub sensor_number: i64,
    pub humidity_level: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct VentilationSensor {
    pub id: i64,
    pub room_id: i64,
    pub sensor_number: i64,
    pub fan_speed: f64,
    pub is_on: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct MotionSensor {
    pub id: i64,
    pub room_id: i64,
    pub sensor_number: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub trigger_time: OffsetDateTime,
}

/// One sensor row of any kind, as returned by ingestion.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SensorSnapshot {
    Temperature(TemperatureSensor),
    Light(LightSensor),
    Gas(GasSensor),
    Humidity(HumiditySensor),
    Ventilation(VentilationSensor),
    Motion(MotionSensor),
}

pub struct TemperatureSensorTable;

impl Table for TemperatureSensorTable {
    fn name(&self) -> &'static str {
        "temperature_sensors"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS temperature_sensors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                sensor_number INTEGER NOT NULL,
                value REAL NOT NULL,
                UNIQUE (room_id, sensor_number),
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS temperature_sensors;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rooms"]
    }
}

pub struct LightSensorTable;

impl Table for LightSensorTable {
    fn name(&self) -> &'static str {
        "light_sensors"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS light_sensors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                sensor_number INTEGER NOT NULL,
                is_on BOOLEAN NOT NULL,
                UNIQUE (room_id, sensor_number),
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS light_sensors;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rooms"]
    }
}

pub struct GasSensorTable;

impl Table for GasSensorTable {
    fn name(&self) -> &'static str {
        "gas_sensors"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS gas_sensors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                sensor_number INTEGER NOT NULL,
                ppm REAL NOT NULL,
                status TEXT NOT NULL,
                UNIQUE (room_id, sensor_number),
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS gas_sensors;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rooms"]
    }
}

pub struct HumiditySensorTable;

impl Table for HumiditySensorTable {
    fn name(&self) -> &'static str {
        "humidity_sensors"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS humidity_sensors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                sensor_number INTEGER NOT NULL,
                humidity_level REAL NOT NULL,
                UNIQUE (room_id, sensor_number),
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS humidity_sensors;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rooms"]
    }
}

pub struct VentilationSensorTable;

impl Table for VentilationSensorTable {
    fn name(&self) -> &'static str {
        "ventilation_sensors"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS ventilation_sensors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                sensor_number INTEGER NOT NULL,
                fan_speed REAL NOT NULL,
                is_on BOOLEAN NOT NULL,
                UNIQUE (room_id, sensor_number),
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS ventilation_sensors;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rooms"]
    }
}

pub struct MotionSensorTable;

impl Table for MotionSensorTable {
    fn name(&self) -> &'static str {
        "motion_sensors"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS motion_sensors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                sensor_number INTEGER NOT NULL,
                trigger_time DATETIME NOT NULL,
                UNIQUE (room_id, sensor_number),
                FOREIGN KEY (room_id) REFERENCES rooms (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS motion_sensors;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["rooms"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_status_boundaries() {
        assert_eq!(GasStatus::from_ppm(0.0), GasStatus::OutdoorAir);
        assert_eq!(GasStatus::from_ppm(400.0), GasStatus::OutdoorAir);
        assert_eq!(GasStatus::from_ppm(400.1), GasStatus::Recommended);
        assert_eq!(GasStatus::from_ppm(1000.0), GasStatus::Recommended);
        assert_eq!(GasStatus::from_ppm(1000.1), GasStatus::Critical);
        assert_eq!(GasStatus::from_ppm(1500.0), GasStatus::Critical);
        assert_eq!(GasStatus::from_ppm(1500.1), GasStatus::Lethal);
    }

    #[test]
    fn test_sensor_kind_type_ids_round_trip() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorKind::from_type_id(kind.type_id()), Some(kind));
        }
        assert_eq!(SensorKind::from_type_id(0), None);
        assert_eq!(SensorKind::from_type_id(7), None);
    }
}
