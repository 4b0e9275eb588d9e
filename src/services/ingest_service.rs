use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use sqlx::{Sqlite, Transaction};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::errors::{ApiError, SensorError};
use crate::models::sensor::{GasStatus, SensorKind, SensorSnapshot};
use crate::models::Room;
use crate::repositories::SensorRepository;

/// One sensor entry of a device report. Only the fields relevant to the
/// declared type are read; `value` doubles as a fallback for the typed
/// field.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SensorReading {
    pub sensor_number: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Option<f64>,
    pub is_on: Option<bool>,
    pub ppm: Option<f64>,
    pub humidity_level: Option<f64>,
    pub fan_speed: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub trigger_time: Option<OffsetDateTime>,
}

/// Applies device readings onto provisioned sensor rows.
///
/// Rows are addressed by `(room_id, sensor_number)` and upserted: a reading
/// for a not-yet-existing number creates the row, a repeated reading
/// overwrites the type-relevant fields in place. Rooms are never created
/// here.
pub struct IngestService {
    sensor_repository: Arc<SensorRepository>,
}

impl IngestService {
    pub fn new(sensor_repository: Arc<SensorRepository>) -> Self {
        Self { sensor_repository }
    }

    pub async fn apply_reading(
        &self,
        transaction: &mut Transaction<'_, Sqlite>,
        room: &Room,
        reading: &SensorReading,
    ) -> Result<SensorSnapshot, ApiError> {
        let kind = SensorKind::from_str(&reading.kind)
            .map_err(|_| SensorError::UnknownSensorKind(reading.kind.clone()))?;

        let snapshot = match kind {
            SensorKind::Temperature => {
                let value = reading.value.ok_or(SensorError::MissingField {
                    kind: kind.as_str(),
                    field: "value",
                })?;

                let sensor = self
                    .sensor_repository
                    .upsert_temperature(room.id, reading.sensor_number, value, transaction)
                    .await?;

                SensorSnapshot::Temperature(sensor)
            }
            SensorKind::Light => {
                let is_on = reading
                    .is_on
                    .or(reading.value.map(|value| value != 0.0))
                    .ok_or(SensorError::MissingField {
                        kind: kind.as_str(),
                        field: "is_on",
                    })?;

                let sensor = self
                    .sensor_repository
                    .upsert_light(room.id, reading.sensor_number, is_on, transaction)
                    .await?;

                SensorSnapshot::Light(sensor)
            }
            SensorKind::Gas => {
                let ppm = reading
                    .ppm
                    .or(reading.value)
                    .ok_or(SensorError::MissingField {
                        kind: kind.as_str(),
                        field: "ppm",
                    })?;
                let status = GasStatus::from_ppm(ppm);

                let sensor = self
                    .sensor_repository
                    .upsert_gas(room.id, reading.sensor_number, ppm, status, transaction)
                    .await?;

                SensorSnapshot::Gas(sensor)
            }
            SensorKind::Humidity => {
                let humidity_level = reading
                    .humidity_level
                    .or(reading.value)
                    .ok_or(SensorError::MissingField {
                        kind: kind.as_str(),
                        field: "humidity_level",
                    })?;

                let sensor = self
                    .sensor_repository
                    .upsert_humidity(room.id, reading.sensor_number, humidity_level, transaction)
                    .await?;

                SensorSnapshot::Humidity(sensor)
            }
            SensorKind::Ventilation => {
                let fan_speed = reading
                    .fan_speed
                    .or(reading.value)
                    .ok_or(SensorError::MissingField {
                        kind: kind.as_str(),
                        field: "fan_speed",
                    })?;
                let is_on = reading.is_on.ok_or(SensorError::MissingField {
                    kind: kind.as_str(),
                    field: "is_on",
                })?;

                let sensor = self
                    .sensor_repository
                    .upsert_ventilation(
                        room.id,
                        reading.sensor_number,
                        fan_speed,
                        is_on,
                        transaction,
                    )
                    .await?;

                SensorSnapshot::Ventilation(sensor)
            }
            SensorKind::Motion => {
                let trigger_time = reading.trigger_time.unwrap_or_else(OffsetDateTime::now_utc);

                let sensor = self
                    .sensor_repository
                    .upsert_motion(room.id, reading.sensor_number, trigger_time, transaction)
                    .await?;

                SensorSnapshot::Motion(sensor)
            }
        };

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use crate::configs::{Database, SchemaManager, Storage};
    use crate::repositories::RoomRepository;

    use super::*;

    async fn setup() -> (Arc<Storage>, IngestService, Room) {
        let storage = Arc::new(
            Storage::new(
                Database {
                    migration_path: None,
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );

        let room_repository = RoomRepository::new(storage.clone());
        let mut tx = storage.get_pool().begin().await.unwrap();
        let room_id = room_repository.create("Кухня", 3, &mut tx).await.unwrap();
        tx.commit().await.unwrap();
        let room = room_repository.find_by_id(room_id).await.unwrap().unwrap();

        let service = IngestService::new(Arc::new(SensorRepository::new(storage.clone())));

        (storage, service, room)
    }

    fn reading(kind: &str, sensor_number: i64) -> SensorReading {
        SensorReading {
            sensor_number,
            kind: kind.to_string(),
            value: None,
            is_on: None,
            ppm: None,
            humidity_level: None,
            fan_speed: None,
            trigger_time: None,
        }
    }

    #[tokio::test]
    async fn test_temperature_reading_upserts() {
        let (storage, service, room) = setup().await;

        let mut tx = storage.get_pool().begin().await.unwrap();
        let first = service
            .apply_reading(
                &mut tx,
                &room,
                &SensorReading {
                    value: Some(21.5),
                    ..reading("temperature", 1)
                },
            )
            .await
            .unwrap();

        let second = service
            .apply_reading(
                &mut tx,
                &room,
                &SensorReading {
                    value: Some(24.0),
                    ..reading("temperature", 1)
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let (SensorSnapshot::Temperature(first), SensorSnapshot::Temperature(second)) =
            (first, second)
        else {
            panic!("expected temperature snapshots");
        };

        assert_eq!(first.id, second.id);
        assert_eq!(second.value, 24.0);
    }

    #[tokio::test]
    async fn test_gas_reading_derives_status() {
        let (storage, service, room) = setup().await;

        let mut tx = storage.get_pool().begin().await.unwrap();
        let snapshot = service
            .apply_reading(
                &mut tx,
                &room,
                &SensorReading {
                    ppm: Some(1200.0),
                    ..reading("gas", 1)
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let SensorSnapshot::Gas(sensor) = snapshot else {
            panic!("expected gas snapshot");
        };
        assert_eq!(sensor.ppm, 1200.0);
        assert_eq!(sensor.status, GasStatus::Critical.as_str());
    }

    #[tokio::test]
    async fn test_light_falls_back_to_value() {
        let (storage, service, room) = setup().await;

        let mut tx = storage.get_pool().begin().await.unwrap();
        let snapshot = service
            .apply_reading(
                &mut tx,
                &room,
                &SensorReading {
                    value: Some(1.0),
                    ..reading("light", 1)
                },
            )
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let SensorSnapshot::Light(sensor) = snapshot else {
            panic!("expected light snapshot");
        };
        assert!(sensor.is_on);
    }

    #[tokio::test]
    async fn test_unknown_kind_and_missing_fields_are_rejected() {
        let (storage, service, room) = setup().await;

        let mut tx = storage.get_pool().begin().await.unwrap();

        let unknown = service
            .apply_reading(&mut tx, &room, &reading("sound", 1))
            .await;
        assert!(matches!(
            unknown,
            Err(ApiError::SensorError(SensorError::UnknownSensorKind(_)))
        ));

        let missing = service
            .apply_reading(&mut tx, &room, &reading("temperature", 1))
            .await;
        assert!(matches!(
            missing,
            Err(ApiError::SensorError(SensorError::MissingField { .. }))
        ));
    }
}
