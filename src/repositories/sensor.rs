use std::sync::Arc;

use sqlx::{Error, Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::sensor::{
    GasSensor, GasStatus, HumiditySensor, LightSensor, MotionSensor, SensorKind, TemperatureSensor,
    VentilationSensor,
};

pub struct SensorRepository {
    storage: Arc<Storage>,
}

impl SensorRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }

    /// Next free per-room sequence number for one sensor kind: max + 1,
    /// starting at 1. Holes left by removed sensors are not refilled.
    pub async fn next_sensor_number(
        &self,
        kind: SensorKind,
        room_id: i64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let number: i64 = sqlx::query_scalar(&format!(
            "SELECT COALESCE(MAX(sensor_number), 0) + 1 FROM {} WHERE room_id = $1",
            kind.table()
        ))
        .bind(room_id)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(number)
    }

    /// Insert a freshly provisioned sensor with the kind's default values.
    pub async fn insert_default(
        &self,
        kind: SensorKind,
        room_id: i64,
        sensor_number: i64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        match kind {
            SensorKind::Temperature => {
                sqlx::query(
                    "INSERT INTO temperature_sensors (room_id, sensor_number, value) VALUES ($1, $2, $3)",
                )
                .bind(room_id)
                .bind(sensor_number)
                .bind(20.0_f64) // room temperature
                .execute(&mut **transaction)
                .await?;
            }
            SensorKind::Light => {
                sqlx::query(
                    "INSERT INTO light_sensors (room_id, sensor_number, is_on) VALUES ($1, $2, FALSE)",
                )
                .bind(room_id)
                .bind(sensor_number)
                .execute(&mut **transaction)
                .await?;
            }
            SensorKind::Gas => {
                sqlx::query(
                    "INSERT INTO gas_sensors (room_id, sensor_number, ppm, status) VALUES ($1, $2, $3, $4)",
                )
                .bind(room_id)
                .bind(sensor_number)
                .bind(400.0_f64) // baseline CO2 level
                .bind(GasStatus::OutdoorAir.as_str())
                .execute(&mut **transaction)
                .await?;
            }
            SensorKind::Humidity => {
                sqlx::query(
                    "INSERT INTO humidity_sensors (room_id, sensor_number, humidity_level) VALUES ($1, $2, $3)",
                )
                .bind(room_id)
                .bind(sensor_number)
                .bind(50.0_f64) // comfortable humidity
                .execute(&mut **transaction)
                .await?;
            }
            SensorKind::Ventilation => {
                sqlx::query(
                    "INSERT INTO ventilation_sensors (room_id, sensor_number, fan_speed, is_on) VALUES ($1, $2, 0.0, FALSE)",
                )
                .bind(room_id)
                .bind(sensor_number)
                .execute(&mut **transaction)
                .await?;
            }
            SensorKind::Motion => {
                sqlx::query(
                    "INSERT INTO motion_sensors (room_id, sensor_number, trigger_time) VALUES ($1, $2, $3)",
                )
                .bind(room_id)
                .bind(sensor_number)
                .bind(OffsetDateTime::now_utc())
                .execute(&mut **transaction)
                .await?;
            }
        }

        Ok(())
    }

    pub async fn count_by_room(&self, kind: SensorKind, room_id: i64) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE room_id = $1",
            kind.table()
        ))
        .bind(room_id)
        .fetch_one(self.storage.get_pool())
        .await?;

        Ok(count)
    }

    pub async fn upsert_temperature(
        &self,
        room_id: i64,
        sensor_number: i64,
        value: f64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<TemperatureSensor, Error> {
        let sensor: TemperatureSensor = sqlx::query_as(
            r#"
            INSERT INTO temperature_sensors (room_id, sensor_number, value)
                VALUES ($1, $2, $3)
                ON CONFLICT (room_id, sensor_number) DO UPDATE SET value = excluded.value
                RETURNING *;
            "#,
        )
        .bind(room_id)
        .bind(sensor_number)
        .bind(value)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(sensor)
    }

    pub async fn upsert_light(
        &self,
        room_id: i64,
        sensor_number: i64,
        is_on: bool,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<LightSensor, Error> {
        let sensor: LightSensor = sqlx::query_as(
            r#"
            INSERT INTO light_sensors (room_id, sensor_number, is_on)
                VALUES ($1, $2, $3)
                ON CONFLICT (room_id, sensor_number) DO UPDATE SET is_on = excluded.is_on
                RETURNING *;
            "#,
        )
        .bind(room_id)
        .bind(sensor_number)
        .bind(is_on)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(sensor)
    }

    pub async fn upsert_gas(
        &self,
        room_id: i64,
        sensor_number: i64,
        ppm: f64,
        status: GasStatus,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<GasSensor, Error> {
        let sensor: GasSensor = sqlx::query_as(
            r#"
            INSERT INTO gas_sensors (room_id, sensor_number, ppm, status)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (room_id, sensor_number)
                    DO UPDATE SET ppm = excluded.ppm, status = excluded.status
                RETURNING *;
            "#,
        )
        .bind(room_id)
        .bind(sensor_number)
        .bind(ppm)
        .bind(status.as_str())
        .fetch_one(&mut **transaction)
        .await?;

        Ok(sensor)
    }

    pub async fn upsert_humidity(
        &self,
        room_id: i64,
        sensor_number: i64,
        humidity_level: f64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<HumiditySensor, Error> {
        let sensor: HumiditySensor = sqlx::query_as(
            r#"
            INSERT INTO humidity_sensors (room_id, sensor_number, humidity_level)
                VALUES ($1, $2, $3)
                ON CONFLICT (room_id, sensor_number)
                    DO UPDATE SET humidity_level = excluded.humidity_level
                RETURNING *;
            "#,
        )
        .bind(room_id)
        .bind(sensor_number)
        .bind(humidity_level)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(sensor)
    }

    pub async fn upsert_ventilation(
        &self,
        room_id: i64,
        sensor_number: i64,
        fan_speed: f64,
        is_on: bool,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<VentilationSensor, Error> {
        let sensor: VentilationSensor = sqlx::query_as(
            r#"
            INSERT INTO ventilation_sensors (room_id, sensor_number, fan_speed, is_on)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (room_id, sensor_number)
                    DO UPDATE SET fan_speed = excluded.fan_speed, is_on = excluded.is_on
                RETURNING *;
            "#,
        )
        .bind(room_id)
        .bind(sensor_number)
        .bind(fan_speed)
        .bind(is_on)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(sensor)
    }

    pub async fn upsert_motion(
        &self,
        room_id: i64,
        sensor_number: i64,
        trigger_time: OffsetDateTime,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<MotionSensor, Error> {
        let sensor: MotionSensor = sqlx::query_as(
            r#"
            INSERT INTO motion_sensors (room_id, sensor_number, trigger_time)
                VALUES ($1, $2, $3)
                ON CONFLICT (room_id, sensor_number)
                    DO UPDATE SET trigger_time = excluded.trigger_time
                RETURNING *;
            "#,
        )
        .bind(room_id)
        .bind(sensor_number)
        .bind(trigger_time)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(sensor)
    }

    pub async fn list_temperature(&self, room_id: i64) -> Result<Vec<TemperatureSensor>, Error> {
        let sensors: Vec<TemperatureSensor> = sqlx::query_as(
            "SELECT * FROM temperature_sensors WHERE room_id = $1 ORDER BY sensor_number",
        )
        .bind(room_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(sensors)
    }

    pub async fn list_light(&self, room_id: i64) -> Result<Vec<LightSensor>, Error> {
        let sensors: Vec<LightSensor> =
            sqlx::query_as("SELECT * FROM light_sensors WHERE room_id = $1 ORDER BY sensor_number")
                .bind(room_id)
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(sensors)
    }

    pub async fn list_gas(&self, room_id: i64) -> Result<Vec<GasSensor>, Error> {
        let sensors: Vec<GasSensor> =
            sqlx::query_as("SELECT * FROM gas_sensors WHERE room_id = $1 ORDER BY sensor_number")
                .bind(room_id)
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(sensors)
    }

    pub async fn list_humidity(&self, room_id: i64) -> Result<Vec<HumiditySensor>, Error> {
        let sensors: Vec<HumiditySensor> = sqlx::query_as(
            "SELECT * FROM humidity_sensors WHERE room_id = $1 ORDER BY sensor_number",
        )
        .bind(room_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(sensors)
    }

    pub async fn list_ventilation(&self, room_id: i64) -> Result<Vec<VentilationSensor>, Error> {
        let sensors: Vec<VentilationSensor> = sqlx::query_as(
            "SELECT * FROM ventilation_sensors WHERE room_id = $1 ORDER BY sensor_number",
        )
        .bind(room_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(sensors)
    }

    pub async fn list_motion(&self, room_id: i64) -> Result<Vec<MotionSensor>, Error> {
        let sensors: Vec<MotionSensor> =
            sqlx::query_as("SELECT * FROM motion_sensors WHERE room_id = $1 ORDER BY sensor_number")
                .bind(room_id)
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(sensors)
    }
}
