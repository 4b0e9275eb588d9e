use std::collections::HashMap;
use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};

use crate::models::{Dictionaries, RoomConfig};
use crate::repositories::{RoomRepository, SensorRepository};

/// Turns an approved application's room configuration into persisted room
/// and sensor rows.
///
/// Runs entirely inside the caller's transaction: storage failures bubble up
/// and roll the whole batch back, while entries referencing unknown room or
/// sensor type ids are logged and skipped without aborting the rest.
pub struct ProvisionService {
    dictionaries: Arc<Dictionaries>,
    room_repository: Arc<RoomRepository>,
    sensor_repository: Arc<SensorRepository>,
}

impl ProvisionService {
    pub fn new(
        dictionaries: Arc<Dictionaries>,
        room_repository: Arc<RoomRepository>,
        sensor_repository: Arc<SensorRepository>,
    ) -> Self {
        Self {
            dictionaries,
            room_repository,
            sensor_repository,
        }
    }

    /// Create every requested room with its sensors and return the created
    /// room ids, in input order. Not idempotent: a second call provisions a
    /// second set of rooms.
    pub async fn provision(
        &self,
        transaction: &mut Transaction<'_, Sqlite>,
        rooms_config: &[RoomConfig],
    ) -> Result<Vec<i64>, Error> {
        // One snapshot per batch; rooms of the same type within the batch are
        // disambiguated by the in-batch ordinal alone.
        let pre_existing = self.count_rooms_by_type(transaction).await?;
        let mut batch_ordinals: HashMap<i64, i64> = HashMap::new();
        let mut created_room_ids = Vec::new();

        for entry in rooms_config {
            let Some(base_name) = self.dictionaries.room_type_name(entry.room_type_id) else {
                tracing::warn!(
                    room_type_id = entry.room_type_id,
                    "skipping room entry with unknown room type"
                );
                continue;
            };

            let ordinal = batch_ordinals
                .entry(entry.room_type_id)
                .and_modify(|ordinal| *ordinal += 1)
                .or_insert(1);
            let total = pre_existing.get(&entry.room_type_id).copied().unwrap_or(0) + *ordinal;

            let room_id = self
                .create_room_with_free_name(transaction, base_name, entry.room_type_id, total)
                .await?;

            for &sensor_type_id in &entry.sensor_type_ids {
                let Some(kind) = self.dictionaries.sensor_kind(sensor_type_id) else {
                    tracing::warn!(
                        sensor_type_id,
                        room_id,
                        "skipping sensor entry with unknown sensor type"
                    );
                    continue;
                };

                let sensor_number = self
                    .sensor_repository
                    .next_sensor_number(kind, room_id, transaction)
                    .await?;
                self.sensor_repository
                    .insert_default(kind, room_id, sensor_number, transaction)
                    .await?;
            }

            created_room_ids.push(room_id);
        }

        Ok(created_room_ids)
    }

    /// Attribute every existing room name to a room type and count them.
    async fn count_rooms_by_type(
        &self,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<HashMap<i64, i64>, Error> {
        let names = self.room_repository.all_names(transaction).await?;

        let mut counts = HashMap::new();
        for name in &names {
            if let Some(room_type_id) = attribute_room_type(&self.dictionaries, name) {
                *counts.entry(room_type_id).or_insert(0) += 1;
            }
        }

        Ok(counts)
    }

    /// Insert a room under the first free name following the suffix pattern,
    /// probing upward on collision. The UNIQUE constraint on `rooms.name`
    /// backs the existence check against concurrent inserts.
    async fn create_room_with_free_name(
        &self,
        transaction: &mut Transaction<'_, Sqlite>,
        base_name: &str,
        room_type_id: i64,
        mut total: i64,
    ) -> Result<i64, Error> {
        loop {
            let name = room_name(base_name, total);

            if self
                .room_repository
                .exists_by_name(&name, transaction)
                .await?
            {
                total += 1;
                continue;
            }

            match self
                .room_repository
                .create(&name, room_type_id, transaction)
                .await
            {
                Ok(room_id) => return Ok(room_id),
                Err(Error::Database(e)) if e.is_unique_violation() => {
                    total += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// The first room of a type keeps the bare dictionary name; later ones get a
/// numeric suffix.
fn room_name(base_name: &str, total: i64) -> String {
    if total == 1 {
        base_name.to_string()
    } else {
        format!("{base_name} {total}")
    }
}

/// Match a room name back to its type: either the bare dictionary name or
/// the dictionary name followed by a numeric suffix ("Кухня 2" → "Кухня").
fn attribute_room_type(dictionaries: &Dictionaries, name: &str) -> Option<i64> {
    for (room_type_id, base_name) in dictionaries.rooms() {
        if name == base_name {
            return Some(*room_type_id);
        }

        if let Some(suffix) = name.strip_prefix(base_name.as_str()) {
            if let Some(number) = suffix.strip_prefix(' ') {
                if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
                    return Some(*room_type_id);
                }
            }
        }
    }

    None
}
