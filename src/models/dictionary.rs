use std::collections::BTreeMap;

use crate::models::sensor::SensorKind;

const ROOM_TYPE_NAMES: [(i64, &str); 10] = [
    (1, "Прихожая"),
    (2, "Гостиная"),
    (3, "Кухня"),
    (4, "Спальня"),
    (5, "Ванная"),
    (6, "Туалет"),
    (7, "Балкон"),
    (8, "Коридор"),
    (9, "Кабинет"),
    (10, "Детская"),
];

/// Immutable id → display-name dictionaries for room and sensor types.
///
/// Built once at startup and injected wherever type ids need resolving;
/// nothing mutates it after construction.
pub struct Dictionaries {
    rooms: BTreeMap<i64, String>,
    sensors: BTreeMap<i64, String>,
}

impl Dictionaries {
    pub fn new() -> Self {
        let rooms = ROOM_TYPE_NAMES
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect();
        let sensors = SensorKind::ALL
            .into_iter()
            .map(|kind| (kind.type_id(), kind.display_name().to_string()))
            .collect();

        Self { rooms, sensors }
    }

    pub fn rooms(&self) -> &BTreeMap<i64, String> {
        &self.rooms
    }

    pub fn sensors(&self) -> &BTreeMap<i64, String> {
        &self.sensors
    }

    pub fn room_type_name(&self, room_type_id: i64) -> Option<&str> {
        self.rooms.get(&room_type_id).map(String::as_str)
    }

    pub fn sensor_kind(&self, sensor_type_id: i64) -> Option<SensorKind> {
        self.sensors
            .contains_key(&sensor_type_id)
            .then(|| SensorKind::from_type_id(sensor_type_id))
            .flatten()
    }
}

impl Default for Dictionaries {
    fn default() -> Self {
        Dictionaries::new()
    }
}
