pub mod application;
pub mod dictionary;
pub mod room;
pub mod sensor;
pub mod user;

pub use application::{Application, ApplicationStatus, ApplicationView, RoomConfig};
pub use dictionary::Dictionaries;
pub use room::Room;
pub use sensor::{
    GasSensor, GasStatus, HumiditySensor, LightSensor, MotionSensor, SensorKind, SensorSnapshot,
    TemperatureSensor, VentilationSensor,
};
pub use user::{Role, User, UserOverview};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
