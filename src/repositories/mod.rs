mod application;
mod room;
mod sensor;
mod user;

pub use application::ApplicationRepository;
pub use room::RoomRepository;
pub use sensor::SensorRepository;
pub use user::UserRepository;
