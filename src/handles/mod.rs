mod application_handle;
mod auth_handle;
mod room_handle;
mod sensor_handle;
mod telemetry_handle;
mod user_handle;

pub use application_handle::*;
pub use auth_handle::*;
pub use room_handle::*;
pub use sensor_handle::*;
pub use telemetry_handle::*;
pub use user_handle::*;
