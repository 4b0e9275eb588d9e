mod auth_service;
mod ingest_service;
mod provision_service;
mod token_service;

pub use auth_service::*;
pub use ingest_service::*;
pub use provision_service::*;
pub use token_service::*;
