pub mod error;
pub mod intake;
pub mod routes;
