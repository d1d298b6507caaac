pub mod config;
pub mod parameter;
mod session;
pub mod types;

pub use session::Session;
