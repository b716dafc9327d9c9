pub mod constants;
pub mod events;
pub mod listener;
pub mod measurement;
pub mod sdk;
pub mod types;
pub mod user;
