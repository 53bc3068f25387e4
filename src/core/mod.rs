pub mod executor;
pub mod history;
pub mod intent;
pub mod names;
pub mod persistence;
pub mod session;
pub mod types;
