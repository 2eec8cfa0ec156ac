pub mod adapters;
pub mod app;
pub mod command;
pub mod config;
pub mod controllers;
pub mod error;
pub mod router;
pub mod session;
pub mod sync;
pub mod view;

pub use app::App;
pub use config::Config;
pub use error::AppError;
