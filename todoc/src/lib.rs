mod app;
pub mod cache;
pub mod cli;
mod error;
pub mod logging;
pub mod onboarding;
pub mod services;

pub use app::App;
pub use error::AppError;
