#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod cancel;
pub mod components;
pub mod metrics;
pub mod presenter;
pub mod process;
pub mod schedule;
pub use app::TaskManagerApp;
