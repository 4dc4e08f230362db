pub mod catalog;
pub mod config;
pub mod headless;
pub mod stage;
pub mod telemetry;
pub mod terminal;
pub mod view;

pub use catalog::Catalog;
pub use config::{Config, Mode};
pub use stage::Stage;
