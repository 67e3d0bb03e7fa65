pub mod load;
pub mod save;
pub mod types;

pub use types::{Config, DetectorSettings, EncoderSettings, UserSettings};
