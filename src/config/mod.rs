mod settings;

pub use settings::{CONFIG_FILE, CoreConfig, PasswordConfig, SessionConfig};
