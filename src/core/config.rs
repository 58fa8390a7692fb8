mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{AssessmentMode, ConfigError, Environment, Settings};
