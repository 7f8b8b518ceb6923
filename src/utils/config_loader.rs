use async_trait::async_trait;
use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::{env, fs};
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),
    #[error("Error loading config: {0}")]
    ConfigError(String),
}

#[async_trait]
pub trait ConfigSectionLoader {
    type SectionType;

    async fn load_section_from_file(file_name: String) -> Result<Self::SectionType, LoadConfigError>;
}

pub trait ConfigSectionLoaderSync {
    type SectionType;

    fn load_section_from_file_sync(file_name: String) -> Result<Self::SectionType, LoadConfigError>;
}

pub async fn load_from_file<T: DeserializeOwned>(file_name: String) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    load_from_str(&contents)
}

pub fn load_from_file_sync<T: DeserializeOwned>(file_name: String) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = fs::read_to_string(file_name)?;
    load_from_str(&contents)
}

pub fn load_from_str<T: DeserializeOwned>(raw_config: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(raw_config)?;
    let config: T = toml::from_str(&contents)?;
    Ok(config)
}

/// Replace `${NAME}` with the value of the environment variable. Unknown variables are left as is.
fn expand_vars(raw_config: &str) -> Result<String, LoadConfigError> {
    expand_vars_with(raw_config, |name| env::var(name).ok())
}

fn expand_vars_with(raw_config: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String, LoadConfigError> {
    let re = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}")?;
    Ok(re
        .replace_all(raw_config, |caps: &Captures| match lookup(&caps[1]) {
            Some(val) => val,
            None => caps[0].to_string(),
        })
        .to_string())
}
