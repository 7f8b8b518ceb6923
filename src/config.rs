use crate::data_sync::{ExchangeConfig, RatesConfig};
use crate::logic::{ScannerBuilder, ScannerConfig};
use crate::utils::config_loader::{ConfigSectionLoader, ConfigSectionLoaderSync, LoadConfigError, load_from_file, load_from_file_sync};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

/// The whole scanner configuration file.
#[derive(Clone, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ScannerConfigRoot {
    #[serde(default)]
    pub scanner: ScannerConfig,
    pub rates: Option<RatesConfig>,
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
}

impl ScannerConfigRoot {
    pub async fn load(file_name: String) -> Result<Self, LoadConfigError> {
        load_from_file(file_name).await
    }

    pub fn load_sync(file_name: String) -> Result<Self, LoadConfigError> {
        load_from_file_sync(file_name)
    }

    /// Builder with every configured exchange and the rate converter. `SCANNER_*` environment
    /// variables override the `[scanner]` section.
    pub fn into_builder(self) -> eyre::Result<ScannerBuilder> {
        let scanner = self.scanner.with_env_overrides()?;
        let mut builder = ScannerBuilder::new().with_config(scanner);
        for exchange in &self.exchanges {
            builder = builder.with_boxed_exchange(exchange.build()?);
        }
        if let Some(rates) = &self.rates {
            let converter = rates.build()?;
            info!(quote_asset = converter.quote_asset(), quote_amount = converter.quote_amount(), "Rate converter configured");
            builder = builder.with_rate_converter(converter);
        }
        info!(exchanges = self.exchanges.len(), "Scanner configuration loaded");
        Ok(builder)
    }
}

#[async_trait]
impl ConfigSectionLoader for ScannerConfig {
    type SectionType = ScannerConfig;

    async fn load_section_from_file(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: ScannerConfigRoot = load_from_file(file_name).await?;
        Ok(root.scanner)
    }
}

impl ConfigSectionLoaderSync for ScannerConfig {
    type SectionType = ScannerConfig;

    fn load_section_from_file_sync(file_name: String) -> Result<Self::SectionType, LoadConfigError> {
        let root: ScannerConfigRoot = load_from_file_sync(file_name)?;
        Ok(root.scanner)
    }
}
