use crate::core::config::{BrowserConfig, Capabilities, Config};
use crate::core::driver::Driver;
use crate::errors::Result;
use std::fmt;
#[cfg(any(not(feature = "remote"), not(feature = "chrome")))]
use crate::errors::BrowserError;

/// Where a session's executor comes from.
#[derive(Debug, Clone)]
pub enum DriverProvider {
    /// A WebDriver server (hub or standalone driver) reachable over HTTP.
    Hosted {
        address: String,
        capabilities: Capabilities,
    },
    /// A Chrome launched and driven locally.
    Chrome(BrowserConfig),
}

impl DriverProvider {
    /// `direct_connect` wins over a configured server address.
    pub fn from_config(config: &Config) -> Self {
        match &config.browser.selenium_address {
            Some(address) if !config.browser.direct_connect => DriverProvider::Hosted {
                address: address.clone(),
                capabilities: config.browser.capabilities.clone(),
            },
            _ => DriverProvider::Chrome(config.browser.clone()),
        }
    }

    pub async fn provision(&self) -> Result<Driver> {
        match self {
            DriverProvider::Hosted {
                address,
                capabilities,
            } => Self::hosted(address, capabilities).await,
            DriverProvider::Chrome(config) => Self::chrome(config),
        }
    }

    #[cfg(feature = "remote")]
    async fn hosted(address: &str, capabilities: &Capabilities) -> Result<Driver> {
        let driver = super::remote::RemoteDriver::connect(address, capabilities).await?;
        Ok(std::sync::Arc::new(driver))
    }

    #[cfg(not(feature = "remote"))]
    async fn hosted(address: &str, _capabilities: &Capabilities) -> Result<Driver> {
        Err(BrowserError::NotSupported(format!(
            "{} requires the `remote` feature",
            address
        )))
    }

    #[cfg(feature = "chrome")]
    fn chrome(config: &BrowserConfig) -> Result<Driver> {
        let driver = super::chrome::ChromeDriver::launch(config)?;
        Ok(std::sync::Arc::new(driver))
    }

    #[cfg(not(feature = "chrome"))]
    fn chrome(_config: &BrowserConfig) -> Result<Driver> {
        Err(BrowserError::NotSupported(
            "local chrome requires the `chrome` feature".to_string(),
        ))
    }
}

impl fmt::Display for DriverProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverProvider::Hosted {
                address,
                capabilities,
            } => write!(f, "hosted {} at {}", capabilities.browser_name, address),
            DriverProvider::Chrome(config) if config.headless => f.write_str("local chrome (headless)"),
            DriverProvider::Chrome(_) => f.write_str("local chrome"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_selects_hosted_provider() {
        let mut config = Config::default();
        config.browser.selenium_address = Some("http://localhost:4444".into());
        let provider = DriverProvider::from_config(&config);
        assert!(matches!(provider, DriverProvider::Hosted { ref address, .. } if address == "http://localhost:4444"));
        assert_eq!(provider.to_string(), "hosted chrome at http://localhost:4444");
    }

    #[test]
    fn direct_connect_and_no_address_launch_chrome() {
        let config = Config::default();
        assert!(matches!(
            DriverProvider::from_config(&config),
            DriverProvider::Chrome(_)
        ));

        let mut config = Config::default();
        config.browser.selenium_address = Some("http://localhost:4444".into());
        config.browser.direct_connect = true;
        let provider = DriverProvider::from_config(&config);
        assert_eq!(provider.to_string(), "local chrome (headless)");
    }
}
