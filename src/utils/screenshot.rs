use crate::core::driver::WebDriver;
use crate::errors::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::debug;

pub struct ScreenshotManager;

impl ScreenshotManager {
    pub async fn take_base64(driver: &dyn WebDriver) -> Result<String> {
        let bytes = driver.screenshot().await?;
        Ok(STANDARD.encode(bytes))
    }

    /// Writes a PNG of the current viewport to `path`.
    pub async fn save_to_file(driver: &dyn WebDriver, path: impl AsRef<Path>) -> Result<()> {
        let bytes = driver.screenshot().await?;
        debug!(path = %path.as_ref().display(), bytes = bytes.len(), "saving screenshot");
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDriver;

    #[tokio::test]
    async fn base64_screenshot_decodes_to_png() {
        let driver = MockDriver::new();
        let encoded = ScreenshotManager::take_base64(&driver).await.unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(&decoded[1..4], b"PNG");
    }

    #[tokio::test]
    async fn saves_to_disk() {
        let driver = MockDriver::new();
        let path = std::env::temp_dir().join(format!("shot-{}.png", uuid::Uuid::new_v4()));
        ScreenshotManager::save_to_file(&driver, &path).await.unwrap();
        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written.len(), 8);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
