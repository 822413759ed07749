#[cfg(feature = "chrome")]
pub mod chrome;
pub mod navigation;
pub mod provider;
#[cfg(feature = "remote")]
pub mod remote;
pub mod session;

#[cfg(feature = "chrome")]
pub use chrome::ChromeDriver;
pub use navigation::Navigation;
pub use provider::DriverProvider;
#[cfg(feature = "remote")]
pub use remote::RemoteDriver;
pub use session::Browser;
