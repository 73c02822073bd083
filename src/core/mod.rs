pub mod config;
pub mod driver;

pub use config::{BrowserKind, HarnessConfig, TestEnvironment};
pub use driver::{DriverOps, Locator};
