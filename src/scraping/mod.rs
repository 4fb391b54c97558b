pub mod browser_manager;
pub mod filter_nav;
pub mod locator;
pub mod results;

pub use browser_manager::{BrowserSession, PageSession};
pub use locator::{Locator, PageDriver};
