//! User-Agent sent with every transfer and page fetch.
//!
//! Some servers refuse or degrade responses for non-browser clients, so all
//! traffic identifies as a desktop browser.

/// Browser-like User-Agent for every GET issued by the tool.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.141 Safari/537.36";
