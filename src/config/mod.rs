use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the NGSI-LD context broker
    pub broker_url: String,

    /// Timeout of a single broker request
    pub request_timeout: Duration,

    /// Maximum number of messages dispatched concurrently
    pub concurrency: usize,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(60),
            concurrency: 16,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
