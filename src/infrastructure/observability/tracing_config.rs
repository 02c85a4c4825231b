/// Log output settings for the queue process, read from the environment at
/// startup: `APP_ENV` tags the deployment, `LOG_FORMAT=json` switches to
/// structured lines for log shippers.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let environment =
            std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        // Outside development, JSON is the default even without LOG_FORMAT.
        let json_format = match std::env::var("LOG_FORMAT") {
            Ok(format) => format.eq_ignore_ascii_case("json"),
            Err(_) => environment != "development",
        };
        Self {
            environment,
            json_format,
        }
    }
}
