#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub service: String,
}

impl Config {
    pub fn load() -> Self {
        let host = std::env::var("VEDETTE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let service = std::env::var("VEDETTE_PORT").unwrap_or_else(|_| "8080".to_string());
        Self { host, service }
    }
}
