use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub license_store_path: String,
    pub tenants_path: String,
    /// Bearer token for the admin API. Unset means every admin call is rejected.
    pub admin_token: Option<String>,
    pub license_key_prefix: String,
    /// Script version written into a freshly initialized store.
    pub default_script_version: String,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("RELAY_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let admin_token = env::var("ADMIN_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            host,
            port,
            license_store_path: env::var("LICENSE_STORE_PATH")
                .unwrap_or_else(|_| "licenses.json".to_string()),
            tenants_path: env::var("TENANTS_PATH").unwrap_or_else(|_| "tenants.json".to_string()),
            admin_token,
            license_key_prefix: env::var("LICENSE_KEY_PREFIX")
                .unwrap_or_else(|_| "LIC".to_string()),
            default_script_version: env::var("DEFAULT_SCRIPT_VERSION")
                .unwrap_or_else(|_| "1.0.0".to_string()),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
