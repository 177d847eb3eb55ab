use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub sqlite_path: String,
    pub token_secret: String,
    pub server_domain: String,
    pub upload_dir: String,
    pub cors_origin: String,
}

impl Config {
    /// Reads configuration from the environment. `TOKEN_SECRET` and
    /// `SERVER_DOMAIN` are mandatory; startup aborts without them.
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "1337".to_string())
                .parse()
                .expect("SERVER_PORT must be a valid port number"),
            sqlite_path: env::var("SQLITE_PATH")
                .unwrap_or_else(|_| "./data/eshop.db".to_string()),
            token_secret: env::var("TOKEN_SECRET").expect("TOKEN_SECRET must be set"),
            server_domain: env::var("SERVER_DOMAIN").expect("SERVER_DOMAIN must be set"),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./public/images".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}
