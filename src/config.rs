use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    /// Legend/node cardinality used when a request does not name one.
    pub default_top_n: usize,
    /// Flow-graph edge threshold used when a request does not name one.
    pub default_min_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7171,
            database_path: PathBuf::from("data/mortality.db"),
            migrations_path: PathBuf::from("migrations"),
            default_top_n: 8,
            default_min_threshold: 0.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            host: env::var("MORTALITY_HOST").unwrap_or(defaults.host),
            port: env::var("MORTALITY_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_path: env::var("MORTALITY_DATABASE_URL")
                .map(|v| {
                    PathBuf::from(
                        v.strip_prefix("sqlite://")
                            .or_else(|| v.strip_prefix("sqlite:"))
                            .unwrap_or(&v),
                    )
                })
                .unwrap_or(defaults.database_path),
            migrations_path: env::var("MORTALITY_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.migrations_path),
            default_top_n: env::var("MORTALITY_DEFAULT_TOP_N")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_top_n),
            default_min_threshold: env::var("MORTALITY_DEFAULT_MIN_THRESHOLD")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(defaults.default_min_threshold),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
