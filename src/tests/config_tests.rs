#[cfg(test)]
mod tests {
    use std::env;

    use crate::config::{self, AppConfig};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.url, "sqlite://data/bookbench.db");
        assert!(config.database.run_migrations);
        assert!(!config.filters.lenient_max_price);
        assert_eq!(config.benchmark.default_limit, 100);
        assert_eq!(config.benchmark.default_offset, 2000);
        assert!(config.security.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_server_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        let err = config::validate(&config).unwrap_err();

        assert!(err.to_string().contains("invalid server.port"));
    }

    #[test]
    fn test_invalid_pool_size() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;

        assert!(config::validate(&config).is_err());
    }

    #[test]
    fn test_invalid_benchmark_limits() {
        let mut config = AppConfig::default();
        config.benchmark.default_limit = config.benchmark.max_limit + 1;
        assert!(config::validate(&config).is_err());

        let mut config = AppConfig::default();
        config.benchmark.default_offset = -1;
        assert!(config::validate(&config).is_err());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("BOOKBENCH__FILTERS__LENIENT_MAX_PRICE", "true");
        env::set_var("BOOKBENCH__BENCHMARK__SLOW_QUERY_MS", "7");

        let loaded = config::load();

        env::remove_var("BOOKBENCH__FILTERS__LENIENT_MAX_PRICE");
        env::remove_var("BOOKBENCH__BENCHMARK__SLOW_QUERY_MS");

        let loaded = loaded.unwrap();
        assert!(loaded.filters.lenient_max_price);
        assert_eq!(loaded.benchmark.slow_query_ms, 7);
    }

    #[test]
    fn test_ensure_sqlite_parent_dir_creates_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("db.sqlite");
        let url = format!("sqlite://{}", db_path.display());

        config::ensure_sqlite_parent_dir(&url).unwrap();

        assert!(db_path.parent().unwrap().is_dir());
        assert!(config::ensure_sqlite_parent_dir("sqlite::memory:").is_ok());
    }
}
