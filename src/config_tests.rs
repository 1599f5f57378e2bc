//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use crate::strategy::FusionPolicy;
    use crate::types::FundHorizon;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.data.stock_ticker, "AAPL");
        assert_eq!(config.data.fund_ticker, "VOO");
        assert_eq!(
            config.data.stock_start,
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
        assert_eq!(
            config.data.train_end,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        assert!(config.data.cache_prices);
        assert!(!config.data.offline);
        assert_eq!(config.models.horizons, FundHorizon::ALL.to_vec());
        assert_eq!(config.models.default_horizon, FundHorizon::D30);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_training_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.seed, 42);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.smote_neighbors, 5);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.boosted_max_depth, 3);
    }

    #[test]
    fn test_fusion_config_partial() {
        let toml_str = r#"
policy = "categorical"
stock_threshold = 0.7
"#;
        let config: FusionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.policy, FusionPolicy::Categorical);
        assert_eq!(config.stock_threshold, 0.7);
        assert_eq!(config.etf_threshold, 0.55);
        assert_eq!(config.strong_confidence, 0.80);
    }

    #[test]
    fn test_models_config_rejects_unknown_horizon() {
        let toml_str = r#"
horizons = [30, 45]
"#;
        assert!(toml::from_str::<ModelsConfig>(toml_str).is_err());
    }

    #[test]
    fn test_server_config() {
        let toml_str = r#"
host = "127.0.0.1"
port = 9100
stock_history_start = "2021-06-01"
"#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(
            config.stock_history_start,
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
        );
        assert_eq!(
            config.fund_history_start,
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[data]
stock_ticker = "MSFT"

[models]
horizons = [30, 90]
artifact_dir = "artifacts"

[training]
n_estimators = 10
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.data.stock_ticker, "MSFT");
        assert_eq!(config.models.horizons, vec![FundHorizon::D30, FundHorizon::D90]);
        assert_eq!(config.models.artifact_path(), std::path::PathBuf::from("artifacts"));
        assert_eq!(config.training_params().n_estimators, 10);
        assert_eq!(config.training_params().seed, 42);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let config = Config::load("/nonexistent/signals-config.toml").unwrap();
        assert_eq!(config.fusion.policy, FusionPolicy::Independent);
        assert_eq!(config.models.artifact_dir, "models");
    }

    #[test]
    fn test_expand_path_home() {
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(expand_path("~/models"), std::path::PathBuf::from(home).join("models"));
        }
        assert_eq!(expand_path("plain/dir"), std::path::PathBuf::from("plain/dir"));
    }
}
