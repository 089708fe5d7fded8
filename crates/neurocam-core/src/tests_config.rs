#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::env;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_valid() {
        let config = CamConfig::default();
        assert!(config.validate().is_ok());
        assert!(CamConfig::wide().validate().is_ok());
    }

    #[test]
    fn test_config_validation_geometry() {
        let mut config = CamConfig::default();

        config.geometry.pattern_width = 0;
        assert!(config.validate().is_err());
        config.geometry.pattern_width = 17;
        assert!(config.validate().is_err());

        config.geometry.pattern_width = 12;
        config.geometry.banks = 0;
        assert!(config.validate().is_err());

        config.geometry.banks = 4;
        config.geometry.pipeline_depth = 0;
        assert!(config.validate().is_err());

        config.geometry.pipeline_depth = 4;
        config.geometry.history_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_matching() {
        let mut config = CamConfig::default();

        // threshold beyond pattern width
        config.matching.fuzzy_threshold = 13;
        assert!(config.validate().is_err());

        // mask wider than the pattern
        config.matching.fuzzy_threshold = 2;
        config.matching.partial_mask = 0x1FFF;
        assert!(config.validate().is_err());

        config.matching.partial_mask = 0x0FFF;
        config.matching.confidence_shift = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_seed_and_aging() {
        let mut config = CamConfig::default();
        config.aging.interval_ticks = 0;
        assert!(config.validate().is_err());

        config.aging.interval_ticks = 16;
        config.seed.custom = vec![0; 17];
        assert!(config.validate().is_err());

        config.seed.custom = vec![0x1000];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_to_toml_string() {
        let config = CamConfig::default();
        let toml_str = config.to_toml_string().unwrap();

        assert!(toml_str.contains("[geometry]"));
        assert!(toml_str.contains("[matching]"));
        assert!(toml_str.contains("fuzzy_threshold"));
        assert!(toml_str.contains("profile = \"factory\""));
    }

    #[test]
    fn test_config_from_toml_string() {
        let toml_str = r#"
            [geometry]
            pattern_width = 16
            banks = 2
            slots_per_bank = 8
            learned_pool_size = 2
            pipeline_depth = 3
            history_depth = 4

            [matching]
            fuzzy_threshold = 3
            partial_mask = 65280
            confidence_shift = 2

            [learning]
            enabled = true

            [aging]
            interval_ticks = 8
        "#;

        let config: CamConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.geometry.slots_per_bank, 8);
        assert_eq!(config.matching.partial_mask, 0xFF00);
        assert!(config.learning.enabled);
        // seed section omitted falls back to factory
        assert_eq!(config.seed.profile, SeedProfile::Factory);
    }

    #[test]
    fn test_config_save_and_load() {
        let mut config = CamConfig::default();
        config.matching.fuzzy_threshold = 4;
        config.seed.profile = SeedProfile::Empty;

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let loaded = CamConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_from_file_rejects_invalid() {
        let mut config = CamConfig::default();
        config.geometry.banks = 0;
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), config.to_toml_string().unwrap()).unwrap();

        assert!(matches!(
            CamConfig::from_file(temp_file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_config_from_file_parse_error() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[geometry\nbanks = ").unwrap();
        assert!(matches!(
            CamConfig::from_file(temp_file.path()),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_load_layered_missing_files_uses_defaults() {
        let missing = std::path::Path::new("/nonexistent/neurocam.toml");
        let config = CamConfig::load_layered(Some(missing), Some(missing)).unwrap();
        assert_eq!(config.geometry, GeometryConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CamConfig::default();

        env::set_var("NEUROCAM_FUZZY_THRESHOLD", "5");
        env::set_var("NEUROCAM_PARTIAL_MASK", "0x0F0");
        env::set_var("NEUROCAM_LEARNING_ENABLED", "true");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.matching.fuzzy_threshold, 5);
        assert_eq!(config.matching.partial_mask, 0x0F0);
        assert!(config.learning.enabled);

        env::remove_var("NEUROCAM_FUZZY_THRESHOLD");
        env::remove_var("NEUROCAM_PARTIAL_MASK");
        env::remove_var("NEUROCAM_LEARNING_ENABLED");
    }
}
