use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_verbosity_levels() {
    assert_eq!(LoggingConfig::from_verbosity(0).level, "warn");
    assert_eq!(LoggingConfig::from_verbosity(1).level, "info");
    assert_eq!(LoggingConfig::from_verbosity(2).level, "debug");
    assert_eq!(LoggingConfig::from_verbosity(7).level, "trace");
    assert!(LoggingConfig::from_verbosity(3).include_location);
    assert!(!LoggingConfig::default().include_location);
}

#[test]
fn test_default_filter() {
    assert_eq!(
        LoggingConfig::from_verbosity(2).default_filter(),
        "warn,tripwire=debug,tripwire_core=debug,tripwire_triggers=debug,tripwire_migrations=debug"
    );
}

#[test]
fn test_default_filter_parses() {
    let config = LoggingConfig::from_verbosity(1).with_json(true);
    assert!(config.json);
    assert!(EnvFilter::try_new(config.default_filter()).is_ok());
}
