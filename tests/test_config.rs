use vedette::config::Config;

// Environment mutation is process-wide, so both checks live in one
// test to keep them ordered.
#[test]
fn test_config_defaults_and_environment_overrides() {
    std::env::remove_var("VEDETTE_HOST");
    std::env::remove_var("VEDETTE_PORT");

    let cfg = Config::load();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.service, "8080");

    std::env::set_var("VEDETTE_HOST", "0.0.0.0");
    std::env::set_var("VEDETTE_PORT", "9000");

    let cfg = Config::load();
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.service, "9000");

    std::env::remove_var("VEDETTE_HOST");
    std::env::remove_var("VEDETTE_PORT");
}
