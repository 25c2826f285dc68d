//! Integration tests for the load entry points reading the process
//! environment and properties files.
//!
//! Every test uses its own key prefix so tests running in parallel never see
//! each other's environment variables.

use envprops::{
    load_with_prefix, load_with_prefix_and_properties, load_with_properties, ConfigError,
    ConfigLoader, Configurable, MapSource, Properties, ValueOrigin,
};
use proptest::prelude::*;
use tempfile::TempDir;

#[derive(Debug, Default, Configurable)]
struct Service {
    #[envprops(name = "HOST", critical)]
    host: String,
    #[envprops(name = "PORT", default = "8080")]
    port: u16,
    #[envprops(name = "DEBUG", default = "false")]
    debug: bool,
}

#[derive(Debug, Default, Configurable)]
struct Plain {
    #[envprops(name = "ENVPROPS_IT_PLAIN_NAME", critical)]
    name: String,
    #[envprops(name = "ENVPROPS_IT_PLAIN_WORKERS", default = "1")]
    workers: usize,
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_with_prefix_and_properties_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "app.properties",
        "# service settings\nENVPROPS_IT_A_HOST = file.example.com\nENVPROPS_IT_A_PORT: 9100\n",
    );
    std::env::set_var("ENVPROPS_IT_A_DEBUG", "true");

    let mut service = Service::default();
    load_with_prefix_and_properties(&mut service, "ENVPROPS_IT_A", &path).unwrap();

    assert_eq!(service.host, "file.example.com");
    assert_eq!(service.port, 9100);
    assert!(service.debug);

    std::env::remove_var("ENVPROPS_IT_A_DEBUG");
}

#[test]
fn test_load_with_prefix_reads_process_environment() {
    std::env::set_var("ENVPROPS_IT_B_HOST", "env.example.com");
    std::env::set_var("ENVPROPS_IT_B_PORT", "9200");

    let mut service = Service::default();
    load_with_prefix(&mut service, "ENVPROPS_IT_B").unwrap();

    assert_eq!(service.host, "env.example.com");
    assert_eq!(service.port, 9200);
    assert!(!service.debug);

    std::env::remove_var("ENVPROPS_IT_B_HOST");
    std::env::remove_var("ENVPROPS_IT_B_PORT");
}

#[test]
fn test_environment_overrides_properties_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "service.properties",
        "ENVPROPS_IT_C_HOST=file.example.com\nENVPROPS_IT_C_PORT=9300\n",
    );
    std::env::set_var("ENVPROPS_IT_C_PORT", "9301");

    let mut service = Service::default();
    let report = ConfigLoader::new()
        .with_prefix("ENVPROPS_IT_C")
        .with_properties_file(&path)
        .load_with_report(&mut service)
        .unwrap();

    assert_eq!(service.port, 9301);
    assert_eq!(report.origin_of("port"), Some(ValueOrigin::Environment));
    assert_eq!(report.origin_of("host"), Some(ValueOrigin::Properties));
    assert_eq!(report.origin_of("debug"), Some(ValueOrigin::Default));

    std::env::remove_var("ENVPROPS_IT_C_PORT");
}

#[test]
fn test_missing_properties_file_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.properties");

    let mut service = Service::default();
    let err = load_with_prefix_and_properties(&mut service, "ENVPROPS_IT_D", &missing).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::MissingCriticalField { ref key } if key == "ENVPROPS_IT_D_HOST"
    ));
}

#[test]
fn test_unprefixed_properties_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "plain.properties",
        "ENVPROPS_IT_PLAIN_NAME=worker\nENVPROPS_IT_PLAIN_WORKERS=4\n",
    );

    let mut plain = Plain::default();
    load_with_properties(&mut plain, &path).unwrap();

    assert_eq!(plain.name, "worker");
    assert_eq!(plain.workers, 4);
}

#[test]
fn test_toml_properties_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "app.toml",
        "ENVPROPS_IT_E_HOST = \"toml.example.com\"\nENVPROPS_IT_E_PORT = 9500\nENVPROPS_IT_E_DEBUG = true\n",
    );

    let mut service = Service::default();
    load_with_prefix_and_properties(&mut service, "ENVPROPS_IT_E", &path).unwrap();

    assert_eq!(service.host, "toml.example.com");
    assert_eq!(service.port, 9500);
    assert!(service.debug);
}

#[test]
fn test_json_properties_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "app.json",
        r#"{"ENVPROPS_IT_F_HOST": "json.example.com", "ENVPROPS_IT_F_PORT": 9600, "ENVPROPS_IT_F_DEBUG": null}"#,
    );

    let mut service = Service::default();
    load_with_prefix_and_properties(&mut service, "ENVPROPS_IT_F", &path).unwrap();

    assert_eq!(service.host, "json.example.com");
    assert_eq!(service.port, 9600);
    assert!(!service.debug);
}

#[test]
fn test_malformed_properties_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.json", "{ not json");
    std::env::set_var("ENVPROPS_IT_G_HOST", "env.example.com");

    let mut service = Service::default();
    load_with_prefix_and_properties(&mut service, "ENVPROPS_IT_G", &path).unwrap();

    assert_eq!(service.host, "env.example.com");
    assert_eq!(service.port, 8080);

    std::env::remove_var("ENVPROPS_IT_G_HOST");
}

#[test]
fn test_properties_file_is_reread_per_load() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "app.properties", "ENVPROPS_IT_H_HOST=first\n");
    let loader = ConfigLoader::new()
        .with_prefix("ENVPROPS_IT_H")
        .with_properties_file(&path);

    let mut service = Service::default();
    loader.load(&mut service).unwrap();
    assert_eq!(service.host, "first");

    std::fs::write(&path, "ENVPROPS_IT_H_HOST=second\n").unwrap();
    loader.load(&mut service).unwrap();
    assert_eq!(service.host, "second");
}

#[test]
fn test_dotenv_fills_gaps_without_touching_process_env() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        ".env",
        "ENVPROPS_IT_I_HOST=dotenv.example.com\nENVPROPS_IT_I_PORT=9700\n",
    );
    std::env::set_var("ENVPROPS_IT_I_PORT", "9701");

    let mut service = Service::default();
    ConfigLoader::new()
        .with_prefix("ENVPROPS_IT_I")
        .without_properties()
        .with_dotenv(&path)
        .load(&mut service)
        .unwrap();

    assert_eq!(service.host, "dotenv.example.com");
    assert_eq!(service.port, 9701);
    assert!(std::env::var("ENVPROPS_IT_I_HOST").is_err());

    std::env::remove_var("ENVPROPS_IT_I_PORT");
}

proptest! {
    #[test]
    fn prop_environment_wins_over_properties_and_default(
        env_port in proptest::option::of(1u16..),
        file_port in proptest::option::of(1u16..),
    ) {
        let mut env = MapSource::new().with("HOST", "example.com");
        if let Some(port) = env_port {
            env.insert("PORT", port.to_string());
        }
        let props = file_port
            .map(|port| Properties::parse(&format!("PORT={port}")).unwrap())
            .unwrap_or_default();

        let mut service = Service::default();
        let report = ConfigLoader::new()
            .with_env(env)
            .with_properties(props)
            .load_with_report(&mut service)
            .unwrap();

        let (expected, origin) = match (env_port, file_port) {
            (Some(port), _) => (port, ValueOrigin::Environment),
            (None, Some(port)) => (port, ValueOrigin::Properties),
            (None, None) => (8080, ValueOrigin::Default),
        };
        prop_assert_eq!(service.port, expected);
        prop_assert_eq!(report.origin_of("port"), Some(origin));
    }

    #[test]
    fn prop_string_values_are_written_verbatim(host in "[^\r\n]*") {
        let env = MapSource::new().with("HOST", host.clone());

        let mut service = Service::default();
        ConfigLoader::new()
            .with_env(env)
            .without_properties()
            .load(&mut service)
            .unwrap();

        prop_assert_eq!(service.host, host);
    }

    #[test]
    fn prop_integers_in_range_round_trip(port in any::<u16>()) {
        let env = MapSource::new()
            .with("HOST", "example.com")
            .with("PORT", port.to_string());

        let mut service = Service::default();
        ConfigLoader::new()
            .with_env(env)
            .without_properties()
            .load(&mut service)
            .unwrap();

        prop_assert_eq!(service.port, port);
    }
}
