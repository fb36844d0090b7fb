// tests/config_load.rs
use joke_refresher::config::{load_default, load_from};
use std::{env, fs};

const ENV_KEYS: [&str; 7] = [
    "REFRESHER_CONFIG_PATH",
    "JOKE_API_URL",
    "REFRESH_RATE_MS",
    "AUTO_REFRESH_ENABLED",
    "HOST",
    "PORT",
    "METRICS_ENABLED",
];

fn clear_env() {
    for k in ENV_KEYS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn explicit_toml_path() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("refresher.toml");
    fs::write(
        &p,
        r#"
api_url = "http://localhost:9999/"
refresh_rate_ms = 10000
auto_refresh_enabled = false
"#,
    )
    .unwrap();

    let cfg = load_from(&p).unwrap();
    assert_eq!(cfg.api_url, "http://localhost:9999/");
    assert_eq!(cfg.refresh_rate_ms, 10_000);
    assert!(!cfg.auto_refresh_enabled);
    assert_eq!(cfg.read_timeout_ms, 5_000);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    clear_env();
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    // 1) Nothing on disk -> built-in defaults
    let cfg = load_default().unwrap();
    assert_eq!(cfg.refresh_rate_ms, 2_000);
    assert!(cfg.auto_refresh_enabled);

    // 2) ./config/refresher.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/refresher.toml"),
        "refresh_rate_ms = 3000\n",
    )
    .unwrap();
    assert_eq!(load_default().unwrap().refresh_rate_ms, 3_000);

    // 3) Env path wins over the fallback file
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "refresh_rate_ms = 4000\n").unwrap();
    env::set_var("REFRESHER_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_default().unwrap().refresh_rate_ms, 4_000);

    // 4) Env overrides beat file values
    env::set_var("REFRESH_RATE_MS", "7000");
    env::set_var("AUTO_REFRESH_ENABLED", "false");
    let cfg = load_default().unwrap();
    assert_eq!(cfg.refresh_rate_ms, 7_000);
    assert!(!cfg.auto_refresh_enabled);

    // 5) Out-of-range override is rejected
    env::set_var("REFRESH_RATE_MS", "999");
    assert!(load_default().is_err());

    // 6) Missing env path is an error
    env::set_var("REFRESHER_CONFIG_PATH", tmp.path().join("nope.toml").display().to_string());
    assert!(load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
