use std::env;
use std::sync::{Mutex, OnceLock};

use concierge_cli::commands::{config, doctor, migrate, seed, smoke};
use serde_json::Value;

#[test]
fn migrate_succeeds_against_a_memory_store() {
    with_env(&[("CONCIERGE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_reports_config_failures_first() {
    with_env(&[("CONCIERGE_CONFIG_PATH", "/nonexistent/concierge.toml")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_inserted_and_total_counts() {
    with_env(&[("CONCIERGE_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "room inventory ready: 87 inserted, 87 total");
    });
}

#[test]
fn seed_output_is_deterministic_across_runs() {
    with_env(&[("CONCIERGE_DATABASE_URL", "sqlite::memory:")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        assert_eq!(
            parse_payload(&first.output)["message"],
            parse_payload(&second.output)["message"]
        );
    });
}

#[test]
fn smoke_passes_with_a_memory_store() {
    with_env(&[("CONCIERGE_DATABASE_URL", "sqlite::memory:")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 0, "expected successful smoke report");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");

        let checks = payload["checks"].as_array().expect("checks should be a list");
        assert_eq!(checks.len(), 4);
        assert_eq!(checks[3]["name"], "guest_turn_round_trip");
        assert_eq!(checks[3]["status"], "pass");
    });
}

#[test]
fn smoke_fails_and_skips_when_config_is_unloadable() {
    with_env(&[("CONCIERGE_CONFIG_PATH", "/nonexistent/concierge.toml")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");

        let checks = payload["checks"].as_array().expect("checks should be a list");
        assert_eq!(checks[0]["status"], "fail");
        assert!(checks[1..].iter().all(|check| check["status"] == "skipped"));
    });
}

#[test]
fn doctor_lists_every_check_in_human_form() {
    with_env(&[("CONCIERGE_DATABASE_URL", "sqlite::memory:")], || {
        let output = doctor::run(false);

        assert!(output.starts_with("doctor: all readiness checks passed"));
        assert!(output.contains("- [ok] config_validation"));
        assert!(output.contains("- [ok] llm_readiness"));
        assert!(output.contains("- [ok] database_connectivity"));
    });
}

#[test]
fn doctor_json_reports_an_enabled_model() {
    with_env(
        &[
            ("CONCIERGE_DATABASE_URL", "sqlite::memory:"),
            ("CONCIERGE_LLM_ENABLED", "true"),
            ("CONCIERGE_LLM_PROVIDER", "ollama"),
        ],
        || {
            let payload: Value =
                serde_json::from_str(&doctor::run(true)).expect("doctor output should be JSON");

            assert_eq!(payload["overall_status"], "pass");
            let checks = payload["checks"].as_array().expect("checks should be a list");
            assert_eq!(checks[1]["name"], "llm_readiness");
            let details = checks[1]["details"].as_str().unwrap_or_default();
            assert!(details.contains("ollama"), "details: {details}");
            assert!(details.contains("11434"), "details: {details}");
        },
    );
}

#[test]
fn config_attributes_sources_and_redacts_secrets() {
    with_env(
        &[
            ("CONCIERGE_DATABASE_URL", "sqlite::memory:"),
            ("CONCIERGE_LLM_API_KEY", "sk-test-123"),
        ],
        || {
            let output = config::run();

            assert!(output
                .contains("- database.url = sqlite::memory: (source: env (CONCIERGE_DATABASE_URL))"));
            assert!(
                output.contains("- llm.api_key = <redacted> (source: env (CONCIERGE_LLM_API_KEY))")
            );
            assert!(output.contains("- server.port = 8080 (source: default)"));
            assert!(!output.contains("sk-test-123"), "raw key must never be printed");
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CONCIERGE_CONFIG_PATH",
        "CONCIERGE_DATABASE_URL",
        "CONCIERGE_DATABASE_MAX_CONNECTIONS",
        "CONCIERGE_DATABASE_TIMEOUT_SECS",
        "CONCIERGE_LLM_ENABLED",
        "CONCIERGE_LLM_PROVIDER",
        "CONCIERGE_LLM_API_KEY",
        "CONCIERGE_LLM_BASE_URL",
        "CONCIERGE_LLM_MODEL",
        "CONCIERGE_LLM_TIMEOUT_SECS",
        "CONCIERGE_SERVER_BIND_ADDRESS",
        "CONCIERGE_SERVER_PORT",
        "CONCIERGE_LOG_LEVEL",
        "CONCIERGE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
