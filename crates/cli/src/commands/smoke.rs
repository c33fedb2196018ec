use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use concierge_agent::{Orchestrator, RuleBasedParser, TurnRequest};
use concierge_core::{AppConfig, Department, LoadOptions};
use concierge_db::repositories::{
    InMemoryConversationRepository, InMemoryOrderRepository, InMemoryRequestRepository,
    InMemoryRoomRepository,
};
use concierge_db::{connect_with_settings, migrations};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("db_connectivity"));
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("guest_turn_round_trip"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("guest_turn_round_trip"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let db_started = Instant::now();
    let db_result = runtime.block_on(async {
        connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
    });

    let pool = match db_result {
        Ok(pool) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Pass,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("connected using `{}`", config.database.url),
            });
            pool
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("failed to connect: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("guest_turn_round_trip"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let migration_started = Instant::now();
    let migration_result = runtime.block_on(async { migrations::run_pending(&pool).await });
    runtime.block_on(async {
        pool.close().await;
    });

    match migration_result {
        Ok(()) => checks.push(SmokeCheck {
            name: "migration_visibility",
            status: SmokeStatus::Pass,
            elapsed_ms: migration_started.elapsed().as_millis() as u64,
            message: "migrations are visible and executable".to_string(),
        }),
        Err(error) => checks.push(SmokeCheck {
            name: "migration_visibility",
            status: SmokeStatus::Fail,
            elapsed_ms: migration_started.elapsed().as_millis() as u64,
            message: format!("migration execution failed: {error}"),
        }),
    }

    checks.push(guest_turn_check(&runtime));

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// Routes one scripted order through the full parse-gate-dispatch path.
/// In-memory stores back the run, so a smoke check never writes an order
/// into the live database.
fn guest_turn_check(runtime: &tokio::runtime::Runtime) -> SmokeCheck {
    let turn_started = Instant::now();
    let outcome = runtime.block_on(async {
        let orchestrator = Orchestrator::new(
            Arc::new(RuleBasedParser::default()),
            Arc::new(InMemoryConversationRepository::default()),
            Arc::new(InMemoryRoomRepository::seeded()),
            Arc::new(InMemoryOrderRepository::default()),
            Arc::new(InMemoryRequestRepository::default()),
        );
        orchestrator
            .handle_turn(TurnRequest {
                conversation_id: None,
                room_number: None,
                message: "Two margherita pizzas for room 204".to_string(),
            })
            .await
    });
    let elapsed_ms = turn_started.elapsed().as_millis() as u64;

    match outcome {
        Ok(outcome)
            if outcome.records.len() == 1
                && outcome.records[0].department() == Department::Restaurant =>
        {
            SmokeCheck {
                name: "guest_turn_round_trip",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: format!(
                    "scripted order {} routed to the restaurant and recorded",
                    outcome.records[0].display_id()
                ),
            }
        }
        Ok(outcome) => SmokeCheck {
            name: "guest_turn_round_trip",
            status: SmokeStatus::Fail,
            elapsed_ms,
            message: format!(
                "scripted turn did not produce the one expected restaurant order \
                 ({} records)",
                outcome.records.len()
            ),
        },
        Err(error) => SmokeCheck {
            name: "guest_turn_round_trip",
            status: SmokeStatus::Fail,
            elapsed_ms,
            message: format!("scripted turn failed: {error}"),
        },
    }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due to previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
