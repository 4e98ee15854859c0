use serde_json::Value;

use crate::models::{CheckStatus, HealthCheckDefinition};
use crate::services::HealthCheckService;
use crate::tests::common::{Scripted, ScriptedProvider, test_queries};

fn check(name: &str, query: &str) -> HealthCheckDefinition {
    HealthCheckDefinition { name: name.to_string(), query: query.to_string() }
}

#[tokio::test]
async fn test_classifies_each_check() {
    let (provider, log) = ScriptedProvider::new()
        .on("EMPTY", Scripted::empty())
        .on(
            "THREE",
            Scripted::rows(
                &["HOST", "PORT"],
                vec![
                    vec![Value::from("hana01"), Value::from("30003")],
                    vec![Value::from("hana01"), Value::from("30040")],
                    vec![Value::from("hana02"), Value::from("30003")],
                ],
            ),
        )
        .on("BROKEN", Scripted::fail("invalid column name"))
        .on("AFTER", Scripted::empty())
        .into_dyn();

    let service = HealthCheckService::new(
        provider,
        vec![check("a", "EMPTY"), check("b", "THREE"), check("c", "BROKEN"), check("d", "AFTER")],
    );
    let report = service.run_checks().await;

    assert_eq!(report.len(), 4);
    assert_eq!(report[0].name, "a");
    assert_eq!(report[0].status, CheckStatus::Ok);
    assert_eq!(report[0].details, "No issues found.");

    assert_eq!(report[1].status, CheckStatus::Warning);
    assert!(report[1].details.starts_with("3 issue(s) found."), "{}", report[1].details);
    assert!(report[1].details.contains("hana01"));

    assert_eq!(report[2].status, CheckStatus::Error);
    assert!(report[2].details.contains("invalid column name"));

    // the failing check does not stop the next one
    assert_eq!(report[3].name, "d");
    assert_eq!(report[3].status, CheckStatus::Ok);

    let log = log.lock().unwrap();
    assert_eq!(log.opened, 1, "one connection reused across checks");
    assert_eq!(log.closed, 1);
    assert_eq!(log.statements, vec!["EMPTY", "THREE", "BROKEN", "AFTER"]);
}

#[tokio::test]
async fn test_unreachable_database_reports_single_connection_error() {
    let (provider, _) = ScriptedProvider::unreachable("timeout").into_dyn();

    let service = HealthCheckService::new(provider, test_queries().health_checks);
    let report = service.run_checks().await;

    assert_eq!(report.len(), 1);
    assert_eq!(report[0].name, "Connection");
    assert_eq!(report[0].status, CheckStatus::Error);
    assert!(report[0].details.contains("timeout"));
}

#[tokio::test]
async fn test_default_checks_run_in_order() {
    let (provider, _) = ScriptedProvider::new()
        .on("BACKUP", Scripted::rows(&["SYS_START_TIME"], vec![vec![Value::from("2026-10-15 02:00:00")]]))
        .on("TRANSACTIONS", Scripted::empty())
        .into_dyn();

    let report = HealthCheckService::new(provider, test_queries().health_checks).run_checks().await;

    let names: Vec<_> = report.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Last Successful Data Backup", "Active Transactions"]);
    assert_eq!(report[0].status, CheckStatus::Warning);
    assert_eq!(report[1].status, CheckStatus::Ok);
}
