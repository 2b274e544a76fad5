mod common;

use std::sync::Arc;

use atomic_saga::{HttpMethod, MemoryAuditSink, RunOutcome};
use common::{CREDITS, MockServices, NOWHERE, USERS, sample_engine};
use serde_json::json;

fn setup() -> (Arc<MockServices>, Arc<MemoryAuditSink>) {
    (MockServices::new(), Arc::new(MemoryAuditSink::new()))
}

#[test]
fn create_user_succeeds_and_threads_the_new_id() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run(
        "CreateUser",
        json!({"name": "Alice", "email": "alice@example.com", "credits": 150}),
    );

    assert!(outcome.is_ok());
    let results = outcome.results();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].step, "CreateDBUser");
    assert_eq!(results[0].result["id"], "u1");
    assert_eq!(results[1].step, "GrantWelcomeCredits");
    assert_eq!(results[1].result["userId"], "u1");
    assert_eq!(results[1].result["amount"], 150);

    assert_eq!(services.user_count(), 1);
    let calls = services.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].body,
        Some(json!({"name": "Alice", "email": "alice@example.com"}))
    );
    assert_eq!(calls[1].body, Some(json!({"userId": "u1", "amount": 150})));
}

#[test]
fn create_user_envelope_serializes_results_in_step_order() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run(
        "CreateUser",
        json!({"name": "Alice", "email": "alice@example.com"}),
    );

    let envelope = serde_json::to_value(&outcome).expect("envelope serializes");
    assert_eq!(envelope["ok"], true);
    assert_eq!(envelope["transaction"], "CreateUser");
    assert_eq!(envelope["results"][0]["step"], "CreateDBUser");
    assert_eq!(envelope["results"][1]["step"], "GrantWelcomeCredits");
    assert_eq!(envelope["results"][1]["result"]["amount"], 100);
    assert!(envelope.get("rollback").is_none());
}

#[test]
fn create_user_fail_rolls_back_the_created_user() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run(
        "CreateUserFail",
        json!({"name": "Bob", "email": "bob@example.com"}),
    );

    assert!(!outcome.is_ok());
    assert_eq!(outcome.failed_step(), Some("GrantWelcomeCredits"));
    let message = outcome.error_message().expect("failure carries a message");
    assert!(message.contains(NOWHERE), "unexpected error: {message}");

    let rollback = outcome.rollback();
    assert_eq!(rollback.len(), 1);
    assert_eq!(rollback[0].key, "CreateDBUser");
    assert!(rollback[0].ok);
    assert!(rollback[0].error.is_none());

    assert_eq!(
        services.call_lines(),
        vec![
            format!("POST {USERS}"),
            format!("POST {NOWHERE}"),
            format!("DELETE {USERS}/u1"),
        ]
    );
    assert_eq!(services.user_count(), 0);
}

#[test]
fn create_user_fail_envelope_reports_failure_and_rollback() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run(
        "CreateUserFail",
        json!({"name": "Bob", "email": "bob@example.com"}),
    );

    let envelope = serde_json::to_value(&outcome).expect("envelope serializes");
    assert_eq!(envelope["ok"], false);
    assert_eq!(envelope["transaction"], "CreateUserFail");
    assert_eq!(envelope["failedStep"], "GrantWelcomeCredits");
    assert!(envelope["error"].is_string());
    assert_eq!(
        envelope["rollback"],
        json!([{"key": "CreateDBUser", "ok": true}])
    );
    assert!(envelope.get("results").is_none());
}

#[test]
fn create_user_everywhere_feeds_window_into_the_next_put() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run(
        "CreateUserEverywhere",
        json!({"name": "Carol", "email": "carol@example.com"}),
    );

    assert!(outcome.is_ok(), "unexpected outcome: {outcome:?}");
    let steps: Vec<&str> = outcome.results().iter().map(|r| r.step.as_str()).collect();
    assert_eq!(
        steps,
        vec![
            "CreateInServiceA",
            "FetchAProfile",
            "FetchARecommendations",
            "CreateInServiceB",
        ]
    );

    assert_eq!(
        services.call_lines(),
        vec![
            format!("POST {USERS}"),
            format!("GET {USERS}/u1/profile"),
            format!("GET {USERS}/u1/recs"),
            format!("POST {USERS}"),
        ]
    );

    let calls = services.calls();
    assert_eq!(calls[1].body, None);
    assert_eq!(calls[2].body, None);
    assert_eq!(
        calls[3].body,
        Some(json!({
            "aUserId": "u1",
            "name": "Carol",
            "email": "carol@example.com",
            "profile": {"tier": "gold", "country": "US"},
            "interests": ["coding", "music", "gaming"],
        }))
    );
    assert_eq!(services.user_count(), 2);
}

#[test]
fn failure_in_first_step_compensates_nothing() {
    let (services, audit) = setup();
    services.fail(HttpMethod::Post, USERS);
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run(
        "CreateUserEverywhere",
        json!({"name": "Dan", "email": "dan@example.com"}),
    );
    assert_eq!(outcome.failed_step(), Some("CreateInServiceA"));
    assert!(outcome.rollback().is_empty());
    assert_eq!(services.calls().len(), 1);
}

#[test]
fn rollback_report_mirrors_completed_steps_in_reverse() {
    let (services, audit) = setup();
    services.fail(HttpMethod::Post, CREDITS);
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run(
        "CreateUser",
        json!({"name": "Eve", "email": "eve@example.com"}),
    );

    let RunOutcome::Aborted {
        failed_step,
        rollback,
        ..
    } = &outcome
    else {
        panic!("expected an aborted run");
    };
    assert_eq!(failed_step, "GrantWelcomeCredits");
    let keys: Vec<&str> = rollback.iter().map(|entry| entry.key.as_str()).collect();
    assert_eq!(keys, vec!["CreateDBUser"]);
    assert!(
        outcome
            .error_message()
            .is_some_and(|message| message.contains("500"))
    );
}

#[test]
fn unknown_transaction_runs_nothing() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run("DoesNotExist", json!({}));

    assert_eq!(
        outcome,
        RunOutcome::UnknownTransaction {
            name: "DoesNotExist".to_string()
        }
    );
    assert!(services.calls().is_empty());
    assert_eq!(
        serde_json::to_value(&outcome).expect("envelope serializes"),
        json!({"ok": false, "error": "Unknown transaction: DoesNotExist"})
    );
}

#[test]
fn non_object_payload_is_treated_as_empty() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcome = engine.run("CreateUser", json!(["not", "an", "object"]));

    assert_eq!(outcome.failed_step(), Some("CreateDBUser"));
    assert!(services.calls().is_empty());
}

#[test]
fn concurrent_runs_keep_their_state_apart() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    let outcomes: Vec<RunOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = &engine;
                scope.spawn(move || {
                    engine.run(
                        "CreateUser",
                        json!({"name": format!("user{i}"), "email": format!("user{i}@example.com"), "credits": i}),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("run thread panicked"))
            .collect()
    });

    for outcome in &outcomes {
        assert!(outcome.is_ok());
        let results = outcome.results();
        assert_eq!(results[0].result["id"], results[1].result["userId"]);
    }
    assert_eq!(services.user_count(), 8);

    let mut amounts: Vec<i64> = outcomes
        .iter()
        .filter_map(|outcome| outcome.results()[1].result["amount"].as_i64())
        .collect();
    amounts.sort_unstable();
    assert_eq!(amounts, (0..8).collect::<Vec<_>>());
}

#[test]
fn every_successful_run_reports_one_result_per_step() {
    let (services, audit) = setup();
    let engine = sample_engine(&services, &audit);

    for (name, definition) in engine.transactions() {
        if name == "CreateUserFail" {
            continue;
        }
        let outcome = engine.run(name, json!({"name": "Fay", "email": "fay@example.com"}));
        assert!(outcome.is_ok(), "{name} failed: {outcome:?}");
        assert_eq!(outcome.results().len(), definition.steps().len());
    }
}
