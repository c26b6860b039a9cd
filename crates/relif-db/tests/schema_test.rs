//! Server-side schema checks and parity with the in-memory procedures.

use relif_db::{
    ClientConfig, DbError, MemoryBackend, PROCEDURES, SupabaseClient, migration_script, migrations,
};
use serde_json::json;

#[test]
fn script_contains_every_migration_in_order() {
    let script = migration_script();
    let mut last = 0;
    for migration in migrations() {
        let banner = format!("-- v{}: {}", migration.version, migration.name);
        let at = script.find(&banner).expect("migration banner present");
        assert!(at >= last, "{} is out of order", migration.name);
        last = at;
    }
}

#[test]
fn statements_can_be_replayed() {
    let script = migration_script();
    for line in script.lines().map(str::trim_start) {
        if line.starts_with("CREATE TABLE") || line.starts_with("CREATE INDEX") {
            assert!(line.contains("IF NOT EXISTS"), "not replayable: {line}");
        }
        if line.starts_with("CREATE") && line.contains("FUNCTION") {
            assert!(line.starts_with("CREATE OR REPLACE"), "not replayable: {line}");
        }
    }
}

#[tokio::test]
async fn memory_engine_serves_every_procedure() {
    let client = SupabaseClient::new(MemoryBackend::new(), ClientConfig::default());

    for name in PROCEDURES {
        // Missing arguments are rejected by the procedure itself, not by routing.
        let err = client.rpc(name, json!({})).await.unwrap_err();
        match err {
            DbError::Backend { status, code, .. } => {
                assert_eq!(status, 400, "{name}");
                assert_ne!(code.as_deref(), Some("PGRST202"), "{name} is not routed");
            }
            other => panic!("unexpected error from {name}: {other}"),
        }
    }

    let unknown = client.rpc("no_such_procedure", json!({})).await.unwrap_err();
    assert_eq!(unknown.status(), Some(404));
}
