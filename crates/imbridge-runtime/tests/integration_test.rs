/// End-to-end tests against a real unit component.
///
/// They need a component implementing the unit world (`invoke` export,
/// `emit` import). Point `IMBRIDGE_TEST_UNIT` at the `.wasm` file and run:
/// `cargo test -p imbridge-runtime --test integration_test -- --include-ignored`
use std::path::PathBuf;
use std::sync::Arc;

use imbridge_core::{Bridge, BridgeConfig, Invocation};
use imbridge_runtime::WasmUnit;

fn test_unit_path() -> PathBuf {
    PathBuf::from(
        std::env::var("IMBRIDGE_TEST_UNIT")
            .expect("IMBRIDGE_TEST_UNIT must point at a unit component"),
    )
}

#[tokio::test]
#[ignore = "requires a unit component in IMBRIDGE_TEST_UNIT"]
async fn boots_and_answers_login_status() {
    let cache = tempfile::tempdir().unwrap();
    let unit = WasmUnit::new(&test_unit_path(), Some(cache.path().to_path_buf())).unwrap();
    let bridge = Bridge::new(Arc::new(unit), BridgeConfig::default());
    bridge.start().await.expect("unit boots");

    let resp = bridge
        .invoke(Invocation::new("getLoginStatus").operation_id(Some("op-1".into())))
        .await
        .expect("getLoginStatus succeeds");
    assert_eq!(resp.operation_id.as_str(), "op-1");
    assert_eq!(resp.event, "Getloginstatus");

    // A second boot of the same module reuses the precompiled artifact.
    let cached: Vec<_> = std::fs::read_dir(cache.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "cwasm"))
        .collect();
    assert_eq!(cached.len(), 1);
}

#[tokio::test]
#[ignore = "requires a unit component in IMBRIDGE_TEST_UNIT"]
async fn unknown_entry_point_is_a_native_failure() {
    let cache = tempfile::tempdir().unwrap();
    let unit = WasmUnit::new(&test_unit_path(), Some(cache.path().to_path_buf())).unwrap();
    let bridge = Bridge::new(Arc::new(unit), BridgeConfig::default());
    bridge.start().await.unwrap();

    let err = bridge
        .invoke(Invocation::new("noSuchEntryPoint"))
        .await
        .unwrap_err();
    assert!(!err.is_unit_unavailable());
    assert!(bridge.is_ready());
}
