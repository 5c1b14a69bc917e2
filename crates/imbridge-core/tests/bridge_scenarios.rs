//! End-to-end scenarios for the bridge against the scripted stub unit.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use imbridge_core::stub::StubUnit;
use imbridge_core::{
    Bridge, BridgeConfig, ErrorKind, ExitStatus, Invocation, OperationId, UnitState,
};
use serde_json::json;

async fn running_bridge() -> (Arc<StubUnit>, Bridge) {
    let stub = Arc::new(StubUnit::new());
    let bridge = Bridge::new(stub.clone(), BridgeConfig::default());
    bridge.start().await.expect("stub boots");
    (stub, bridge)
}

#[tokio::test]
async fn resolves_decoded_user_info() {
    let (stub, bridge) = running_bridge().await;
    stub.reply_raw("getUserInfo", r#"{"userID":"u1","nickname":"Alice"}"#);

    let op_id = OperationId::from("op-42");
    let resp = bridge
        .invoke(
            Invocation::new("getUserInfo")
                .operation_id(Some(op_id.clone()))
                .arg("u1"),
        )
        .await
        .expect("call succeeds");

    assert_eq!(
        serde_json::to_value(&resp).unwrap(),
        json!({
            "operationID": "op-42",
            "event": "Getuserinfo",
            "data": {"userID": "u1", "nickname": "Alice"}
        })
    );
    assert_eq!(stub.calls()[0].args, vec![json!("op-42"), json!("u1")]);
}

#[tokio::test]
async fn non_json_payload_passes_through() {
    let (stub, bridge) = running_bridge().await;
    stub.reply_raw("getLoginUserID", "u1");

    let resp = bridge.invoke(Invocation::new("getLoginUserID")).await.unwrap();
    assert_eq!(resp.data, json!("u1"));
}

#[tokio::test]
async fn rejects_before_start_without_touching_unit() {
    let stub = Arc::new(StubUnit::new());
    stub.reply("logout", json!(""));
    let bridge = Bridge::new(stub.clone(), BridgeConfig::default());

    let err = bridge
        .invoke(Invocation::new("logout").operation_id(Some("op-0".into())))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnitUnavailable);
    assert_eq!(err.event, "Logout");
    assert_eq!(err.operation_id.as_str(), "op-0");
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn rejects_after_exit_without_touching_unit() {
    let (stub, bridge) = running_bridge().await;
    stub.reply("logout", json!(""));
    bridge.shutdown();

    let err = bridge
        .invoke(Invocation::new("logout").operation_id(Some("op-1".into())))
        .await
        .unwrap_err();

    assert_eq!(
        serde_json::to_value(&err).unwrap()["errCode"],
        json!(10001)
    );
    assert!(err.is_unit_unavailable());
    assert_eq!(err.event, "Logout");
    assert_eq!(stub.call_count(), 0);
    assert_eq!(bridge.metrics().snapshot().invocations_rejected, 1);
}

#[tokio::test]
async fn unit_terminating_itself_rejects_later_calls() {
    let (stub, bridge) = running_bridge().await;
    stub.reply("getSelfUserInfo", json!("{}"));

    let exited = bridge.guard().observe_exit();
    stub.terminate(ExitStatus::Failed("wasm trap: unreachable".into()));

    assert_eq!(exited.await, ExitStatus::Failed("wasm trap: unreachable".into()));
    assert!(matches!(bridge.guard().state(), UnitState::Exited(_)));

    let err = bridge.invoke(Invocation::new("getSelfUserInfo")).await.unwrap_err();
    assert!(err.is_unit_unavailable());
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn in_flight_call_is_rejected_when_unit_exits() {
    let (stub, bridge) = running_bridge().await;
    stub.hold("getAllConversationList", json!("[]"));

    let caller = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .invoke(Invocation::new("getAllConversationList"))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(stub.call_count(), 1);

    bridge.shutdown();
    let err = caller.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnitUnavailable);
    assert_eq!(err.event, "Getallconversationlist");

    // The native call was left running; releasing it must not disturb anything.
    stub.release();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(bridge.metrics().snapshot().invocations_succeeded, 0);
}

#[tokio::test]
async fn concurrent_calls_complete_independently() {
    let (stub, bridge) = running_bridge().await;
    stub.hold("getJoinedGroupList", json!("[1]"));
    stub.reply("getFriendList", json!("[2]"));

    let slow = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.invoke(Invocation::new("getJoinedGroupList")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The second call finishes while the first is still held by the unit.
    let fast = bridge.invoke(Invocation::new("getFriendList")).await.unwrap();
    assert_eq!(fast.data, json!([2]));
    assert!(!slow.is_finished());

    stub.release();
    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow.data, json!([1]));
}

#[tokio::test]
async fn pushes_reach_listeners_in_order() {
    let (stub, bridge) = running_bridge().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second"] {
        let seen = Arc::clone(&seen);
        bridge.subscribe("OnRecvNewMessages", move |push| {
            seen.lock().unwrap().push(format!("{tag}:{}", push.data["seq"]));
        });
    }

    assert!(stub.emit(r#"{"event":"OnRecvNewMessages","data":"{\"seq\":1}"}"#));
    assert!(stub.emit(r#"{"event":"OnRecvNewMessages","data":"{\"seq\":2}"}"#));
    assert!(stub.emit("garbage"));

    // Delivery happens on the pump task, one push at a time.
    for _ in 0..50 {
        if bridge.metrics().snapshot().pushes_unparsable == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["first:1", "second:1", "first:2", "second:2"]
    );
    let snap = bridge.metrics().snapshot();
    assert_eq!(snap.pushes_received, 3);
    assert_eq!(snap.pushes_unparsable, 1);
}
