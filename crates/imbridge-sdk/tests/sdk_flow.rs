use std::sync::{Arc, Mutex};
use std::time::Duration;

use imbridge_core::stub::StubUnit;
use imbridge_core::{Bridge, BridgeConfig, ErrorKind};
use imbridge_sdk::params::{ConversationLookup, LoginParams, OfflinePush, PublicUserItem, SendMessage};
use imbridge_sdk::{Sdk, SdkError, SdkSettings};
use imbridge_store::{LocalStore, StepOutcome};
use serde_json::{Value, json};

fn sdk_with(stub: &Arc<StubUnit>) -> Sdk {
    Sdk::new(
        Bridge::new(stub.clone(), BridgeConfig::default()),
        SdkSettings::default(),
    )
}

fn decode_arg(arg: &Value) -> Value {
    serde_json::from_str(arg.as_str().expect("structured args travel as strings")).unwrap()
}

#[tokio::test]
async fn login_boots_initializes_then_logs_in() {
    let stub = Arc::new(StubUnit::new());
    stub.reply("initSDK", json!(""));
    stub.reply("login", json!(""));
    let sdk = sdk_with(&stub);

    let resp = sdk
        .login(LoginParams::new("u1", "tok"), Some("op-login".into()))
        .await
        .unwrap();
    assert_eq!(resp.event, "Login");
    assert_eq!(resp.operation_id.as_str(), "op-login");

    let calls = stub.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].entry_point, "initSDK");
    assert_eq!(calls[0].args[0], json!("op-login"));
    let init = decode_arg(&calls[0].args[1]);
    assert_eq!(init["platformID"], json!(5));
    assert_eq!(init["wsAddr"], json!("ws://127.0.0.1:10001"));
    assert_eq!(calls[1].entry_point, "login");
    assert_eq!(calls[1].args, vec![json!("op-login"), json!("u1"), json!("tok")]);
}

#[tokio::test]
async fn relogin_does_not_boot_again() {
    let stub = Arc::new(StubUnit::new());
    stub.reply("initSDK", json!(""));
    stub.reply("login", json!(""));
    stub.reply("logout", json!(""));
    let sdk = sdk_with(&stub);

    sdk.login(LoginParams::new("u1", "tok"), None).await.unwrap();
    sdk.logout(None).await.unwrap();
    sdk.login(LoginParams::new("u2", "tok2"), None).await.unwrap();

    assert_eq!(stub.boot_count(), 1);
    assert_eq!(stub.call_count(), 5);
}

#[tokio::test]
async fn login_after_boot_failure_reports_unit_unavailable() {
    let stub = Arc::new(StubUnit::new());
    stub.fail_boot(imbridge_core::NativeFailure::unspecified("bad module"));
    let sdk = sdk_with(&stub);

    let err = sdk.login(LoginParams::new("u1", "tok"), None).await.unwrap_err();
    assert!(matches!(err, SdkError::Bridge(_)));

    // The second attempt does not reboot; the guard rejects the call.
    match sdk.login(LoginParams::new("u1", "tok"), None).await.unwrap_err() {
        SdkError::Operation(op) => assert_eq!(op.kind, ErrorKind::UnitUnavailable),
        other => panic!("expected an operation error, got {other:?}"),
    }
    assert_eq!(stub.boot_count(), 1);
}

#[tokio::test]
async fn send_message_fills_default_offline_push() {
    let stub = Arc::new(StubUnit::new());
    stub.reply("sendMessage", json!(r#"{"clientMsgID":"m1","status":2}"#));
    let sdk = sdk_with(&stub);
    sdk.start().await.unwrap();

    let params = SendMessage {
        message: json!({"clientMsgID": "m1"}),
        recv_id: "u2".into(),
        ..SendMessage::default()
    };
    let resp = sdk.send_message(&params, Some("op-send".into())).await.unwrap();
    assert_eq!(resp.data["status"], json!(2));

    let args = &stub.calls()[0].args;
    assert_eq!(args[0], json!("op-send"));
    assert_eq!(decode_arg(&args[1]), json!({"clientMsgID": "m1"}));
    assert_eq!(args[2], json!("u2"));
    assert_eq!(args[3], json!(""));
    assert_eq!(
        decode_arg(&args[4]),
        serde_json::to_value(OfflinePush::default()).unwrap()
    );
    assert_eq!(args[5], json!(false));
}

#[tokio::test]
async fn created_messages_are_unwrapped() {
    let stub = Arc::new(StubUnit::new());
    stub.reply("createTextMessage", json!(r#"[{"clientMsgID":"m1"}]"#));
    let sdk = sdk_with(&stub);
    sdk.start().await.unwrap();

    let resp = sdk.create_text_message("hi", None).await.unwrap();
    assert_eq!(resp.event, "Createtextmessage");
    assert_eq!(resp.data, json!({"clientMsgID": "m1"}));
}

#[tokio::test]
async fn aliased_operation_reports_its_own_event() {
    let stub = Arc::new(StubUnit::new());
    stub.reply("setConversation", json!(""));
    let sdk = sdk_with(&stub);
    sdk.start().await.unwrap();

    let resp = sdk
        .set_conversation_is_msg_destruct("si_u1_u2", true, None)
        .await
        .unwrap();
    assert_eq!(resp.event, "Setconversationismsgdestruct");

    let call = &stub.calls()[0];
    assert_eq!(call.entry_point, "setConversation");
    assert_eq!(call.args[1], json!("si_u1_u2"));
    assert_eq!(decode_arg(&call.args[2]), json!({"isMsgDestruct": true}));
}

#[tokio::test]
async fn typed_payloads_decode() {
    let stub = Arc::new(StubUnit::new());
    stub.reply_raw("getUsersInfo", r#"[{"userID":"u1","nickname":"Alice"}]"#);
    let sdk = sdk_with(&stub);
    sdk.start().await.unwrap();

    let resp = sdk.get_users_info(&["u1".to_string()], None).await.unwrap();
    let users: Vec<PublicUserItem> = resp.data_as().unwrap();
    assert_eq!(users[0].nickname, "Alice");
    assert_eq!(stub.calls()[0].args[1], json!(r#"["u1"]"#));
}

#[tokio::test]
async fn lookup_arguments_follow_unit_order() {
    let stub = Arc::new(StubUnit::new());
    stub.reply("getOneConversation", json!("{}"));
    let sdk = sdk_with(&stub);
    sdk.start().await.unwrap();

    let lookup = ConversationLookup {
        source_id: "u2".into(),
        session_type: 1,
    };
    sdk.get_one_conversation(&lookup, Some("op".into())).await.unwrap();
    assert_eq!(stub.calls()[0].args, vec![json!("op"), json!(1), json!("u2")]);
}

#[tokio::test]
async fn on_and_off_manage_push_listeners() {
    let stub = Arc::new(StubUnit::new());
    let sdk = sdk_with(&stub);
    sdk.start().await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sub = {
        let seen = Arc::clone(&seen);
        sdk.on("OnConnectSuccess", move |push| {
            seen.lock().unwrap().push(push.event.clone());
        })
    };

    stub.emit(r#"{"event":"OnConnectSuccess","data":""}"#);
    for _ in 0..50 {
        if sdk.metrics().snapshot().pushes_delivered == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(*seen.lock().unwrap(), vec!["OnConnectSuccess"]);

    assert!(sdk.off(&sub));
    assert!(!sdk.off(&sub));
}

#[tokio::test]
async fn migration_discovers_conversations_through_the_unit() {
    let stub = Arc::new(StubUnit::new());
    stub.reply_raw("getAllConversationIDList", r#"["c1","c2"]"#);
    let sdk = sdk_with(&stub);
    sdk.start().await.unwrap();

    let store = LocalStore::open_in_memory().unwrap();
    store
        .with_conn(|conn| {
            conn.execute_batch(
                "CREATE TABLE chat_logs_c1 (client_msg_id text);
                 CREATE TABLE chat_logs_c2 (client_msg_id text, local_ex text);",
            )?;
            Ok(())
        })
        .unwrap();

    let report = sdk.migrate_store(&store).await;
    assert_eq!(report.outcome("3.8.2", "chat_logs_c1"), Some(&StepOutcome::Applied));
    assert_eq!(
        report.outcome("3.8.2", "chat_logs_c2"),
        Some(&StepOutcome::AlreadyApplied)
    );
    assert!(matches!(
        report.outcome("3.5.1", "local_friends"),
        Some(StepOutcome::Failed(_))
    ));
}

#[tokio::test]
async fn migration_with_unit_down_skips_per_conversation_step() {
    let stub = Arc::new(StubUnit::new());
    let sdk = sdk_with(&stub);

    let store = LocalStore::open_in_memory().unwrap();
    store
        .with_conn(|conn| {
            conn.execute_batch("CREATE TABLE local_users (user_id text)")?;
            Ok(())
        })
        .unwrap();

    let report = sdk.migrate_store(&store).await;
    assert!(matches!(
        report.outcome("3.8.2", "chat_logs_*"),
        Some(StepOutcome::Failed(_))
    ));
    assert_eq!(
        report.outcome("3.8.3-patch.8", "local_users"),
        Some(&StepOutcome::Applied)
    );
    assert_eq!(stub.call_count(), 0);
}
