//! Sign-in classification across repeated attempts.

use btsite_core::SignInCode;
use serde_json::json;

use crate::fixtures::{Harness, mtorrent_site, nexus_site};

#[tokio::test]
async fn test_signed_site_stays_already_signed() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();

    for _ in 0..2 {
        harness
            .engine
            .push_data("user_basic_info", json!({"is_login": true, "signed_in": true}));
    }

    for _ in 0..2 {
        let result = client.sign_in().await.unwrap();
        assert_eq!(result.code, SignInCode::AlreadySigned);
    }
    assert!(harness.engine.calls_for("sign_in").is_empty());
}

#[tokio::test]
async fn test_sign_in_then_already_signed() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();

    harness
        .engine
        .push_data("user_basic_info", json!({"is_login": "1", "signed_in": "0"}));
    harness.engine.push_data("sign_in", json!({"signed_in": true}));
    harness
        .engine
        .push_data("user_basic_info", json!({"is_login": "1", "signed_in": "1"}));

    assert_eq!(client.sign_in().await.unwrap().code, SignInCode::Success);
    assert_eq!(client.sign_in().await.unwrap().code, SignInCode::AlreadySigned);
    assert_eq!(harness.engine.calls_for("sign_in").len(), 1);
}

#[tokio::test]
async fn test_sign_in_error_propagates() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();

    harness
        .engine
        .push_data("user_basic_info", json!({"is_login": true}));

    // No sign-in response is scripted, so the engine reports an unknown request.
    let error = client.sign_in().await.unwrap_err();
    assert!(error.to_string().starts_with("站点(Nexus Example)签到异常"));
}

#[tokio::test]
async fn test_api_site_never_calls_sign_in() {
    let harness = Harness::new();
    let client = harness.factory.create(mtorrent_site()).unwrap();

    for _ in 0..2 {
        harness.engine.push_data("profile", json!({"username": "alice"}));
        harness
            .engine
            .push_data("msg_notify_statistic", json!({"un_make": 0}));
    }

    for _ in 0..2 {
        let result = client.sign_in().await.unwrap();
        assert_eq!(result.code, SignInCode::Success);
    }
    assert!(harness.engine.calls_for("sign_in").is_empty());
}
