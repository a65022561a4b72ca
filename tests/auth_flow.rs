mod common;

use backscnr_cli::{ApiClient, ApiError, Config};
use common::{test_config, ScriptedPrompt};
use mockito::Matcher;

fn granted(server: &mut mockito::ServerGuard, refresh: &str, access: &str, rotated: &str) -> mockito::Mock {
    server
        .mock("POST", "/api/token/refresh/")
        .match_body(Matcher::UrlEncoded("refresh".into(), refresh.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"access": "{}", "refresh": "{}"}}"#, access, rotated))
}

fn rejected(server: &mut mockito::ServerGuard, refresh: &str) -> mockito::Mock {
    server
        .mock("POST", "/api/token/refresh/")
        .match_body(Matcher::UrlEncoded("refresh".into(), refresh.into()))
        .with_status(401)
        .with_body(r#"{"detail": "Token is invalid or expired"}"#)
}

#[test]
fn saved_token_is_used_and_rotated() {
    let mut server = mockito::Server::new();
    let config = test_config(&server);
    std::fs::write(&config.token_file, "saved\n").unwrap();
    let refresh = granted(&mut server, "saved", "access-1", "rotated-1").create();
    let search = server
        .mock("GET", "/scan/search/")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer access-1")
        .with_body("[]")
        .create();

    let mut prompt = ScriptedPrompt::new(&[]);
    let api = ApiClient::connect(&config, &mut prompt).unwrap();

    assert_eq!(prompt.calls, 0);
    assert_eq!(std::fs::read_to_string(&config.token_file).unwrap(), "rotated-1");
    assert!(api.search_scans("1").unwrap().is_empty());
    refresh.assert();
    search.assert();
    std::fs::remove_file(&config.token_file).unwrap();
}

#[test]
fn missing_token_prompts_and_persists_rotation() {
    let mut server = mockito::Server::new();
    let config = test_config(&server);
    let refresh = granted(&mut server, "typed", "access-2", "rotated-2").create();

    let mut prompt = ScriptedPrompt::new(&["  typed  "]);
    ApiClient::connect(&config, &mut prompt).unwrap();

    assert_eq!(prompt.calls, 1);
    assert_eq!(prompt.login_urls, vec![config.login_url.clone()]);
    assert_eq!(std::fs::read_to_string(&config.token_file).unwrap(), "rotated-2");
    refresh.assert();
    std::fs::remove_file(&config.token_file).unwrap();
}

#[test]
fn expired_token_is_deleted_and_reprompted_once() {
    let mut server = mockito::Server::new();
    let config = test_config(&server);
    std::fs::write(&config.token_file, "expired").unwrap();
    let stale = rejected(&mut server, "expired").expect(1).create();
    let fresh = granted(&mut server, "fresh", "access-3", "rotated-3").expect(1).create();

    let mut prompt = ScriptedPrompt::new(&["fresh"]);
    ApiClient::connect(&config, &mut prompt).unwrap();

    assert_eq!(prompt.calls, 1);
    assert_eq!(std::fs::read_to_string(&config.token_file).unwrap(), "rotated-3");
    stale.assert();
    fresh.assert();
    std::fs::remove_file(&config.token_file).unwrap();
}

#[test]
fn each_rejection_prompts_again() {
    let mut server = mockito::Server::new();
    let config = test_config(&server);
    std::fs::write(&config.token_file, "old").unwrap();
    let _old = rejected(&mut server, "old").create();
    let _typo = rejected(&mut server, "typo").create();
    let good = granted(&mut server, "good", "access-4", "rotated-4").create();

    let mut prompt = ScriptedPrompt::new(&["typo", "good"]);
    ApiClient::connect(&config, &mut prompt).unwrap();

    assert_eq!(prompt.calls, 2);
    assert_eq!(std::fs::read_to_string(&config.token_file).unwrap(), "rotated-4");
    good.assert();
    std::fs::remove_file(&config.token_file).unwrap();
}

#[test]
fn aborted_prompt_leaves_no_token_behind() {
    let mut server = mockito::Server::new();
    let config = test_config(&server);
    std::fs::write(&config.token_file, "expired").unwrap();
    let _stale = rejected(&mut server, "expired").create();

    let mut prompt = ScriptedPrompt::new(&[]);
    let err = ApiClient::connect(&config, &mut prompt).err().unwrap();

    assert!(matches!(err, ApiError::Prompt(_)));
    assert_eq!(prompt.calls, 1);
    assert!(!config.token_file.exists());
}

#[test]
fn unreachable_server_keeps_token_and_does_not_prompt() {
    // port 1 is reserved and refuses connections
    let config = Config::new("http://127.0.0.1:1", common::scratch_token_file());
    std::fs::write(&config.token_file, "keep-me").unwrap();

    let mut prompt = ScriptedPrompt::new(&["unused"]);
    let err = ApiClient::connect(&config, &mut prompt).err().unwrap();

    assert!(matches!(err, ApiError::Transport { .. }));
    assert_eq!(prompt.calls, 0);
    assert_eq!(std::fs::read_to_string(&config.token_file).unwrap(), "keep-me");
    std::fs::remove_file(&config.token_file).unwrap();
}

#[test]
fn ok_response_without_tokens_is_a_decode_error() {
    let mut server = mockito::Server::new();
    let config = test_config(&server);
    std::fs::write(&config.token_file, "saved").unwrap();
    let _m = server
        .mock("POST", "/api/token/refresh/")
        .with_status(200)
        .with_body(r#"{"access": "only-access"}"#)
        .create();

    let mut prompt = ScriptedPrompt::new(&[]);
    let err = ApiClient::connect(&config, &mut prompt).err().unwrap();

    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(prompt.calls, 0);
    std::fs::remove_file(&config.token_file).unwrap();
}

#[test]
fn typed_token_is_saved_before_the_exchange() {
    let mut server = mockito::Server::new();
    let config = test_config(&server);
    let _m = server
        .mock("POST", "/api/token/refresh/")
        .match_body(Matcher::UrlEncoded("refresh".into(), "typed".into()))
        .with_status(200)
        .with_body("not json")
        .create();

    let mut prompt = ScriptedPrompt::new(&["typed"]);
    let err = ApiClient::connect(&config, &mut prompt).err().unwrap();

    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(prompt.calls, 1);
    assert_eq!(std::fs::read_to_string(&config.token_file).unwrap(), "typed");
    std::fs::remove_file(&config.token_file).unwrap();
}
