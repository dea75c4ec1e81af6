use httpmock::prelude::*;
use serde_json::{json, Value};
use url::Url;

use super::*;
use crate::bot::policy::DEFAULT_RECHECK_COMMENT;

fn bot() -> ClaBot {
    ClaBot::with_token_provider(
        "cla-bot".to_string(),
        Url::parse("https://logs.test").unwrap(),
        GitHubClient::new().unwrap(),
        Box::new(StaticToken("bot-token".to_string())),
    )
}

fn pull_request_opened(server: &MockServer) -> Webhook {
    let payload = json!({
        "action": "opened",
        "pull_request": {
            "url": server.url("/repos/user/repo/pulls/2"),
            "issue_url": server.url("/repos/user/repo/issues/2"),
            "user": { "login": "foo" },
            "head": { "sha": "1234" }
        },
        "repository": { "url": server.url("/repos/user/repo") }
    });

    Webhook::from_json(&payload.to_string()).unwrap()
}

fn comment_created(server: &MockServer, body: &str) -> Webhook {
    let payload = json!({
        "action": "created",
        "issue": {
            "url": server.url("/repos/user/repo/issues/2"),
            "pull_request": { "url": server.url("/repos/user/repo/pulls/2") }
        },
        "comment": { "body": body, "user": { "login": "ColinEberhardt" } },
        "repository": { "url": server.url("/repos/user/repo") }
    });

    Webhook::from_json(&payload.to_string()).unwrap()
}

fn commit(sha: &str, login: Option<&str>, name: &str) -> Value {
    json!({
        "sha": sha,
        "author": login.map(|login| json!({ "login": login })),
        "commit": { "author": { "name": name, "email": format!("{}@example.com", sha) } }
    })
}

fn mock_commits(server: &MockServer, commits: Value) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/user/repo/pulls/2/commits")
            .header("authorization", "token bot-token");
        then.status(200).json_body(commits);
    })
}

/// Repository level `.clabot`, no organisation configuration.
fn mock_policy(server: &MockServer, policy: &str) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/user/clabot-config/contents/.clabot");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/user/repo/contents/.clabot");
        then.status(200)
            .json_body(json!({ "download_url": server.url("/raw/user/repo/.clabot") }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/raw/user/repo/.clabot");
        then.status(200).body(policy);
    });
}

fn mock_status<'a>(server: &'a MockServer, sha: &str, state: &str) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(POST)
            .path(format!("/repos/user/repo/statuses/{}", sha))
            .json_body_includes(
                json!({
                    "state": state,
                    "context": "verification/cla-signed",
                    "target_url": "https://logs.test/user-delivery"
                })
                .to_string(),
            );
        then.status(201);
    })
}

#[tokio::test]
async fn signed_contributor_gets_label_and_success() {
    let server = MockServer::start();
    mock_commits(&server, json!([commit("1234", Some("colin"), "Colin")]));
    mock_policy(&server, r#"{"contributors": ["colin"]}"#);
    server.mock(|when, then| {
        when.method(GET).path("/repos/user/repo/issues/2/labels");
        then.status(200).json_body(json!([]));
    });
    let add_label = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/user/repo/issues/2/labels")
            .json_body(json!(["cla-signed"]));
        then.status(200).json_body(json!([]));
    });
    let status = mock_status(&server, "1234", "success");

    let message = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap();

    assert_eq!(
        message,
        format!(
            "added label cla-signed to {}",
            server.url("/repos/user/repo/pulls/2")
        )
    );
    add_label.assert_calls(1);
    status.assert_calls(1);
}

#[tokio::test]
async fn missing_signature_gets_comment_and_error() {
    let server = MockServer::start();
    mock_commits(
        &server,
        json!([
            commit("1111", Some("foo"), "Foo"),
            commit("1234", Some("colin"), "Colin")
        ]),
    );
    mock_policy(&server, r#"{"contributors": ["colin"]}"#);
    let comment = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/user/repo/issues/2/comments")
            .body_includes("@foo");
        then.status(201);
    });
    let delete_label = server.mock(|when, then| {
        when.method(DELETE)
            .path("/repos/user/repo/issues/2/labels/cla-signed");
        then.status(404);
    });
    let status = mock_status(&server, "1234", "error");

    let message = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap();

    assert_eq!(
        message,
        format!(
            "CLA has not been signed by users @foo, added a comment to {}",
            server.url("/repos/user/repo/pulls/2")
        )
    );
    comment.assert_calls(1);
    delete_label.assert_calls(1);
    status.assert_calls(1);
}

#[tokio::test]
async fn summoned_recheck_is_acknowledged() {
    let server = MockServer::start();
    mock_commits(
        &server,
        json!([
            commit("1111", Some("colin"), "Colin"),
            commit("5678", Some("colin"), "Colin")
        ]),
    );
    mock_policy(&server, r#"{"contributors": ["colin"]}"#);
    server.mock(|when, then| {
        when.method(GET).path("/repos/user/repo/issues/2/labels");
        then.status(200).json_body(json!([{ "name": "cla-signed" }]));
    });
    let add_label = server.mock(|when, then| {
        when.method(POST).path("/repos/user/repo/issues/2/labels");
        then.status(200);
    });
    // the head commit of a comment event is the last commit of the pull request
    let status = mock_status(&server, "5678", "success");
    let recheck = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/user/repo/issues/2/comments")
            .json_body(json!({ "body": DEFAULT_RECHECK_COMMENT }));
        then.status(201);
    });

    let message = bot()
        .handle(&comment_created(&server, "@cla-bot check"), Some("delivery"))
        .await
        .unwrap();

    assert_eq!(
        message,
        format!(
            "added label cla-signed to {}",
            server.url("/repos/user/repo/pulls/2")
        )
    );
    add_label.assert_calls(0);
    status.assert_calls(1);
    recheck.assert_calls(1);
}

#[tokio::test]
async fn unsummoned_comment_makes_no_calls() {
    let server = MockServer::start();
    let any = server.mock(|_, then| {
        then.status(500);
    });

    let message = bot()
        .handle(&comment_created(&server, "@cla-bot chek"), Some("delivery"))
        .await
        .unwrap();

    assert_eq!(message, "the comment didnt summon the cla-bot");
    any.assert_calls(0);
}

#[tokio::test]
async fn unidentified_committers_take_precedence() {
    let server = MockServer::start();
    mock_commits(
        &server,
        json!([
            commit("1111", Some("foo"), "Foo"),
            commit("1234", None, "Jane Doe")
        ]),
    );
    // a webhook source would be called for `foo` if it were consulted
    mock_policy(
        &server,
        &json!({ "contributors": server.url("/contributors?checkContributor=") }).to_string(),
    );
    let webhook = server.mock(|when, then| {
        when.method(GET).path("/contributors");
        then.status(200).json_body(json!({ "isContributor": false }));
    });
    let comment = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/user/repo/issues/2/comments")
            .body_includes("Jane Doe");
        then.status(201);
    });
    server.mock(|when, then| {
        when.method(DELETE)
            .path("/repos/user/repo/issues/2/labels/cla-signed");
        then.status(200);
    });
    let status = mock_status(&server, "1234", "error");

    let message = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap();

    assert_eq!(
        message,
        format!(
            "CLA has not been signed by users Jane Doe, added a comment to {}",
            server.url("/repos/user/repo/pulls/2")
        )
    );
    webhook.assert_calls(0);
    comment.assert_calls(1);
    status.assert_calls(1);
}

#[tokio::test]
async fn invalid_policy_is_reported_as_error() {
    let server = MockServer::start();
    mock_commits(&server, json!([commit("1234", Some("colin"), "Colin")]));
    mock_policy(&server, "not json");
    let status = mock_status(&server, "1234", "error");

    let err = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClaError::InvalidPolicy(_)));
    status.assert_calls(1);
}

#[tokio::test]
async fn missing_contributor_source_is_reported_as_error() {
    let server = MockServer::start();
    mock_commits(&server, json!([commit("1234", Some("colin"), "Colin")]));
    mock_policy(&server, r#"{"label": "cla-ok"}"#);
    let status = mock_status(&server, "1234", "error");

    let err = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "A mechanism for verifying contributors has not been specified"
    );
    status.assert_calls(1);
}

#[tokio::test]
async fn missing_config_is_reported_as_error() {
    let server = MockServer::start();
    mock_commits(&server, json!([commit("1234", Some("colin"), "Colin")]));
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/user/clabot-config/contents/.clabot");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/user/repo/contents/.clabot");
        then.status(404);
    });
    let error = mock_status(&server, "1234", "error");
    let failure = mock_status(&server, "1234", "failure");

    let err = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClaError::MissingPolicy { .. }));
    error.assert_calls(1);
    failure.assert_calls(0);
}

#[tokio::test]
async fn api_error_is_reported_as_failure() {
    let server = MockServer::start();
    mock_commits(&server, json!([commit("1234", Some("colin"), "Colin")]));
    mock_policy(&server, r#"{"contributors": ["colin"]}"#);
    server.mock(|when, then| {
        when.method(GET).path("/repos/user/repo/issues/2/labels");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/repos/user/repo/issues/2/labels");
        then.status(500);
    });
    let success = mock_status(&server, "1234", "success");
    let failure = mock_status(&server, "1234", "failure");

    let err = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClaError::Status { status: 500, .. }));
    success.assert_calls(0);
    failure.assert_calls(1);
}

#[tokio::test]
async fn failure_before_head_commit_is_known_writes_no_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/user/repo/pulls/2/commits");
        then.status(502);
    });
    let writes = server.mock(|when, then| {
        when.method(POST);
        then.status(201);
    });

    let err = bot()
        .handle(&comment_created(&server, "@cla-bot check"), Some("delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClaError::Status { status: 502, .. }));
    writes.assert_calls(0);
}

#[tokio::test]
async fn comment_on_empty_pull_request() {
    let server = MockServer::start();
    mock_commits(&server, json!([]));

    let err = bot()
        .handle(&comment_created(&server, "@cla-bot check"), Some("delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClaError::NoCommits(_)));
}

#[tokio::test]
async fn pull_request_without_commits_is_not_labelled() {
    let server = MockServer::start();
    mock_commits(&server, json!([]));
    let add_label = server.mock(|when, then| {
        when.method(POST).path("/repos/user/repo/issues/2/labels");
        then.status(200);
    });
    let success = mock_status(&server, "1234", "success");
    let failure = mock_status(&server, "1234", "failure");

    let err = bot()
        .handle(&pull_request_opened(&server), Some("delivery"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClaError::NoCommits(_)));
    add_label.assert_calls(0);
    success.assert_calls(0);
    failure.assert_calls(1);
}
