//! E2E tests for the GitHub OAuth flow, the authentication gate and logout

mod common;

use common::{BROKEN_PROFILE_CODE, TestServer, cookie_value, location};

#[tokio::test]
async fn test_login_page_renders() {
    let server = TestServer::new().await;

    let response = server.get("/login", None).await;

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("response body");
    assert!(body.contains("Sign in with GitHub"));
    assert!(body.contains("href=\"/auth/github\""));
}

#[tokio::test]
async fn test_github_redirect_sets_csrf_cookie_and_redirects() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/github"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let location = location(&response);
    assert!(location.contains("/login/oauth/authorize?"));
    assert!(location.contains("client_id=test-client-id"));
    assert!(location.contains("scope=user"));
    assert!(location.contains(
        "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgithub%2Fcallback"
    ));
    assert!(location.contains("state="));

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    assert!(set_cookie.contains("oauth_state="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_unauthenticated_account_redirects_to_login() {
    let server = TestServer::new().await;

    let response = server.get("/account", None).await;

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_successful_login_grants_account_access() {
    let server = TestServer::new().await;

    let session = server.sign_in().await;

    let response = server.get("/account", Some(session.as_str())).await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("The Octocat"));
    assert!(body.contains("octocat"));
    assert!(body.contains("583231"));
    assert!(body.contains("https://github.com/octocat"));

    let home = server.get("/", Some(session.as_str())).await;
    let body = home.text().await.unwrap();
    assert!(body.contains("Hello, The Octocat!"));
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let server = TestServer::new().await;
    let session = server.sign_in().await;

    let response = server.get("/logout", Some(session.as_str())).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
    let set_cookie_values: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect();
    assert!(
        set_cookie_values.iter().any(|v| v.starts_with("session=")),
        "expected cookie removal headers, got: {set_cookie_values:?}"
    );

    // Replaying the old cookie must not authenticate
    let response = server.get("/account", Some(session.as_str())).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_post_logout_is_accepted() {
    let server = TestServer::new().await;
    let session = server.sign_in().await;

    let response = server
        .client
        .post(server.url("/logout"))
        .header("Cookie", format!("session={session}"))
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), "/");
    let response = server.get("/account", Some(session.as_str())).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_bad_code_redirects_to_login() {
    let server = TestServer::new().await;
    let (state, state_cookie) = server.begin_login().await;

    let response = server
        .client
        .get(server.url(&format!(
            "/auth/github/callback?code=expired&state={state}"
        )))
        .header("Cookie", format!("oauth_state={state_cookie}"))
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), "/login");
    assert!(cookie_value(&response, "session").is_none());
}

#[tokio::test]
async fn test_invalid_profile_redirects_to_login() {
    let server = TestServer::new().await;
    let (state, state_cookie) = server.begin_login().await;

    let response = server
        .client
        .get(server.url(&format!(
            "/auth/github/callback?code={BROKEN_PROFILE_CODE}&state={state}"
        )))
        .header("Cookie", format!("oauth_state={state_cookie}"))
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), "/login");
    assert!(cookie_value(&response, "session").is_none());
}

#[tokio::test]
async fn test_github_callback_rejects_missing_csrf_cookie() {
    let server = TestServer::new().await;

    let response = server
        .get("/auth/github/callback?code=good-code&state=dummy", None)
        .await;

    assert_eq!(location(&response), "/login");
    assert!(cookie_value(&response, "session").is_none());
}

#[tokio::test]
async fn test_denied_authorization_redirects_to_login() {
    let server = TestServer::new().await;
    let (state, state_cookie) = server.begin_login().await;

    let response = server
        .client
        .get(server.url(&format!(
            "/auth/github/callback?error=access_denied&state={state}"
        )))
        .header("Cookie", format!("oauth_state={state_cookie}"))
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_tampered_session_cookie_is_rejected() {
    let server = TestServer::new().await;
    let session = server.sign_in().await;
    let (id, _) = session.split_once('.').unwrap();
    let forged = format!("{id}.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");

    let response = server.get("/account", Some(forged.as_str())).await;

    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_second_login_replaces_previous_session() {
    let server = TestServer::new().await;
    let first = server.sign_in().await;

    let (state, state_cookie) = server.begin_login().await;
    let response = server
        .client
        .get(server.url(&format!(
            "/auth/github/callback?code=good-code&state={state}"
        )))
        .header("Cookie", format!("oauth_state={state_cookie}; session={first}"))
        .send()
        .await
        .unwrap();
    let second = cookie_value(&response, "session").expect("new session cookie");

    assert_ne!(first, second);
    assert_eq!(location(&server.get("/account", Some(first.as_str())).await), "/login");
    assert_eq!(server.get("/account", Some(second.as_str())).await.status(), 200);
}
