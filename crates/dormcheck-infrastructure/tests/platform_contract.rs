//! Platform wire contract tests
//!
//! Each test points `PlatformHttpClient` at a local mock server and checks the
//! exact request the attendance platform expects, plus how its responses are
//! read back.

use std::collections::HashMap;

use chrono::Utc;
use dormcheck_domain::platform::{PlatformClient, PlatformError, SignInForm};
use dormcheck_domain::session::{CookieSet, SessionTokenExtractor};
use dormcheck_domain::task::GeoLocation;
use dormcheck_domain::AccountId;
use dormcheck_infrastructure::config::TimeoutConfig;
use dormcheck_infrastructure::http::{PlatformEndpoints, PlatformHttpClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const CAPTCHA_PATH: &str = "/Authentication/GetValidateCode";
const LOGIN_PATH: &str = "/MyAuthentication/put/";
const SIGN_IN_PATH: &str = "/studentwork/PunchMStudent/SubmitSignin";
const ACTIVITY_LIST_PATH: &str = "/studentwork/PunchMStudent/GetActivityList";

fn client_for(server: &MockServer) -> PlatformHttpClient {
    PlatformHttpClient::new(
        PlatformEndpoints::with_base(&server.uri()),
        &TimeoutConfig::default(),
    )
    .expect("create client")
}

async fn single_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.expect("request recording");
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

fn form_fields(request: &Request) -> HashMap<String, String> {
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

fn correlation() -> CookieSet {
    CookieSet::from_pairs([("Vlis", "vlis-1"), ("VK_", "vk-1")])
}

fn session_cookies() -> CookieSet {
    CookieSet::from_pairs([("qyuserid", "2023001"), ("utpstr", "1"), ("ct_vali", "LIVE")])
}

// ────────────────────────────────────────────────────────────────────────────
// Captcha
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_captcha_stamped_and_correlation_cookies_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CAPTCHA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "Vlis=vlis-1; path=/")
                .append_header("Set-Cookie", "VK_=vk-1; path=/; HttpOnly")
                .append_header("Set-Cookie", "tracking=ignored; path=/")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now().timestamp_millis();
    let challenge = client_for(&server).fetch_captcha().await.expect("captcha");
    let after = Utc::now().timestamp_millis();

    assert_eq!(challenge.correlation(), &correlation());
    assert_eq!(challenge.image_data_uri(), "data:image/png;base64,iVBORw==");

    let request = single_request(&server).await;
    let stamp: i64 = request
        .url
        .query_pairs()
        .find(|(name, _)| name == "v")
        .map(|(_, value)| value.parse().expect("numeric v"))
        .expect("v parameter");
    assert!((before..=after).contains(&stamp), "v={stamp} is not the request time in ms");
}

#[tokio::test]
async fn test_captcha_without_correlation_cookies_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CAPTCHA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "Vlis=vlis-1; path=/")
                .set_body_bytes(vec![1, 2, 3]),
        )
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_captcha().await;
    assert!(matches!(result, Err(PlatformError::MissingCorrelationCookies)));
}

// ────────────────────────────────────────────────────────────────────────────
// Login
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_form_and_repeated_set_cookie_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "ct_vali=decoy; path=/")
                .append_header("Set-Cookie", "ct_vali=LIVE; path=/; HttpOnly")
                .set_body_string(r#"{"isok":true,"msg":"登录成功","code":0}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let account = AccountId::new("2023001").expect("account id");
    let reply = client_for(&server)
        .login(&account, "plat-password", "AbC9", &correlation())
        .await
        .expect("login");

    assert!(reply.is_ok);
    assert_eq!(reply.message, "登录成功");
    assert_eq!(reply.set_cookie_headers.len(), 2);
    assert_eq!(
        SessionTokenExtractor::extract(&reply.set_cookie_headers),
        Some("LIVE".to_string())
    );

    let request = single_request(&server).await;
    assert_eq!(header_value(&request, "cookie"), Some("Vlis=vlis-1; VK_=vk-1"));
    assert_eq!(
        header_value(&request, "content-type"),
        Some("application/x-www-form-urlencoded")
    );

    let form = form_fields(&request);
    assert_eq!(form["LoginType"], "0");
    assert_eq!(form["Remember"], "true");
    assert_eq!(form["ValCode"], "abc9");
    assert_eq!(form["IsShowValCode"], "true");
    // RSA output, never the plaintext
    assert!(!form["UserName"].is_empty());
    assert_ne!(form["UserName"], "2023001");
    assert_ne!(form["Password"], "plat-password");
    assert_eq!(form.len(), 6);
}

#[tokio::test]
async fn test_login_rejection_passes_message_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"isok":false,"msg":"验证码错误"}"#),
        )
        .mount(&server)
        .await;

    let account = AccountId::new("2023001").expect("account id");
    let reply = client_for(&server)
        .login(&account, "pw", "x1y2", &correlation())
        .await
        .expect("login reply");

    assert!(!reply.is_ok);
    assert_eq!(reply.message, "验证码错误");
    assert!(reply.set_cookie_headers.is_empty());
}

#[tokio::test]
async fn test_login_server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let account = AccountId::new("2023001").expect("account id");
    let result = client_for(&server)
        .login(&account, "pw", "x1y2", &correlation())
        .await;

    assert!(matches!(result, Err(PlatformError::Transport(_))));
}

// ────────────────────────────────────────────────────────────────────────────
// Sign-in
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"isok":true,"msg":"签到成功"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let form = SignInForm {
        activity_id: "42".to_string(),
        location: GeoLocation::new("忠山校区", 105.443_352_4, 28.913_41).expect("location"),
    };
    let reply = client_for(&server)
        .submit_sign_in(&session_cookies(), &form)
        .await
        .expect("sign-in");

    assert!(reply.is_ok);
    assert_eq!(reply.message, "签到成功");

    let request = single_request(&server).await;
    assert_eq!(header_value(&request, "user-agent"), Some("Mozilla/5.0"));
    assert_eq!(
        header_value(&request, "cookie"),
        Some("qyuserid=2023001; utpstr=1; ct_vali=LIVE")
    );

    let fields = form_fields(&request);
    assert_eq!(fields["ActivityId"], "42");
    assert_eq!(fields["ReasonText"], "");
    assert_eq!(fields["guidValue"], "");
    assert_eq!(fields["address"], "忠山校区");
    assert_eq!(fields["longitudeGaoDe"], "105.443352");
    assert_eq!(fields["latitudeGaoDe"], "28.91341");
    assert_eq!(fields["RType"], "1");
    assert_eq!(fields.len(), 7);
}

#[tokio::test]
async fn test_sign_in_non_json_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let form = SignInForm {
        activity_id: "42".to_string(),
        location: GeoLocation::new("忠山校区", 105.4, 28.9).expect("location"),
    };
    let result = client_for(&server)
        .submit_sign_in(&session_cookies(), &form)
        .await;

    assert!(matches!(result, Err(PlatformError::Protocol(_))));
}

// ────────────────────────────────────────────────────────────────────────────
// Activity list
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_activity_list_sends_session_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ACTIVITY_LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data":[{"id":17,"name":"晚归签到","foreachp_starttime":"21:00"}],"code":0}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let activities = client_for(&server)
        .list_activities(&session_cookies())
        .await
        .expect("activities");

    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].id, 17);
    assert_eq!(activities[0].start_time, "21:00");

    let request = single_request(&server).await;
    assert_eq!(
        header_value(&request, "cookie"),
        Some("qyuserid=2023001; utpstr=1; ct_vali=LIVE")
    );
    assert_eq!(header_value(&request, "x-requested-with"), Some("XMLHttpRequest"));
}
