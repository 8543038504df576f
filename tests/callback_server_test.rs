use spotctl::{api::CallbackContext, server::CallbackServer, types::CallbackOutcome};
use url::Url;

async fn get(url: String) -> (u16, String) {
    let res = reqwest::get(url).await.unwrap();
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}

#[tokio::test]
async fn test_first_callback_wins() {
    let redirect = Url::parse("http://127.0.0.1:0/callback").unwrap();
    let (ctx, outcome_rx) = CallbackContext::new("issued-state".to_string());
    let server = CallbackServer::bind(&redirect, ctx).await.unwrap();
    let base = format!("http://{}/callback", server.local_addr());

    let (status, body) = get(format!("{base}?state=issued-state&code=first")).await;
    assert_eq!(status, 200);
    assert!(body.contains("Authentication successful"));

    let (status, body) = get(format!("{base}?state=issued-state&code=second")).await;
    assert_eq!(status, 409);
    assert_eq!(body, "authorization already handled");

    // a later failure cannot replace the delivered code either
    let (status, _) = get(format!("{base}?state=forged&code=third")).await;
    assert_eq!(status, 409);

    server.close().await;
    assert_eq!(outcome_rx.await.unwrap(), CallbackOutcome::Code("first".into()));
}

#[tokio::test]
async fn test_callback_after_flow_gave_up() {
    let redirect = Url::parse("http://127.0.0.1:0/callback").unwrap();
    let (ctx, outcome_rx) = CallbackContext::new("issued-state".to_string());
    let server = CallbackServer::bind(&redirect, ctx).await.unwrap();
    let base = format!("http://{}/callback", server.local_addr());

    // the waiting side is gone, e.g. after a timeout
    drop(outcome_rx);

    let (status, _) = get(format!("{base}?state=issued-state&code=late")).await;
    assert_eq!(status, 200);
    let (status, _) = get(format!("{base}?state=issued-state&code=later")).await;
    assert_eq!(status, 409);

    server.close().await;
}

#[tokio::test]
async fn test_close_releases_port() {
    let redirect = Url::parse("http://127.0.0.1:0/callback").unwrap();
    let (ctx, _outcome_rx) = CallbackContext::new("issued-state".to_string());
    let server = CallbackServer::bind(&redirect, ctx).await.unwrap();
    let addr = server.local_addr();

    server.close().await;

    assert!(std::net::TcpListener::bind(addr).is_ok());
}
