mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use fintrack_client::guard::{LANDING_PATH, LOGIN_PATH};
use fintrack_client::models::LoginInput;
use fintrack_client::session::{CredentialPair, MemoryCredentialStore, SessionEvent};
use fintrack_client::Navigator;

use common::{MockApi, EMAIL, PASSWORD};

#[tokio::test]
async fn signed_out_visitor_lands_on_login() -> Result<()> {
    let api = MockApi::start().await?;
    let ctx = api.context()?;

    let mut navigator = Navigator::new(ctx, "/budgets");
    assert_eq!(navigator.location(), LOGIN_PATH);

    assert_eq!(navigator.navigate("/register"), "/register");
    assert_eq!(navigator.navigate("/favicon.ico"), "/favicon.ico");
    Ok(())
}

#[tokio::test]
async fn signed_in_visitor_skips_public_pages() -> Result<()> {
    let api = MockApi::start().await?;
    let (ctx, _store) = api.authorized_context()?;

    let mut navigator = Navigator::new(ctx, "/login");
    assert_eq!(navigator.location(), LANDING_PATH);
    assert_eq!(navigator.navigate("/transactions?page=2"), "/transactions?page=2");
    Ok(())
}

#[tokio::test]
async fn login_moves_navigator_to_landing_page() -> Result<()> {
    let api = MockApi::start().await?;
    let ctx = api.context()?;
    let mut navigator = Navigator::new(ctx.clone(), "/login");

    ctx.auth()
        .login(&LoginInput {
            email: EMAIL.into(),
            password: PASSWORD.into(),
        })
        .await?;

    assert_eq!(navigator.drain(), 1);
    assert_eq!(navigator.location(), LANDING_PATH);
    Ok(())
}

#[tokio::test]
async fn logout_returns_to_login() -> Result<()> {
    let api = MockApi::start().await?;
    let ctx = api.signed_in().await?;
    let mut navigator = Navigator::new(ctx.clone(), "/accounts");
    assert_eq!(navigator.location(), "/accounts");

    ctx.auth().logout()?;

    let event = tokio::time::timeout(Duration::from_secs(1), navigator.next_event()).await?;
    assert_eq!(event, Some(SessionEvent::LoggedOut));
    assert_eq!(navigator.location(), LOGIN_PATH);
    Ok(())
}

#[tokio::test]
async fn expired_session_clears_state_and_returns_to_login() -> Result<()> {
    let api = MockApi::start().await?;
    let ctx = api.signed_in().await?;
    ctx.accounts().list().await?;
    let mut navigator = Navigator::new(ctx.clone(), "/dashboard");

    api.revoke_access_tokens();
    api.fail_refresh();
    ctx.categories().list(None).await.unwrap_err();

    let event = tokio::time::timeout(Duration::from_secs(1), navigator.next_event()).await?;
    assert!(matches!(event, Some(SessionEvent::Expired { .. })));
    assert_eq!(navigator.location(), LOGIN_PATH);
    assert!(!ctx.session().is_authenticated());
    assert!(ctx.cache().is_empty());
    assert!(!ctx.has_credential());
    Ok(())
}

#[tokio::test]
async fn guard_only_checks_presence_of_credential() -> Result<()> {
    let api = MockApi::start().await?;
    // syntactically a credential, never accepted by the server
    let store = Arc::new(MemoryCredentialStore::with_pair(&CredentialPair::new(
        common::expired_token(),
        "refresh-stale",
    )));
    let ctx = api.context_with(store)?;

    let mut navigator = Navigator::new(ctx.clone(), "/budgets");
    assert_eq!(navigator.location(), "/budgets");

    // the first call catches the expiry and the navigator follows
    ctx.budgets().list().await.unwrap_err();
    navigator.drain();
    assert_eq!(navigator.location(), LOGIN_PATH);
    assert_eq!(api.total_hits(), 0);
    Ok(())
}

#[tokio::test]
async fn refresh_keeps_location() -> Result<()> {
    let api = MockApi::start().await?;
    let (ctx, _store) = api.authorized_context()?;
    let mut navigator = Navigator::new(ctx.clone(), "/budgets");

    api.revoke_access_tokens();
    ctx.budgets().list().await?;

    assert_eq!(navigator.drain(), 1);
    assert_eq!(navigator.location(), "/budgets");
    Ok(())
}
