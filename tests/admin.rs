mod common;

use chrono::Duration;
use common::*;
use loginguard::application_impl::RealAdminService;
use loginguard::application_port::*;
use loginguard::domain_model::*;
use loginguard::domain_port::Clock;

fn admin(h: &Harness) -> RealAdminService {
    RealAdminService::new(h.accounts.clone(), h.cache.clone(), h.clock.clone())
}

async fn lock(h: &Harness) {
    for _ in 0..3 {
        h.attempt(WRONG).await.unwrap_err();
    }
}

#[tokio::test]
async fn fast_forward_lets_the_account_sign_in_again() {
    let h = Harness::new();
    let admin = admin(&h);
    lock(&h).await;

    admin.fast_forward_lockout(&Email::new(EMAIL)).await.unwrap();

    h.attempt(PASSWORD).await.unwrap();
    assert_eq!(h.account().lockout_count, 0);
}

#[tokio::test]
async fn fast_forward_keeps_the_lockout_count() {
    let h = Harness::new();
    let admin = admin(&h);
    lock(&h).await;

    admin.fast_forward_lockout(&Email::new(EMAIL)).await.unwrap();
    assert_eq!(h.account().lockout_count, 1);

    // The next episode escalates from where the account left off.
    lock(&h).await;
    assert_eq!(h.account().lockout_count, 2);
    assert_eq!(h.account().lockout_remaining(h.clock.now()), Some(600));
}

#[tokio::test]
async fn reset_lockout_count_restarts_escalation() {
    let h = Harness::new();
    let admin = admin(&h);
    lock(&h).await;
    h.advance(Duration::minutes(5));
    lock(&h).await;
    assert_eq!(h.account().lockout_count, 2);

    admin.reset_lockout_count(&Email::new(EMAIL)).await.unwrap();
    admin.fast_forward_lockout(&Email::new(EMAIL)).await.unwrap();
    assert_eq!(h.account().lockout_count, 0);

    lock(&h).await;
    assert_eq!(h.account().lockout_count, 1);
}

#[tokio::test]
async fn lockout_status_reports_counters() {
    let h = Harness::new();
    let admin = admin(&h);
    let email = Email::new(EMAIL);

    h.attempt(WRONG).await.unwrap_err();
    assert_eq!(
        admin.lockout_status(&email).await.unwrap(),
        LockoutStatus {
            locked: false,
            remaining_seconds: 0,
            lockout_count: 0,
            failed_attempts: 1,
        }
    );

    h.attempt(WRONG).await.unwrap_err();
    h.attempt(WRONG).await.unwrap_err();
    h.advance(Duration::seconds(100));
    assert_eq!(
        admin.lockout_status(&email).await.unwrap(),
        LockoutStatus {
            locked: true,
            remaining_seconds: 200,
            lockout_count: 1,
            failed_attempts: 0,
        }
    );
}

#[tokio::test]
async fn unknown_account_is_reported() {
    let h = Harness::new();
    let admin = admin(&h);
    let ghost = Email::new("ghost@example.com");

    assert_eq!(
        admin.fast_forward_lockout(&ghost).await,
        Err(AdminError::AccountNotFound("ghost@example.com".to_string()))
    );
    assert!(matches!(
        admin.reset_lockout_count(&ghost).await,
        Err(AdminError::AccountNotFound(_))
    ));
    assert!(matches!(
        admin.lockout_status(&ghost).await,
        Err(AdminError::AccountNotFound(_))
    ));
}

#[tokio::test]
async fn corrupt_failed_counter_is_reported_not_hidden() {
    use loginguard::domain_port::EphemeralCache;

    let h = Harness::new();
    let admin = admin(&h);
    let email = Email::new(EMAIL);
    h.cache
        .set(
            &CacheKey::failed(&email),
            "not-a-number",
            std::time::Duration::from_secs(60),
        )
        .await
        .unwrap();

    match admin.lockout_status(&email).await {
        Err(AdminError::Upstream(reason)) => assert!(reason.contains(":failed")),
        other => panic!("expected upstream failure, got {:?}", other),
    }
}
