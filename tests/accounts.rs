mod common;

use postline::application::accounts::RegisterCommand;
use postline::application::auth::AuthContext;
use postline::application::error::ServiceError;
use postline::domain::accounts::DEFAULT_STATUS;

use common::Harness;

fn register(email: &str, password: &str) -> RegisterCommand {
    RegisterCommand {
        email: email.to_string(),
        name: "Max".to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn registration_creates_account_with_default_status() {
    let harness = Harness::new();
    let account = harness
        .accounts
        .register(register("max@example.com", "secret-pass"))
        .await
        .expect("register");

    assert_eq!(account.email, "max@example.com");
    assert_eq!(account.status, DEFAULT_STATUS);
    assert!(account.post_ids.is_empty());

    let stored = harness.store.account(account.id).expect("stored");
    assert_ne!(stored.password_hash, "secret-pass");
    assert!(stored.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn registration_reports_every_invalid_field() {
    let harness = Harness::new();
    let err = harness
        .accounts
        .register(register("not-an-email", "abc"))
        .await
        .unwrap_err();

    match err {
        ServiceError::ValidationFailed(violations) => {
            let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
            assert_eq!(fields, ["email", "password"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(harness.store.account_count(), 0);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let harness = Harness::new();
    harness
        .accounts
        .register(register("max@example.com", "secret-pass"))
        .await
        .expect("first registration");

    let err = harness
        .accounts
        .register(register("max@example.com", "another-pass"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists));
    assert_eq!(harness.store.account_count(), 1);
}

#[tokio::test]
async fn login_issues_a_credential_the_verifier_accepts() {
    let harness = Harness::new();
    let account = harness
        .accounts
        .register(register("max@example.com", "secret-pass"))
        .await
        .expect("register");

    let outcome = harness
        .accounts
        .login("max@example.com", "secret-pass")
        .await
        .expect("login");
    assert_eq!(outcome.user_id, account.id);

    let ctx = harness.verifier().verify(Some(&outcome.token));
    assert_eq!(
        ctx,
        AuthContext::authenticated(account.id, "max@example.com")
    );
}

#[tokio::test]
async fn unknown_email_and_wrong_password_fail_the_same_way() {
    let harness = Harness::new();
    harness
        .accounts
        .register(register("max@example.com", "secret-pass"))
        .await
        .expect("register");

    let unknown = harness
        .accounts
        .login("nobody@example.com", "secret-pass")
        .await
        .unwrap_err();
    let wrong = harness
        .accounts
        .login("max@example.com", "wrong-pass")
        .await
        .unwrap_err();

    assert!(matches!(unknown, ServiceError::InvalidCredentials));
    assert!(matches!(wrong, ServiceError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn tampered_credential_is_anonymous() {
    let harness = Harness::new();
    harness
        .accounts
        .register(register("max@example.com", "secret-pass"))
        .await
        .expect("register");
    let outcome = harness
        .accounts
        .login("max@example.com", "secret-pass")
        .await
        .expect("login");

    let mut tampered = outcome.token.clone();
    tampered.push('x');
    assert_eq!(
        harness.verifier().verify(Some(&tampered)),
        AuthContext::Anonymous
    );
}
