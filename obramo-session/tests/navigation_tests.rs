//! NavigationHost integration tests — sign-up, verification, role routing

mod common;

use std::sync::Arc;

use common::init_tracing;
use obramo_session::identity::InMemoryIdentityProvider;
use obramo_session::profile::{InMemoryProfileStore, NewProfile, ProfileResolver, Role};
use obramo_session::routing::{NavigationFlow, NavigationHost, NavigatorAction, RecordingNavigator};
use obramo_session::SessionConfig;

struct Harness {
    identity: Arc<InMemoryIdentityProvider>,
    resolver: ProfileResolver,
    navigator: RecordingNavigator,
    host: NavigationHost,
}

async fn start() -> Harness {
    init_tracing();
    let identity = InMemoryIdentityProvider::new();
    let resolver = ProfileResolver::new(Arc::new(InMemoryProfileStore::new()));
    let navigator = RecordingNavigator::new();
    let host = NavigationHost::start(
        identity.clone(),
        resolver.clone(),
        navigator.clone(),
        SessionConfig::default(),
    )
    .await
    .unwrap();
    Harness {
        identity,
        resolver,
        navigator,
        host,
    }
}

#[tokio::test]
async fn test_starts_on_auth_flow() {
    let h = start().await;

    h.host.wait_for_flow(Some(NavigationFlow::AuthFlow)).await.unwrap();
    assert_eq!(h.host.current_flow(), Some(NavigationFlow::AuthFlow));
    assert_eq!(h.navigator.mounted(), Some(NavigationFlow::AuthFlow));

    h.host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sign_up_verify_and_sign_out() {
    let h = start().await;
    h.host.wait_for_flow(Some(NavigationFlow::AuthFlow)).await.unwrap();

    // Sign-up screen: account first, then the profile document
    let principal = h.identity.sign_up("ana@example.com", "secret1").unwrap();
    h.resolver
        .create_profile(
            &principal.id,
            NewProfile::new("Ana", "ana@example.com", Role::Client)
                .with_phone("+55 11 91234-5678")
                .with_location("Campinas"),
        )
        .await
        .unwrap();
    h.host
        .wait_for_flow(Some(NavigationFlow::VerificationFlow))
        .await
        .unwrap();

    h.identity.send_verification_email().unwrap();
    assert_eq!(h.identity.verification_emails_sent(&principal.id), 1);

    // Confirming alone is not observed until the verify screen reloads
    h.identity.confirm_email(&principal.id).unwrap();
    assert_eq!(h.host.current_flow(), Some(NavigationFlow::VerificationFlow));

    h.identity.reload_principal().unwrap();
    h.host.wait_for_flow(Some(NavigationFlow::ClientFlow)).await.unwrap();

    let snapshot = h.host.session().current();
    let profile = snapshot.profile.unwrap();
    assert_eq!(profile.location, "Campinas");
    assert_eq!(profile.display_name(), "Ana");

    h.identity.sign_out();
    h.host.wait_for_flow(Some(NavigationFlow::AuthFlow)).await.unwrap();

    let mounts: Vec<_> = h
        .navigator
        .actions()
        .into_iter()
        .filter(|a| matches!(a, NavigatorAction::Mounted(_)))
        .collect();
    assert_eq!(
        mounts.last(),
        Some(&NavigatorAction::Mounted(NavigationFlow::AuthFlow))
    );
    assert!(mounts.contains(&NavigatorAction::Mounted(NavigationFlow::VerificationFlow)));
    assert!(mounts.contains(&NavigatorAction::Mounted(NavigationFlow::ClientFlow)));

    h.host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_professional_sign_in() {
    let h = start().await;

    let principal = h.identity.sign_up("bia@example.com", "secret1").unwrap();
    h.resolver
        .create_profile(
            &principal.id,
            NewProfile::new("Bia", "bia@example.com", Role::Professional),
        )
        .await
        .unwrap();
    h.identity.confirm_email(&principal.id).unwrap();
    h.identity.sign_out();
    h.host.wait_for_flow(Some(NavigationFlow::AuthFlow)).await.unwrap();

    // Returning user, already verified
    h.identity.sign_in("bia@example.com", "secret1").unwrap();
    h.host
        .wait_for_flow(Some(NavigationFlow::ProfessionalFlow))
        .await
        .unwrap();
    assert_eq!(h.navigator.mounted(), Some(NavigationFlow::ProfessionalFlow));

    h.host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_verified_account_without_profile_stays_on_auth() {
    let h = start().await;

    // Sign-up interrupted before the profile write
    let principal = h.identity.sign_up("caio@example.com", "secret1").unwrap();
    h.host
        .wait_for_flow(Some(NavigationFlow::VerificationFlow))
        .await
        .unwrap();
    h.identity.confirm_email(&principal.id).unwrap();
    h.identity.reload_principal().unwrap();

    let snapshot = h
        .host
        .session()
        .wait_for(|s| s.issue.is_some())
        .await
        .unwrap();
    assert_eq!(snapshot.flow, Some(NavigationFlow::AuthFlow));
    h.host.wait_for_flow(Some(NavigationFlow::AuthFlow)).await.unwrap();

    h.host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sign_in_again_once_profile_exists() {
    let h = start().await;

    let principal = h.identity.sign_up("ana@example.com", "secret1").unwrap();
    h.identity.confirm_email(&principal.id).unwrap();
    h.identity.reload_principal().unwrap();
    h.host
        .session()
        .wait_for(|s| s.issue.is_some())
        .await
        .unwrap();
    h.host.wait_for_flow(Some(NavigationFlow::AuthFlow)).await.unwrap();

    // Profile written late; the user logs in again from the auth screens
    h.resolver
        .create_profile(&principal.id, NewProfile::new("Ana", "ana@example.com", Role::Client))
        .await
        .unwrap();
    h.identity.sign_in("ana@example.com", "secret1").unwrap();

    h.host.wait_for_flow(Some(NavigationFlow::ClientFlow)).await.unwrap();
    assert_eq!(h.host.session().current().issue, None);

    h.host.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_releases_provider_listener() {
    let h = start().await;
    assert_eq!(h.identity.listener_count(), 1);

    h.host.shutdown().await.unwrap();
    assert_eq!(h.identity.listener_count(), 0);

    // Later provider activity reaches nobody
    h.identity.sign_up("davi@example.com", "secret1").unwrap();
    assert_eq!(h.identity.listener_count(), 0);
}
