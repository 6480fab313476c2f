//! User listing and sign-up admission tests.

use std::sync::Arc;

use crate::identity::{
    adapters::memory::InMemoryUserDirectory,
    domain::{AccountStatus, Actor, IdentityDomainError, SignUpPolicy, UserId, UserProfile},
    ports::DirectoryError,
    services::{SignUpGuard, UserQueryService},
};
use rstest::{fixture, rstest};

fn user(id: &str) -> UserProfile {
    UserProfile::new(UserId::new(id).expect("valid user id"), format!("{id}@example.test"))
}

#[fixture]
fn directory() -> InMemoryUserDirectory {
    InMemoryUserDirectory::with_users([
        user("carol"),
        user("alice").with_admin_group("Admins"),
        user("dave").disabled(),
        user("erin").with_status(AccountStatus::ForceChangePassword),
        user("frank").with_status(AccountStatus::Deactivated),
        user("bob").with_display_name("Bob B."),
    ])
}

fn admin() -> Actor {
    Actor::admin(UserId::new("alice").expect("valid user id"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_users_returns_only_listable_accounts_sorted(directory: InMemoryUserDirectory) {
    let service = UserQueryService::new(Arc::new(directory));

    let users = service
        .list_users(&admin())
        .await
        .expect("listing should succeed");

    let ids: Vec<&str> = users.iter().map(|profile| profile.user_id.as_str()).collect();
    assert_eq!(ids, ["alice", "bob", "carol"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_users_surfaces_directory_outage(directory: InMemoryUserDirectory) {
    directory.set_unavailable(true);
    let service = UserQueryService::new(Arc::new(directory));

    let result = service.list_users(&admin()).await;

    assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
}

#[rstest]
fn user_id_rejects_blank_values() {
    assert_eq!(UserId::new("   "), Err(IdentityDomainError::EmptyUserId));
    assert_eq!(
        UserId::new(" u-1 ").map(|id| id.to_string()),
        Ok("u-1".to_owned())
    );
}

#[rstest]
fn system_actor_is_admin_equivalent() {
    let actor = Actor::system("repository-webhook");

    assert!(actor.is_admin());
    assert!(actor.is_system());
    assert_eq!(actor.user_id().as_str(), "system:repository-webhook");
}

#[rstest]
#[case("someone@corp.example", true)]
#[case("SOMEONE@Corp.Example", true)]
#[case("someone@partner.example", true)]
#[case("someone@gmail.example", false)]
#[case("no-at-sign", false)]
fn sign_up_guard_applies_domain_allow_list(#[case] email: &str, #[case] admitted: bool) {
    let guard = SignUpGuard::new(SignUpPolicy::new([
        "corp.example".to_owned(),
        " Partner.Example ".to_owned(),
    ]));

    assert_eq!(guard.admit(email).is_ok(), admitted);
}

#[rstest]
fn empty_allow_list_admits_everyone() {
    let guard = SignUpGuard::default();

    assert!(guard.admit("anyone@anywhere.example").is_ok());
}

#[rstest]
fn rejected_domain_names_the_allow_list() {
    let policy = SignUpPolicy::new(["corp.example".to_owned()]);

    let result = policy.admit("x@other.example");

    assert_eq!(
        result,
        Err(IdentityDomainError::DomainNotAllowed {
            domain: "other.example".to_owned(),
            allowed: "corp.example".to_owned(),
        })
    );
}
