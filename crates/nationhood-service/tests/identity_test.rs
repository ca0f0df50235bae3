//! Integration tests for wallet sign-in using in-memory SurrealDB.

use nationhood_core::error::ErrorKind;
use nationhood_db::repository::SurrealUserRepository;
use nationhood_service::IdentityService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> IdentityService<SurrealUserRepository<Db>> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    nationhood_db::run_migrations(&db).await.unwrap();
    IdentityService::new(SurrealUserRepository::new(db))
}

#[tokio::test]
async fn authenticate_normalizes_and_is_idempotent() {
    let identity = setup().await;

    let first = identity.authenticate("  0xAbCd  ").await.unwrap();
    assert_eq!(first.address.as_str(), "0xabcd");
    assert!(first.nation_id.is_none());

    let second = identity.authenticate("0xabcd").await.unwrap();
    assert_eq!(second, first);
    assert_eq!(second.created_at, first.created_at);
}

#[tokio::test]
async fn authenticate_rejects_blank_address() {
    let identity = setup().await;

    let err = identity.authenticate("   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "Wallet address is required");
}

#[tokio::test]
async fn get_user_requires_prior_sign_in() {
    let identity = setup().await;

    let err = identity.get_user("0xnew").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    identity.authenticate("0xNEW").await.unwrap();
    let user = identity.get_user("0xnew").await.unwrap();
    assert_eq!(user.address.as_str(), "0xnew");
}
