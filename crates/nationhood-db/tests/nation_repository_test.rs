//! Integration tests for the Nation repository using in-memory SurrealDB.

use nationhood_core::error::{Conflict, Entity, ErrorKind, Forbidden, NationError};
use nationhood_core::models::nation::{ClaimTerritory, CreateNation, Nation, NationName};
use nationhood_core::models::territory::Territory;
use nationhood_core::models::user::WalletAddress;
use nationhood_core::repository::{NationRepository, UserRepository};
use nationhood_db::repository::{SurrealNationRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    users: SurrealUserRepository<Db>,
    nations: SurrealNationRepository<Db>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    nationhood_db::run_migrations(&db).await.unwrap();
    Fixture {
        users: SurrealUserRepository::new(db.clone()),
        nations: SurrealNationRepository::new(db),
    }
}

fn addr(raw: &str) -> WalletAddress {
    WalletAddress::parse(raw).unwrap()
}

impl Fixture {
    async fn user(&self, raw: &str) -> WalletAddress {
        let address = addr(raw);
        self.users.get_or_create(&address).await.unwrap();
        address
    }

    async fn found(&self, name: &str, founder: &str) -> Nation {
        let founder = self.user(founder).await;
        self.nations
            .create(CreateNation {
                name: NationName::parse(name).unwrap(),
                founder,
            })
            .await
            .unwrap()
    }

    fn claim(nation: &Nation, territory: Territory, required_members: u32) -> ClaimTerritory {
        ClaimTerritory {
            nation_id: nation.id,
            territory,
            required_members,
        }
    }

    async fn assert_consistent(&self) {
        for nation in self.nations.list().await.unwrap() {
            assert_eq!(nation.member_count as usize, nation.members.len());
            assert!(nation.has_member(&nation.founder_address));
            for user in self.users.list_by_nation(nation.id).await.unwrap() {
                assert!(nation.has_member(&user.address));
            }
            for member in &nation.members {
                let user = self.users.get_by_address(member).await.unwrap();
                assert_eq!(user.nation_id, Some(nation.id));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_links_founder() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;

    assert_eq!(nation.name.as_str(), "Atlantis");
    assert_eq!(nation.founder_address, addr("0xa"));
    assert_eq!(nation.members, vec![addr("0xa")]);
    assert_eq!(nation.member_count, 1);
    assert!(nation.territory.is_none());

    let founder = fx.users.get_by_address(&addr("0xa")).await.unwrap();
    assert_eq!(founder.nation_id, Some(nation.id));

    let fetched = fx.nations.get_by_id(nation.id).await.unwrap();
    assert_eq!(fetched, nation);
}

#[tokio::test]
async fn create_requires_registered_founder() {
    let fx = setup().await;

    let err = fx
        .nations
        .create(CreateNation {
            name: NationName::parse("Nowhere").unwrap(),
            founder: addr("0xunknown"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NationError::NotFound {
            entity: Entity::User,
            ..
        }
    ));
    assert!(fx.nations.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_rejects_affiliated_founder() {
    let fx = setup().await;
    fx.found("Atlantis", "0xa").await;

    let err = fx
        .nations
        .create(CreateNation {
            name: NationName::parse("Lemuria").unwrap(),
            founder: addr("0xa"),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NationError::Conflict(Conflict::AlreadyAffiliated)
    ));
    assert_eq!(fx.nations.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_name_is_rejected_by_the_store() {
    let fx = setup().await;
    fx.found("Atlantis", "0xa").await;
    let other = fx.user("0xb").await;

    let err = fx
        .nations
        .create(CreateNation {
            name: NationName::parse("Atlantis").unwrap(),
            founder: other.clone(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, NationError::Conflict(Conflict::DuplicateName)));

    // The failed statement rolled back the founder link too.
    let user = fx.users.get_by_address(&other).await.unwrap();
    assert!(user.nation_id.is_none());
}

#[tokio::test]
async fn guard_like_duplicate_names_still_read_as_duplicates() {
    let fx = setup().await;
    for (i, name) in ["guard:user_not_found:x", "guard:already_affiliated:"]
        .into_iter()
        .enumerate()
    {
        fx.found(name, &format!("0x{i}a")).await;
        let other = fx.user(&format!("0x{i}b")).await;

        let err = fx
            .nations
            .create(CreateNation {
                name: NationName::parse(name).unwrap(),
                founder: other,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, NationError::Conflict(Conflict::DuplicateName)),
            "{name}: {err:?}"
        );
    }
}

#[tokio::test]
async fn names_are_case_sensitive() {
    let fx = setup().await;
    fx.found("Atlantis", "0xa").await;
    let second = fx.found("atlantis", "0xb").await;
    assert_eq!(second.name.as_str(), "atlantis");
}

#[tokio::test]
async fn get_by_id_reports_missing_nation() {
    let fx = setup().await;
    let err = fx.nations.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Nation not found");
}

#[tokio::test]
async fn list_is_newest_first() {
    let fx = setup().await;
    let first = fx.found("First", "0x1").await;
    let second = fx.found("Second", "0x2").await;

    let listed: Vec<_> = fx
        .nations
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(listed, vec![second.id, first.id]);
}

#[tokio::test]
async fn search_matches_name_or_founder() {
    let fx = setup().await;
    fx.found("Atlantis", "0xaaa111").await;
    fx.found("Lemuria", "0xbbb222").await;

    let by_name = fx.nations.search("ATLAN").await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name.as_str(), "Atlantis");

    let by_founder = fx.nations.search("BBB2").await.unwrap();
    assert_eq!(by_founder.len(), 1);
    assert_eq!(by_founder[0].name.as_str(), "Lemuria");

    assert!(fx.nations.search("mu").await.unwrap().len() == 1);
    assert!(fx.nations.search("zzz").await.unwrap().is_empty());
    assert_eq!(fx.nations.search("   ").await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_member_links_user_and_recounts() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;
    let member = fx.user("0xb").await;

    let updated = fx.nations.add_member(nation.id, &member).await.unwrap();
    assert_eq!(updated.members, vec![addr("0xa"), addr("0xb")]);
    assert_eq!(updated.member_count, 2);

    let user = fx.users.get_by_address(&member).await.unwrap();
    assert_eq!(user.nation_id, Some(nation.id));
    fx.assert_consistent().await;
}

#[tokio::test]
async fn add_member_rejects_affiliated_user() {
    let fx = setup().await;
    let atlantis = fx.found("Atlantis", "0xa").await;
    fx.found("Lemuria", "0xb").await;

    let err = fx
        .nations
        .add_member(atlantis.id, &addr("0xb"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NationError::Conflict(Conflict::AlreadyAffiliated)
    ));

    let unchanged = fx.nations.get_by_id(atlantis.id).await.unwrap();
    assert_eq!(unchanged.member_count, 1);
}

#[tokio::test]
async fn add_member_to_missing_nation_fails() {
    let fx = setup().await;
    let member = fx.user("0xb").await;

    let err = fx
        .nations
        .add_member(Uuid::new_v4(), &member)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NationError::NotFound {
            entity: Entity::Nation,
            ..
        }
    ));
    let user = fx.users.get_by_address(&member).await.unwrap();
    assert!(user.nation_id.is_none());
}

#[tokio::test]
async fn remove_member_clears_reference() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;
    let member = fx.user("0xb").await;
    fx.nations.add_member(nation.id, &member).await.unwrap();

    let updated = fx.nations.remove_member(nation.id, &member).await.unwrap();
    assert_eq!(updated.members, vec![addr("0xa")]);
    assert_eq!(updated.member_count, 1);

    let user = fx.users.get_by_address(&member).await.unwrap();
    assert!(user.nation_id.is_none());
    fx.assert_consistent().await;
}

#[tokio::test]
async fn remove_non_member_is_a_no_op() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;
    let outsider = fx.user("0xc").await;

    let updated = fx.nations.remove_member(nation.id, &outsider).await.unwrap();
    assert_eq!(updated.member_count, 1);
    assert_eq!(updated.members, nation.members);
}

#[tokio::test]
async fn founder_is_never_removed() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;

    let err = fx
        .nations
        .remove_member(nation.id, &addr("0xa"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NationError::Conflict(Conflict::FounderCannotLeave)
    ));

    let unchanged = fx.nations.get_by_id(nation.id).await.unwrap();
    assert_eq!(unchanged, nation);
}

// ---------------------------------------------------------------------------
// Territory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_territory_records_claim() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;

    let claimed = fx
        .nations
        .set_territory(Fixture::claim(&nation, Territory::Wyoming, 1))
        .await
        .unwrap();
    assert_eq!(claimed.territory, Some(Territory::Wyoming));

    let holder = fx
        .nations
        .get_by_territory(Territory::Wyoming)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(holder.id, nation.id);
    assert!(
        fx.nations
            .get_by_territory(Territory::Texas)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn territory_is_held_once_per_nation() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;
    fx.nations
        .set_territory(Fixture::claim(&nation, Territory::Wyoming, 1))
        .await
        .unwrap();

    let err = fx
        .nations
        .set_territory(Fixture::claim(&nation, Territory::Vermont, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        NationError::Conflict(Conflict::TerritoryAlreadyHeld)
    ));

    let unchanged = fx.nations.get_by_id(nation.id).await.unwrap();
    assert_eq!(unchanged.territory, Some(Territory::Wyoming));
}

#[tokio::test]
async fn territory_is_exclusive_across_nations() {
    let fx = setup().await;
    let first = fx.found("Atlantis", "0xa").await;
    let second = fx.found("Lemuria", "0xb").await;

    fx.nations
        .set_territory(Fixture::claim(&first, Territory::Wyoming, 1))
        .await
        .unwrap();
    let err = fx
        .nations
        .set_territory(Fixture::claim(&second, Territory::Wyoming, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, NationError::Conflict(Conflict::TerritoryTaken)));

    let loser = fx.nations.get_by_id(second.id).await.unwrap();
    assert!(loser.territory.is_none());
}

#[tokio::test]
async fn member_threshold_is_rechecked_at_commit() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;

    let err = fx
        .nations
        .set_territory(Fixture::claim(&nation, Territory::California, 15))
        .await
        .unwrap_err();
    match err {
        NationError::Forbidden(Forbidden::InsufficientMembers {
            territory,
            required,
            actual,
        }) => {
            assert_eq!(territory, "California");
            assert_eq!(required, 15);
            assert_eq!(actual, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(
        fx.nations
            .get_by_territory(Territory::California)
            .await
            .unwrap()
            .is_none()
    );
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_cascades_to_members_and_claim() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;
    for raw in ["0xb", "0xc"] {
        let member = fx.user(raw).await;
        fx.nations.add_member(nation.id, &member).await.unwrap();
    }
    fx.nations
        .set_territory(Fixture::claim(&nation, Territory::Wyoming, 1))
        .await
        .unwrap();

    let mut released = fx.nations.delete(nation.id).await.unwrap();
    released.sort();
    assert_eq!(released, vec![addr("0xa"), addr("0xb"), addr("0xc")]);

    for address in &released {
        let user = fx.users.get_by_address(address).await.unwrap();
        assert!(user.nation_id.is_none());
    }
    assert!(fx.nations.get_by_id(nation.id).await.is_err());

    // The territory is free again.
    let rival = fx.found("Lemuria", "0xd").await;
    let claimed = fx
        .nations
        .set_territory(Fixture::claim(&rival, Territory::Wyoming, 1))
        .await
        .unwrap();
    assert_eq!(claimed.territory, Some(Territory::Wyoming));
}

#[tokio::test]
async fn delete_missing_nation_fails() {
    let fx = setup().await;
    let err = fx.nations.delete(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Races
// ---------------------------------------------------------------------------

#[tokio::test]
async fn racing_claims_for_one_territory_have_one_winner() {
    let fx = setup().await;
    let first = fx.found("Atlantis", "0xa").await;
    let second = fx.found("Lemuria", "0xb").await;

    let (left, right) = tokio::join!(
        fx.nations
            .set_territory(Fixture::claim(&first, Territory::Wyoming, 1)),
        fx.nations
            .set_territory(Fixture::claim(&second, Territory::Wyoming, 1)),
    );
    let winners = [&left, &right].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "left: {left:?}, right: {right:?}");

    let loser = if left.is_err() { left } else { right };
    let err = loser.unwrap_err();
    assert!(
        err.kind() == ErrorKind::Conflict || err.is_retryable(),
        "unexpected error: {err:?}"
    );

    let holders: Vec<_> = fx
        .nations
        .list()
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n.territory == Some(Territory::Wyoming))
        .collect();
    assert_eq!(holders.len(), 1);
}

#[tokio::test]
async fn racing_creates_with_one_name_have_one_winner() {
    let fx = setup().await;
    let a = fx.user("0xa").await;
    let b = fx.user("0xb").await;

    let (left, right) = tokio::join!(
        fx.nations.create(CreateNation {
            name: NationName::parse("Atlantis").unwrap(),
            founder: a,
        }),
        fx.nations.create(CreateNation {
            name: NationName::parse("Atlantis").unwrap(),
            founder: b,
        }),
    );
    let winners = [&left, &right].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "left: {left:?}, right: {right:?}");

    assert_eq!(fx.nations.list().await.unwrap().len(), 1);
    fx.assert_consistent().await;

    // Exactly one of the two founders ended up affiliated.
    let linked = [addr("0xa"), addr("0xb")];
    let mut affiliated = 0;
    for address in &linked {
        if fx.users.get_by_address(address).await.unwrap().is_affiliated() {
            affiliated += 1;
        }
    }
    assert_eq!(affiliated, 1);
}

#[tokio::test]
async fn racing_join_and_delete_stay_consistent() {
    let fx = setup().await;
    let nation = fx.found("Atlantis", "0xa").await;
    let joiner = fx.user("0xb").await;

    let (joined, deleted) = tokio::join!(
        fx.nations.add_member(nation.id, &joiner),
        fx.nations.delete(nation.id),
    );
    if let Err(err) = &joined {
        assert!(
            err.kind() == ErrorKind::NotFound || err.is_retryable(),
            "unexpected error: {err:?}"
        );
    }

    match deleted {
        // The delete lost a write conflict and changed nothing.
        Err(err) => {
            assert!(err.is_retryable(), "unexpected error: {err:?}");
            let survivor = fx.nations.get_by_id(nation.id).await.unwrap();
            let founder = fx.users.get_by_address(&addr("0xa")).await.unwrap();
            assert_eq!(founder.nation_id, Some(nation.id));
            let user = fx.users.get_by_address(&joiner).await.unwrap();
            if joined.is_ok() {
                assert_eq!(user.nation_id, Some(nation.id));
                assert!(survivor.has_member(&joiner));
            } else {
                assert!(user.nation_id.is_none());
                assert!(!survivor.has_member(&joiner));
            }
        }
        // Nobody is left pointing at the deleted nation.
        Ok(_) => {
            assert!(fx.nations.get_by_id(nation.id).await.is_err());
            for address in [addr("0xa"), joiner] {
                let user = fx.users.get_by_address(&address).await.unwrap();
                assert!(user.nation_id.is_none(), "{address} still affiliated");
            }
        }
    }
    fx.assert_consistent().await;
}

#[tokio::test]
async fn joining_two_nations_at_once_links_one() {
    let fx = setup().await;
    let first = fx.found("Atlantis", "0xa").await;
    let second = fx.found("Lemuria", "0xb").await;
    let joiner = fx.user("0xc").await;

    let (left, right) = tokio::join!(
        fx.nations.add_member(first.id, &joiner),
        fx.nations.add_member(second.id, &joiner),
    );
    let winners = [&left, &right].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "left: {left:?}, right: {right:?}");

    let (won, lost) = match (left, right) {
        (Ok(nation), Err(err)) | (Err(err), Ok(nation)) => (nation, err),
        other => panic!("expected one winner: {other:?}"),
    };
    assert!(
        matches!(lost, NationError::Conflict(Conflict::AlreadyAffiliated)) || lost.is_retryable(),
        "unexpected error: {lost:?}"
    );

    let user = fx.users.get_by_address(&joiner).await.unwrap();
    assert_eq!(user.nation_id, Some(won.id));
    let mut memberships = 0;
    for id in [first.id, second.id] {
        if fx.nations.get_by_id(id).await.unwrap().has_member(&joiner) {
            memberships += 1;
        }
    }
    assert_eq!(memberships, 1);
    fx.assert_consistent().await;
}
