//! Integration test: the co-ownership window.
//!
//! Agent A creates an entity and shares its ownership key material with
//! agent B out-of-band. Both can sign valid mutations until one of them
//! rekeys, at which point the other agent's key is stale and every later
//! mutation attempt is rejected by the registry — never detected locally.

use std::sync::Arc;

use signet::{Agent, CreateOpts, MemoryRegistry, SignetError, SignetKeyPair, Transport};

fn new_agent(registry: &Arc<MemoryRegistry>) -> Agent {
    let mut agent = Agent::new(registry.clone() as Arc<dyn Transport>);
    let org = SignetKeyPair::generate();
    let (org_pub, org_priv) = org.export_keys();
    agent.set_org_keys(&org_pub, &org_priv).unwrap();
    agent
}

#[tokio::test]
async fn both_owners_can_mutate_until_rekey() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut alice = new_agent(&registry);
    let mut bob = new_agent(&registry);

    // Alice creates and shares the ownership key material with Bob.
    let mut alice_view = alice.create_entity(CreateOpts::default()).await.unwrap();
    let (pub_text, priv_text) = alice
        .ownership_key_set(&alice_view.guid)
        .unwrap()
        .export_ownership_key_pair();

    let mut bob_view = bob.fetch_entity(&alice_view.guid).await.unwrap();
    bob.assign_entity(&bob_view, &pub_text, &priv_text).unwrap();

    // Bob mutates with the shared key.
    bob.set_channel(&mut bob_view, "REST", "v1", "bob-endpoint")
        .await
        .expect("co-owner should be able to mutate");

    // Alice's mirror is stale now; she refetches, then mutates.
    alice_view = alice.fetch_entity(&alice_view.guid).await.unwrap();
    alice
        .set_xid(&mut alice_view, "dn", "example.com", "alice")
        .await
        .expect("creator should still be able to mutate");

    // Bob rekeys — exclusivity regained.
    bob_view = bob.fetch_entity(&bob_view.guid).await.unwrap();
    bob.rekey(&mut bob_view).await.expect("rekey should succeed");

    // Alice's key is now stale; even a fresh fetch does not help, because
    // staleness lives in the key, not in the mirror.
    alice_view = alice.fetch_entity(&alice_view.guid).await.unwrap();
    let result = alice
        .set_xid(&mut alice_view, "dn", "example.com", "too-late")
        .await;
    assert!(
        matches!(result, Err(SignetError::RegistryRejected { .. })),
        "stale co-owner must be rejected, got {result:?}"
    );

    // Bob keeps full control.
    bob.set_xid(&mut bob_view, "dn", "example.com", "bob")
        .await
        .expect("rekeyed owner should keep full control");
}

#[tokio::test]
async fn divergent_mutations_accept_at_most_one() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut alice = new_agent(&registry);
    let mut bob = new_agent(&registry);

    let mut alice_view = alice.create_entity(CreateOpts::default()).await.unwrap();
    let (pub_text, priv_text) = alice
        .ownership_key_set(&alice_view.guid)
        .unwrap()
        .export_ownership_key_pair();
    let mut bob_view = bob.fetch_entity(&alice_view.guid).await.unwrap();
    bob.assign_entity(&bob_view, &pub_text, &priv_text).unwrap();

    // Both build mutations from the same chain anchor; the registry
    // accepts the first and rejects the loser of the race.
    alice
        .set_channel(&mut alice_view, "REST", "v1", "alice-wins")
        .await
        .expect("first writer wins");
    let result = bob
        .set_channel(&mut bob_view, "REST", "v1", "bob-loses")
        .await;
    assert!(matches!(result, Err(SignetError::RegistryRejected { .. })));

    let fetched = alice.fetch_entity(&alice_view.guid).await.unwrap();
    assert_eq!(fetched.channel.as_deref(), Some("REST#v1#alice-wins"));
}

#[tokio::test]
async fn assignment_does_not_touch_the_registry() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut alice = new_agent(&registry);
    let mut bob = new_agent(&registry);

    let alice_view = alice.create_entity(CreateOpts::default()).await.unwrap();
    let verkey_before = alice.fetch_entity(&alice_view.guid).await.unwrap().verkey;

    let (pub_text, priv_text) = alice
        .ownership_key_set(&alice_view.guid)
        .unwrap()
        .export_ownership_key_pair();
    let bob_view = bob.fetch_entity(&alice_view.guid).await.unwrap();
    bob.assign_entity(&bob_view, &pub_text, &priv_text).unwrap();

    // Assignment is purely local: the registry record is unchanged.
    let verkey_after = alice.fetch_entity(&alice_view.guid).await.unwrap().verkey;
    assert_eq!(verkey_before, verkey_after);
}
