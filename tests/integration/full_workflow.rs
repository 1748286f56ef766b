//! Integration test: full entity lifecycle against the in-memory registry.
//!
//! 1. Create an entity with no XID
//! 2. Set a channel, then an XID (neither update drops the other field)
//! 3. Rekey — the verkey changes
//! 4. A mutation signed with the pre-rekey key is rejected
//! 5. A mutation signed with the current key succeeds

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
async fn full_workflow_create_to_rekey() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut agent = new_agent(&registry);

    // ── Step 1: create ──────────────────────────────────────────────────
    let mut entity = agent
        .create_entity(CreateOpts::default())
        .await
        .expect("create should succeed");
    assert!(entity.xid.is_none());
    assert!(entity.channel.is_none());
    assert!(!entity.prev_sign.is_empty(), "create anchors the chain");
    let create_sign = entity.prev_sign.clone();

    // ── Step 2: set channel, then XID ───────────────────────────────────
    agent
        .set_channel(&mut entity, "REST", "v1", "abc123")
        .await
        .expect("set_channel should succeed");
    assert_eq!(entity.channel.as_deref(), Some("REST#v1#abc123"));
    let channel_sign = entity.prev_sign.clone();
    assert_ne!(channel_sign, create_sign, "each mutation advances the chain");

    agent
        .set_xid(&mut entity, "dn", "example.com", "x1")
        .await
        .expect("set_xid should succeed");
    assert_eq!(entity.xid.as_deref(), Some("dn:example.com:x1"));
    assert_eq!(
        entity.channel.as_deref(),
        Some("REST#v1#abc123"),
        "setting the XID must not drop the channel"
    );
    assert_ne!(entity.prev_sign, channel_sign);

    // ── Step 3: rekey ───────────────────────────────────────────────────
    let old_verkey = entity.verkey.clone();
    let (old_pub, old_priv) = agent
        .ownership_key_set(&entity.guid)
        .unwrap()
        .export_ownership_key_pair();
    agent.rekey(&mut entity).await.expect("rekey should succeed");
    assert_ne!(entity.verkey, old_verkey, "rekey must rotate the verkey");
    assert_eq!(
        entity.xid.as_deref(),
        Some("dn:example.com:x1"),
        "rekey must not touch the XID"
    );

    // ── Step 4: the superseded key is rejected ──────────────────────────
    let mut holdout = new_agent(&registry);
    let mut stale_view = holdout.fetch_entity(&entity.guid).await.unwrap();
    holdout
        .assign_entity(&stale_view, &old_pub, &old_priv)
        .unwrap();
    let result = holdout
        .set_xid(&mut stale_view, "dn", "example.com", "hijack")
        .await;
    assert!(
        matches!(result, Err(SignetError::RegistryRejected { .. })),
        "pre-rekey key must be rejected, got {result:?}"
    );
    assert_eq!(
        stale_view.xid.as_deref(),
        Some("dn:example.com:x1"),
        "rejected mutation must leave the mirror unchanged"
    );

    // ── Step 5: the current key still works ─────────────────────────────
    agent
        .set_xid(&mut entity, "dn", "example.com", "x2")
        .await
        .expect("current key should still be accepted");
    assert_eq!(entity.xid.as_deref(), Some("dn:example.com:x2"));
}

#[tokio::test]
async fn chain_rejects_replayed_prev_sign() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut agent = new_agent(&registry);

    let mut entity = agent.create_entity(CreateOpts::default()).await.unwrap();
    let stale = entity.clone();

    agent
        .set_channel(&mut entity, "REST", "v1", "abc123")
        .await
        .unwrap();

    // Replaying the pre-mutation chain anchor must be refused.
    let mut replay = stale.clone();
    let result = agent.set_channel(&mut replay, "REST", "v1", "evil").await;
    assert!(matches!(result, Err(SignetError::RegistryRejected { .. })));

    // The registry still holds the accepted mutation.
    let fetched = agent.fetch_entity(&entity.guid).await.unwrap();
    assert_eq!(fetched.channel.as_deref(), Some("REST#v1#abc123"));
    assert_eq!(fetched.prev_sign, entity.prev_sign);
}

#[tokio::test]
async fn prev_sign_chain_is_strictly_linked() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut agent = new_agent(&registry);

    let mut entity = agent.create_entity(CreateOpts::default()).await.unwrap();
    let mut anchors = vec![entity.prev_sign.clone()];

    for i in 0..5 {
        agent
            .set_channel(&mut entity, "REST", "v1", &format!("endpoint-{i}"))
            .await
            .unwrap();
        anchors.push(entity.prev_sign.clone());
    }

    // Every accepted mutation produced a fresh anchor.
    let unique: std::collections::HashSet<_> = anchors.iter().collect();
    assert_eq!(unique.len(), anchors.len());
}

#[tokio::test]
async fn duplicate_xid_is_rejected_across_entities() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut agent = new_agent(&registry);

    let mut first = agent.create_entity(CreateOpts::default()).await.unwrap();
    agent
        .set_xid(&mut first, "dn", "example.com", "taken")
        .await
        .unwrap();

    let mut second = agent.create_entity(CreateOpts::default()).await.unwrap();
    let result = agent.set_xid(&mut second, "dn", "example.com", "taken").await;
    assert!(matches!(
        result,
        Err(SignetError::RegistryRejected { status: 409, .. })
    ));
    assert!(second.xid.is_none());
}
