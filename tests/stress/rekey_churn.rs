//! Stress test: repeated rekeys across many entities.
//!
//! Every rekey must rotate the verkey, keep the chain moving, and leave
//! the agent able to mutate with the current key.

use std::sync::Arc;

use signet::{Agent, CreateOpts, MemoryRegistry, SignetKeyPair, Transport};

#[tokio::test]
async fn stress_rekey_churn() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut agent = Agent::new(registry.clone() as Arc<dyn Transport>);
    let org = SignetKeyPair::generate();
    let (org_pub, org_priv) = org.export_keys();
    agent.set_org_keys(&org_pub, &org_priv).unwrap();

    let mut entities = Vec::new();
    for _ in 0..20 {
        entities.push(agent.create_entity(CreateOpts::default()).await.unwrap());
    }

    for entity in &mut entities {
        let mut verkeys = vec![entity.verkey.clone()];
        for _ in 0..10 {
            agent.rekey(entity).await.expect("rekey should succeed");
            assert_ne!(entity.verkey, *verkeys.last().unwrap());
            verkeys.push(entity.verkey.clone());
        }
        // All 11 verkeys across the entity's history are distinct.
        let unique: std::collections::HashSet<_> = verkeys.iter().collect();
        assert_eq!(unique.len(), verkeys.len());
    }

    // After the churn every entity is still mutable with its current key.
    for (i, entity) in entities.iter_mut().enumerate() {
        agent
            .set_channel(entity, "REST", "v1", &format!("endpoint-{i}"))
            .await
            .expect("post-churn mutation should succeed");
        assert_eq!(
            entity.channel.as_deref(),
            Some(format!("REST#v1#endpoint-{i}").as_str())
        );
    }
}
