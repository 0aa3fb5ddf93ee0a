use std::sync::Arc;

use cl_core::ports::{EntryStorePort, UniqueIdClaim};
use cl_core::FlowId;
use cl_infra::InMemoryEntryStore;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_claims_have_exactly_one_winner() {
    let store = Arc::new(InMemoryEntryStore::new());

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .claim_unique_id(&FlowId::new(), "serial-42")
                    .await
                    .unwrap()
            })
        })
        .collect();

    let outcomes = futures::future::join_all(handles).await;
    let winners = outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap())
        .filter(|outcome| *outcome == UniqueIdClaim::Claimed)
        .count();

    assert_eq!(winners, 1);
}

#[tokio::test]
async fn release_is_idempotent() {
    let store = InMemoryEntryStore::new();
    let flow = FlowId::new();

    store.release_unique_id(&flow).await.unwrap();
    store.claim_unique_id(&flow, "serial").await.unwrap();
    store.release_unique_id(&flow).await.unwrap();
    store.release_unique_id(&flow).await.unwrap();

    assert_eq!(store.claim_of(&flow).await, None);
}
