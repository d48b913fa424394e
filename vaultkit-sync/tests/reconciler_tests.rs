//! Push-notification reconciliation behavior.

mod support;

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use support::*;
use vaultkit_api::ApiError;
use vaultkit_store::VaultStore;
use vaultkit_sync::UnlockPhase;
use vaultkit_types::{
    CipherDeleted, CipherId, CipherUpserted, CollectionId, FolderDeleted, FolderId,
    OrganizationId, SendDeleted, SendId, UserId,
};

fn upsert(id: CipherId, revision: chrono::DateTime<chrono::Utc>, is_update: bool) -> CipherUpserted {
    CipherUpserted {
        id,
        revision_date: revision,
        is_update,
        organization_id: None,
        collection_ids: Vec::new(),
    }
}

#[tokio::test]
async fn delete_notification_removes_cipher_even_while_locked() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let id = CipherId::new();
    vault
        .store
        .upsert_cipher(&user_id, make_cipher(id, "doomed", at(10)))
        .await
        .unwrap();
    // Active but never unlocked: deletions do not wait for key material.
    vault.client.set_active_user(user_id);

    vault
        .client
        .handle_cipher_deleted(&CipherDeleted { id })
        .await
        .unwrap();

    assert!(vault.store.ciphers(&user_id).borrow().is_empty());
}

#[tokio::test]
async fn stale_upsert_is_dropped_without_fetching() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let id = CipherId::new();
    let local = make_cipher(id, "current", at(100));
    vault.store.upsert_cipher(&user_id, local.clone()).await.unwrap();
    vault.activate_unlocked(user_id);

    vault
        .client
        .handle_cipher_upserted(&upsert(id, at(50), true))
        .await
        .unwrap();

    assert_eq!(vault.api.get_cipher.calls(), 0);
    assert_eq!(*vault.store.ciphers(&user_id).borrow(), vec![local]);
}

#[tokio::test]
async fn fresh_update_fetches_and_persists() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let id = CipherId::new();
    vault
        .store
        .upsert_cipher(&user_id, make_cipher(id, "old", at(50)))
        .await
        .unwrap();
    vault.activate_unlocked(user_id);

    let fetched = make_cipher(id, "new", at(100));
    vault.api.get_cipher.push(Ok(fetched.clone()));

    vault
        .client
        .handle_cipher_upserted(&upsert(id, at(100), true))
        .await
        .unwrap();

    assert_eq!(vault.api.get_cipher.calls(), 1);
    assert_eq!(*vault.store.ciphers(&user_id).borrow(), vec![fetched]);
}

#[tokio::test]
async fn update_for_unknown_cipher_is_dropped() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    vault.activate_unlocked(user_id);

    vault
        .client
        .handle_cipher_upserted(&upsert(CipherId::new(), at(100), true))
        .await
        .unwrap();

    assert_eq!(vault.api.get_cipher.calls(), 0);
    assert!(vault.store.ciphers(&user_id).borrow().is_empty());
}

#[tokio::test]
async fn create_for_already_cached_cipher_is_dropped() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let id = CipherId::new();
    vault
        .store
        .upsert_cipher(&user_id, make_cipher(id, "cached", at(50)))
        .await
        .unwrap();
    vault.activate_unlocked(user_id);

    vault
        .client
        .handle_cipher_upserted(&upsert(id, at(100), false))
        .await
        .unwrap();

    assert_eq!(vault.api.get_cipher.calls(), 0);
}

#[tokio::test]
async fn org_placement_in_known_collection_overrides_validity() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let org = OrganizationId::new();
    let collection = CollectionId::new();
    vault
        .store
        .replace_all(
            &user_id,
            &vaultkit_types::SyncSnapshot {
                profile: make_profile(user_id, "stamp-1"),
                ciphers: Vec::new(),
                folders: Vec::new(),
                collections: vec![make_collection(collection, org, "shared")],
                sends: Vec::new(),
                domains: vaultkit_types::DomainRules::default(),
            },
        )
        .await
        .unwrap();
    vault.activate_unlocked(user_id);

    // An update notification for a cipher we have never seen: normally
    // dropped, accepted here because it lands in a known collection.
    let id = CipherId::new();
    let mut fetched = make_cipher(id, "shared-item", at(100));
    fetched.organization_id = Some(org);
    fetched.collection_ids = vec![collection];
    vault.api.get_cipher.push(Ok(fetched.clone()));

    let notification = CipherUpserted {
        id,
        revision_date: at(100),
        is_update: true,
        organization_id: Some(org),
        collection_ids: vec![collection, CollectionId::new()],
    };
    vault.client.handle_cipher_upserted(&notification).await.unwrap();

    assert_eq!(*vault.store.ciphers(&user_id).borrow(), vec![fetched]);
}

#[tokio::test]
async fn org_placement_in_unknown_collections_is_dropped() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    vault.activate_unlocked(user_id);

    let notification = CipherUpserted {
        id: CipherId::new(),
        revision_date: at(100),
        is_update: true,
        organization_id: Some(OrganizationId::new()),
        collection_ids: vec![CollectionId::new()],
    };
    vault.client.handle_cipher_upserted(&notification).await.unwrap();

    assert_eq!(vault.api.get_cipher.calls(), 0);
}

#[tokio::test]
async fn fetch_not_found_deletes_the_local_copy() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let id = CipherId::new();
    vault
        .store
        .upsert_cipher(&user_id, make_cipher(id, "gone-upstream", at(50)))
        .await
        .unwrap();
    vault.activate_unlocked(user_id);

    // Endpoint falls back to NotFound when unprogrammed.
    vault
        .client
        .handle_cipher_upserted(&upsert(id, at(100), true))
        .await
        .unwrap();

    assert_eq!(vault.api.get_cipher.calls(), 1);
    assert!(vault.store.ciphers(&user_id).borrow().is_empty());
}

#[tokio::test]
async fn fetch_failure_is_absorbed() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let id = CipherId::new();
    let local = make_cipher(id, "kept", at(50));
    vault.store.upsert_cipher(&user_id, local.clone()).await.unwrap();
    vault.activate_unlocked(user_id);

    vault
        .api
        .get_cipher
        .push(Err(ApiError::Unexpected { status: 500 }));

    vault
        .client
        .handle_cipher_upserted(&upsert(id, at(100), true))
        .await
        .unwrap();

    assert_eq!(*vault.store.ciphers(&user_id).borrow(), vec![local]);
}

#[tokio::test]
async fn upsert_waits_for_unlock() {
    let vault = Arc::new(TestVault::new());
    let user_id = UserId::new();
    let id = CipherId::new();
    vault.client.set_active_user(user_id);

    let fetched = make_cipher(id, "deferred", at(100));
    vault.api.get_cipher.push(Ok(fetched.clone()));

    let worker = {
        let vault = Arc::clone(&vault);
        tokio::spawn(async move {
            vault
                .client
                .handle_cipher_upserted(&upsert(id, at(100), false))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!worker.is_finished());
    assert_eq!(vault.api.get_cipher.calls(), 0);

    vault
        .client
        .unlock_gate()
        .set_phase(user_id, UnlockPhase::Unlocked);
    worker.await.unwrap().unwrap();

    assert_eq!(*vault.store.ciphers(&user_id).borrow(), vec![fetched]);
}

#[tokio::test]
async fn folder_deletion_detaches_referencing_ciphers() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let deleted = FolderId::new();
    let kept = FolderId::new();
    vault
        .store
        .upsert_folder(&user_id, make_folder(deleted, "deleted", at(10)))
        .await
        .unwrap();

    let mut orphan = make_cipher(CipherId::new(), "orphaned", at(10));
    orphan.folder_id = Some(deleted);
    let mut untouched = make_cipher(CipherId::new(), "untouched", at(10));
    untouched.folder_id = Some(kept);
    vault.store.upsert_cipher(&user_id, orphan.clone()).await.unwrap();
    vault.store.upsert_cipher(&user_id, untouched.clone()).await.unwrap();
    vault.activate_unlocked(user_id);

    vault
        .client
        .handle_folder_deleted(&FolderDeleted { id: deleted })
        .await
        .unwrap();

    assert!(vault.store.folders(&user_id).borrow().is_empty());
    let ciphers = vault.store.ciphers(&user_id).borrow().clone();
    let orphan_after = ciphers.iter().find(|c| c.id == orphan.id).unwrap();
    let untouched_after = ciphers.iter().find(|c| c.id == untouched.id).unwrap();
    assert_eq!(orphan_after.folder_id, None);
    assert_eq!(untouched_after.folder_id, Some(kept));
}

#[tokio::test]
async fn send_deletion_removes_the_send() {
    let vault = TestVault::new();
    let user_id = UserId::new();
    let id = SendId::new();
    vault
        .store
        .upsert_send(&user_id, make_send(id, "doomed", at(10)))
        .await
        .unwrap();
    vault.activate_unlocked(user_id);

    vault
        .client
        .handle_send_deleted(&SendDeleted { id })
        .await
        .unwrap();

    assert!(vault.store.sends(&user_id).borrow().is_empty());
}
