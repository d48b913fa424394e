use vaultkit_types::{LoadState, VaultData};

fn loaded_all() -> (
    LoadState<Vec<vaultkit_types::CipherView>>,
    LoadState<Vec<vaultkit_types::FolderView>>,
    LoadState<Vec<vaultkit_types::CollectionView>>,
    LoadState<Vec<vaultkit_types::SendView>>,
) {
    (
        LoadState::Loaded(Vec::new()),
        LoadState::Loaded(Vec::new()),
        LoadState::Loaded(Vec::new()),
        LoadState::Loaded(Vec::new()),
    )
}

#[test]
fn all_loaded_combines_to_loaded() {
    let (c, f, col, s) = loaded_all();
    let combined = VaultData::combine(&c, &f, &col, &s);
    assert_eq!(combined, LoadState::Loaded(VaultData::default()));
}

#[test]
fn any_loading_combines_to_loading() {
    let (c, f, col, _) = loaded_all();
    let s = LoadState::Loading;
    assert!(VaultData::combine(&c, &f, &col, &s).is_loading());
}

#[test]
fn any_pending_combines_to_pending_with_data() {
    let (c, f, _, s) = loaded_all();
    let col = LoadState::Pending(Vec::new());
    let combined = VaultData::combine(&c, &f, &col, &s);
    assert!(combined.is_pending());
    assert!(combined.data().is_some());
}

#[test]
fn error_wins_over_everything() {
    let (c, _, col, _) = loaded_all();
    let f = LoadState::Error {
        cause: "folder decrypt".to_string(),
        last_good: Some(Vec::new()),
    };
    let s = LoadState::Unreachable { last_good: None };
    let combined = VaultData::combine(&c, &f, &col, &s);
    assert_eq!(combined.error_cause(), Some("folder decrypt"));
}

#[test]
fn unreachable_wins_over_loading_and_pending() {
    let (c, f, _, _) = loaded_all();
    let col = LoadState::Unreachable { last_good: Some(Vec::new()) };
    let s = LoadState::Loading;
    assert!(VaultData::combine(&c, &f, &col, &s).is_unreachable());
}

#[test]
fn aggregate_data_requires_all_inputs_to_carry_data() {
    let (c, f, col, _) = loaded_all();
    let s = LoadState::Error {
        cause: "x".to_string(),
        last_good: None,
    };
    let combined = VaultData::combine(&c, &f, &col, &s);
    // The send state has no last-good, so the aggregate carries none either.
    assert!(combined.data().is_none());
}
