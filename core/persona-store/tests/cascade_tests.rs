use persona_model::{Profile, ProfileKind};
use persona_store::{
    CascadeCoordinator, FieldAttachment, ProfileBackend, ProfileStore, SqliteBackend, StoreError,
    StoreResult,
};
use persona_types::{ProfileId, SubjectEvent, SubjectId};
use std::sync::{Arc, Mutex};

fn store_with_kinds() -> ProfileStore {
    let store = ProfileStore::with_backend(Arc::new(SqliteBackend::open_in_memory().unwrap()));
    store
        .kinds()
        .upsert(&ProfileKind::new("test", "label"))
        .unwrap();
    store
        .kinds()
        .upsert(&ProfileKind::new("test2", "label2").with_weight(2))
        .unwrap();
    store
}

// ── kind deletion ────────────────────────────────────────────────

#[test]
fn delete_kind_cascades_to_attached_and_unattached() {
    let store = store_with_kinds();
    let subject = SubjectId::new();
    let attached = store
        .save(store.create("test", Some(subject)).unwrap())
        .unwrap();
    let unattached = store.save(store.create("test", None).unwrap()).unwrap();

    let deleted = store.delete_kind("test").unwrap();
    assert_eq!(deleted, 2);

    let all = store.load_multiple(&[], false).unwrap();
    assert!(!all.contains_key(&attached.id().unwrap()));
    assert!(!all.contains_key(&unattached.id().unwrap()));
}

#[test]
fn delete_kind_leaves_other_kinds_alone() {
    let store = store_with_kinds();
    let subject = SubjectId::new();
    store
        .save(store.create("test", Some(subject)).unwrap())
        .unwrap();
    let kept = store
        .save(store.create("test2", Some(subject)).unwrap())
        .unwrap();

    store.delete_kind("test").unwrap();

    let all = store.load_multiple(&[], false).unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.contains_key(&kept.id().unwrap()));
    let profiles = store.load_by_subject(subject).unwrap();
    assert_eq!(profiles.keys().collect::<Vec<_>>(), vec!["test2"]);
}

#[test]
fn delete_kind_with_no_profiles_cascades_nothing() {
    let store = store_with_kinds();
    assert_eq!(store.delete_kind("test").unwrap(), 0);
}

// ── subject removal ──────────────────────────────────────────────

#[test]
fn subject_removed_event_deletes_all_subject_profiles() {
    let store = store_with_kinds();
    let subject = SubjectId::new();
    store
        .save(store.create("test", Some(subject)).unwrap())
        .unwrap();
    store
        .save(store.create("test2", Some(subject)).unwrap())
        .unwrap();
    let unattached = store.save(store.create("test", None).unwrap()).unwrap();

    let coordinator = CascadeCoordinator::new(&store);
    let deleted = coordinator
        .apply(&SubjectEvent::Removed { subject })
        .unwrap();
    assert_eq!(deleted, 2);

    assert!(store.load_by_subject(subject).unwrap().is_empty());
    // Unattached profiles of the same kinds survive.
    assert!(store.load(unattached.id().unwrap()).is_ok());
}

#[test]
fn subject_removal_leaves_other_subjects_alone() {
    let store = store_with_kinds();
    let gone = SubjectId::new();
    let kept = SubjectId::new();
    store
        .save(store.create("test", Some(gone)).unwrap())
        .unwrap();
    store
        .save(store.create("test", Some(kept)).unwrap())
        .unwrap();

    CascadeCoordinator::new(&store)
        .on_subject_removed(gone)
        .unwrap();

    assert_eq!(store.load_by_subject(kept).unwrap().len(), 1);
}

// ── partial failure ──────────────────────────────────────────────

/// Backend wrapper that refuses to delete one configured profile row,
/// for exercising continue-on-error bulk semantics.
struct FailingDelete {
    inner: SqliteBackend,
    refuse: Mutex<Option<ProfileId>>,
}

impl FailingDelete {
    fn new() -> Self {
        Self {
            inner: SqliteBackend::open_in_memory().unwrap(),
            refuse: Mutex::new(None),
        }
    }

    fn refuse(&self, id: ProfileId) {
        *self.refuse.lock().unwrap() = Some(id);
    }
}

impl ProfileBackend for FailingDelete {
    fn insert(&self, profile: &Profile) -> StoreResult<ProfileId> {
        self.inner.insert(profile)
    }
    fn update(&self, profile: &Profile) -> StoreResult<()> {
        self.inner.update(profile)
    }
    fn select_by_id(&self, id: ProfileId) -> StoreResult<Option<Profile>> {
        self.inner.select_by_id(id)
    }
    fn select_by_ids(&self, ids: &[ProfileId]) -> StoreResult<Vec<Profile>> {
        self.inner.select_by_ids(ids)
    }
    fn select_all(&self) -> StoreResult<Vec<Profile>> {
        self.inner.select_all()
    }
    fn select_by_subject(&self, subject: SubjectId) -> StoreResult<Vec<Profile>> {
        self.inner.select_by_subject(subject)
    }
    fn select_ids_by_kind(&self, kind: &str) -> StoreResult<Vec<ProfileId>> {
        self.inner.select_ids_by_kind(kind)
    }
    fn delete_by_ids(&self, ids: &[ProfileId]) -> StoreResult<()> {
        if let Some(refused) = *self.refuse.lock().unwrap() {
            if ids.contains(&refused) {
                return Err(StoreError::Persistence(format!(
                    "simulated delete failure for profile {refused}"
                )));
            }
        }
        self.inner.delete_by_ids(ids)
    }
    fn select_kind_by_id(&self, id: &str) -> StoreResult<Option<ProfileKind>> {
        self.inner.select_kind_by_id(id)
    }
    fn select_all_kinds(&self) -> StoreResult<Vec<ProfileKind>> {
        self.inner.select_all_kinds()
    }
    fn upsert_kind(&self, kind: &ProfileKind) -> StoreResult<()> {
        self.inner.upsert_kind(kind)
    }
    fn delete_kind(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_kind(id)
    }
}

impl FieldAttachment for FailingDelete {
    fn load_fields(&self, kind: &str, id: ProfileId) -> StoreResult<serde_json::Value> {
        self.inner.load_fields(kind, id)
    }
    fn save_fields(
        &self,
        kind: &str,
        id: ProfileId,
        fields: &serde_json::Value,
    ) -> StoreResult<()> {
        self.inner.save_fields(kind, id, fields)
    }
    fn delete_fields(&self, kind: &str, id: ProfileId) -> StoreResult<()> {
        self.inner.delete_fields(kind, id)
    }
}

#[test]
fn bulk_delete_continues_past_failures_and_reports_them() {
    let backend = Arc::new(FailingDelete::new());
    let store = ProfileStore::with_backend(backend.clone());
    store
        .kinds()
        .upsert(&ProfileKind::new("test", "label"))
        .unwrap();

    let poisoned = store.save(store.create("test", None).unwrap()).unwrap();
    let healthy = store.save(store.create("test", None).unwrap()).unwrap();
    let poisoned_id = poisoned.id().unwrap();
    let healthy_id = healthy.id().unwrap();
    backend.refuse(poisoned_id);

    let err = store
        .delete_multiple(&[poisoned_id, healthy_id])
        .unwrap_err();
    let StoreError::Bulk {
        attempted,
        failures,
    } = err
    else {
        panic!("expected bulk failure");
    };
    assert_eq!(attempted, 2);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, poisoned_id);

    // The healthy profile was still deleted; the poisoned one survives.
    assert!(matches!(store.load(healthy_id), Err(StoreError::NotFound(_))));
    assert!(store.load(poisoned_id).is_ok());
}

#[test]
fn kind_cascade_reports_partial_failures() {
    let backend = Arc::new(FailingDelete::new());
    let store = ProfileStore::with_backend(backend.clone());
    store
        .kinds()
        .upsert(&ProfileKind::new("test", "label"))
        .unwrap();

    let poisoned = store.save(store.create("test", None).unwrap()).unwrap();
    store.save(store.create("test", None).unwrap()).unwrap();
    backend.refuse(poisoned.id().unwrap());

    let err = store.delete_kind("test").unwrap_err();
    assert!(matches!(err, StoreError::Bulk { .. }));

    // The definition is gone and the healthy profile was still cascaded.
    assert!(matches!(
        store.kinds().load("test"),
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.load_multiple(&[], false).unwrap().len(), 1);
}
