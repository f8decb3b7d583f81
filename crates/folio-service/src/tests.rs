//! Behavioural tests for `VersionService` over an in-memory SQLite store.

use std::{
  collections::HashSet,
  io,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use bytes::Bytes;
use folio_core::{
  Error,
  content::{ContentBackend, ContentRef},
  document::{AuthorId, Document, DocumentVersion, NewDocument, NewVersion, VersionKind},
  mode::Mode,
  page::{Page, VersionQuery},
  permission::{AllowAll, Capability, Permissions},
  store::{AppendOutcome, VersionStore},
};
use folio_store_sqlite::SqliteStore;
use tokio::{sync::Notify, task::JoinHandle, time::Instant};
use uuid::Uuid;

use crate::{ConflictPolicy, ServiceConfig, VersionService};

type Service = VersionService<SqliteStore, SqliteStore, AllowAll>;

fn author(s: &str) -> AuthorId { AuthorId::new(s).unwrap() }

fn config(conflict_policy: ConflictPolicy) -> ServiceConfig {
  ServiceConfig { conflict_policy, ..ServiceConfig::default() }
}

async fn service() -> Service {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  VersionService::new(store.clone(), store, AllowAll, ServiceConfig::default())
}

async fn new_document<S, C, P>(svc: &VersionService<S, C, P>) -> Document
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  let (doc, _) = svc
    .create_document(author("owner"), Bytes::from_static(b"first draft"))
    .await
    .unwrap();
  doc
}

async fn all_versions(svc: &Service, id: Uuid) -> Vec<DocumentVersion> {
  svc.history(id, 100).collect_remaining().await.unwrap()
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scenario_walkthrough() {
  let svc = Arc::new(service().await);

  // 1: create → version 1 in alpha.
  let (doc, v1) = svc
    .create_document(author("owner"), Bytes::from_static(b"first draft"))
    .await
    .unwrap();
  assert_eq!(doc.current_mode, Mode::Alpha);
  assert_eq!(v1.version_number, 1);
  assert_eq!(v1.kind(), VersionKind::Initial);

  // 2: alpha → beta.
  let v2 = svc
    .transition_mode(doc.id, Mode::Beta, author("user1"))
    .await
    .unwrap();
  assert_eq!(v2.version_number, 2);
  assert_eq!(v2.mode, Mode::Beta);
  assert_eq!(v2.previous_mode, Some(Mode::Alpha));
  assert!(v2.is_mode_transition);
  assert_eq!(v2.content_ref, v1.content_ref);
  assert_eq!(v2.change_summary, "Transitioned alpha → beta");

  // 3: commit while in beta.
  let v3 = svc
    .commit(doc.id, Bytes::from_static(b"fixed typo"), author("user1"), "Fixed typo")
    .await
    .unwrap();
  assert_eq!(v3.version_number, 3);
  assert_eq!(v3.mode, Mode::Beta);
  assert!(!v3.is_mode_transition);
  assert_eq!(v3.change_summary, "Fixed typo");
  assert_eq!(v3.content_ref, ContentRef::digest(b"fixed typo"));

  // 4: restore version 1; mode stays beta.
  let v4 = svc.restore(doc.id, 1, author("user2")).await.unwrap();
  assert_eq!(v4.version_number, 4);
  assert_eq!(v4.content_ref, v1.content_ref);
  assert_eq!(v4.mode, Mode::Beta);
  assert_eq!(v4.restored_from_version, Some(1));
  assert_eq!(v4.change_summary, "Restored from version 1");
  assert_eq!(v4.author_id, author("user2"));

  // 5: two concurrent moves to publish; exactly one wins.
  let id = doc.id;
  let a = tokio::spawn({
    let svc = svc.clone();
    async move { svc.transition_mode(id, Mode::Publish, author("user1")).await }
  });
  let b = tokio::spawn({
    let svc = svc.clone();
    async move { svc.transition_mode(id, Mode::Publish, author("user2")).await }
  });
  let results = [a.await.unwrap(), b.await.unwrap()];

  let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
  assert_eq!(winners.len(), 1);
  assert_eq!(winners[0].version_number, 5);
  assert_eq!(winners[0].mode, Mode::Publish);
  assert_eq!(winners[0].previous_mode, Some(Mode::Beta));
  for loser in results.iter().filter_map(|r| r.as_ref().err()) {
    assert!(
      matches!(
        loser,
        Error::NoOpTransition(Mode::Publish) | Error::ConcurrentModificationConflict(_)
      ),
      "unexpected error: {loser}"
    );
  }

  let head = svc.get_document(doc.id).await.unwrap();
  assert_eq!(head.current_version_number, 5);
  assert_eq!(head.current_mode, Mode::Publish);
}

// ─── Invariants ──────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_are_contiguous() {
  const N: usize = 16;
  let svc = Arc::new(service().await);
  let id = new_document(&*svc).await.id;

  let handles: Vec<_> = (0..N)
    .map(|i| {
      let svc = svc.clone();
      tokio::spawn(async move {
        svc
          .commit(
            id,
            Bytes::from(format!("edit {i}")),
            author("writer"),
            &format!("edit {i}"),
          )
          .await
      })
    })
    .collect();

  let mut numbers = HashSet::new();
  for h in handles {
    let v = h.await.unwrap().unwrap();
    assert!(numbers.insert(v.version_number), "duplicate {}", v.version_number);
  }
  let expected: HashSet<u64> = (2..=(N as u64 + 1)).collect();
  assert_eq!(numbers, expected);

  let head = svc.get_document(id).await.unwrap();
  assert_eq!(head.current_version_number, N as u64 + 1);
}

#[tokio::test]
async fn head_version_carries_current_mode() {
  let svc = service().await;
  let doc = new_document(&svc).await;

  svc.transition_mode(doc.id, Mode::Read, author("u")).await.unwrap();
  svc.commit(doc.id, Bytes::from_static(b"x"), author("u"), "x").await.unwrap();
  svc.transition_mode(doc.id, Mode::Alpha, author("u")).await.unwrap();
  svc.restore(doc.id, 3, author("u")).await.unwrap();

  let head = svc.get_document(doc.id).await.unwrap();
  let newest = svc.get_version(doc.id, head.current_version_number).await.unwrap();
  assert_eq!(newest.mode, head.current_mode);
  assert_eq!(head.current_mode, Mode::Alpha);

  let versions = all_versions(&svc, doc.id).await;
  let numbers: Vec<_> = versions.iter().map(|v| v.version_number).collect();
  assert_eq!(numbers, [5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn no_op_transition_creates_nothing() {
  let svc = service().await;
  let doc = new_document(&svc).await;

  let err = svc
    .transition_mode(doc.id, Mode::Alpha, author("user1"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoOpTransition(Mode::Alpha)));

  let head = svc.get_document(doc.id).await.unwrap();
  assert_eq!(head.current_version_number, 1);
}

#[tokio::test]
async fn any_mode_can_reach_any_other() {
  let svc = service().await;
  let doc = new_document(&svc).await;

  for target in [Mode::Read, Mode::Beta, Mode::Publish, Mode::Alpha, Mode::Publish] {
    let v = svc.transition_mode(doc.id, target, author("u")).await.unwrap();
    assert_eq!(v.mode, target);
  }
}

#[tokio::test]
async fn restoring_twice_gives_two_versions() {
  let svc = service().await;
  let doc = new_document(&svc).await;
  svc.commit(doc.id, Bytes::from_static(b"v2"), author("u"), "v2").await.unwrap();

  let a = svc.restore(doc.id, 1, author("u")).await.unwrap();
  let b = svc.restore(doc.id, 1, author("u")).await.unwrap();
  assert_eq!((a.version_number, b.version_number), (3, 4));
  assert_eq!(a.content_ref, b.content_ref);

  // A restore is itself restorable.
  let c = svc.restore(doc.id, 3, author("u")).await.unwrap();
  assert_eq!(c.content_ref, a.content_ref);
  assert_eq!(c.restored_from_version, Some(3));

  // Nothing earlier was rewritten.
  let v2 = svc.get_version(doc.id, 2).await.unwrap();
  assert_eq!(v2.content_ref, ContentRef::digest(b"v2"));
}

#[tokio::test]
async fn listing_is_idempotent() {
  let svc = service().await;
  let doc = new_document(&svc).await;
  svc.commit(doc.id, Bytes::from_static(b"v2"), author("u"), "v2").await.unwrap();

  let first: Page<_> = svc.list_versions(doc.id, VersionQuery::default()).await.unwrap();
  let second = svc.list_versions(doc.id, VersionQuery::default()).await.unwrap();
  assert_eq!(first, second);
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn restore_unknown_version() {
  let svc = service().await;
  let doc = new_document(&svc).await;

  let err = svc.restore(doc.id, 9, author("u")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::VersionNotFound { version_number: 9, .. }
  ));
  assert_eq!(svc.get_document(doc.id).await.unwrap().current_version_number, 1);
}

#[tokio::test]
async fn restore_past_any_storable_version() {
  let svc = service().await;
  let doc = new_document(&svc).await;

  let err = svc.restore(doc.id, u64::MAX, author("u")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::VersionNotFound { version_number: u64::MAX, .. }
  ));
  assert!(matches!(
    svc.get_version(doc.id, u64::MAX).await,
    Err(Error::VersionNotFound { .. })
  ));
}

#[tokio::test]
async fn commit_requires_summary() {
  let svc = service().await;
  let doc = new_document(&svc).await;

  let err = svc
    .commit(doc.id, Bytes::from_static(b"x"), author("u"), "   ")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmptyChangeSummary));
}

#[tokio::test]
async fn unknown_document() {
  let svc = service().await;
  let id = Uuid::new_v4();

  assert!(matches!(svc.get_document(id).await, Err(Error::DocumentNotFound(_))));
  assert!(matches!(
    svc.list_versions(id, VersionQuery::default()).await,
    Err(Error::DocumentNotFound(_))
  ));
  assert!(matches!(
    svc.commit(id, Bytes::from_static(b"x"), author("u"), "x").await,
    Err(Error::DocumentNotFound(_))
  ));
  assert!(matches!(
    svc.transition_mode(id, Mode::Beta, author("u")).await,
    Err(Error::DocumentNotFound(_))
  ));
}

#[tokio::test]
async fn read_content_roundtrip() {
  let svc = service().await;
  let doc = new_document(&svc).await;
  svc.commit(doc.id, Bytes::from_static(b"second"), author("u"), "second").await.unwrap();
  svc.restore(doc.id, 1, author("u")).await.unwrap();

  assert_eq!(svc.read_content(doc.id, 2).await.unwrap(), &b"second"[..]);
  assert_eq!(svc.read_content(doc.id, 3).await.unwrap(), &b"first draft"[..]);
}

#[tokio::test]
async fn read_content_with_dangling_ref() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let (doc, _) = store
    .create_document(NewDocument {
      id:          None,
      owner_id:    author("owner"),
      content_ref: ContentRef::digest(b"never uploaded"),
    })
    .await
    .unwrap();
  let svc = VersionService::new(store.clone(), store, AllowAll, ServiceConfig::default());

  let err = svc.read_content(doc.id, 1).await.unwrap_err();
  assert!(matches!(err, Error::ContentMissing(_)));
}

// ─── Permissions ─────────────────────────────────────────────────────────────

/// Grants `write` to writers and `change mode` to editors only.
struct Roles {
  writers: Vec<AuthorId>,
  editors: Vec<AuthorId>,
}

impl Permissions for Roles {
  async fn can_write<'a>(&'a self, _: Uuid, author_id: &'a AuthorId) -> bool {
    self.writers.contains(author_id)
  }

  async fn can_change_mode<'a>(&'a self, _: Uuid, author_id: &'a AuthorId) -> bool {
    self.editors.contains(author_id)
  }
}

#[tokio::test]
async fn denied_operations_have_no_effect() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let roles = Roles { writers: vec![author("writer")], editors: vec![author("editor")] };
  let svc = VersionService::new(store.clone(), store.clone(), roles, ServiceConfig::default());
  let (doc, _) = svc
    .create_document(author("writer"), Bytes::from_static(b"first draft"))
    .await
    .unwrap();

  let err = svc
    .transition_mode(doc.id, Mode::Beta, author("writer"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::PermissionDenied { capability: Capability::ChangeMode, .. }
  ));

  let err = svc
    .commit(doc.id, Bytes::from_static(b"sneaky"), author("editor"), "sneaky")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PermissionDenied { capability: Capability::Write, .. }));

  let err = svc.restore(doc.id, 1, author("editor")).await.unwrap_err();
  assert!(matches!(err, Error::PermissionDenied { .. }));

  assert_eq!(svc.get_document(doc.id).await.unwrap().current_version_number, 1);
  // The denied commit never reached the content backend.
  assert!(store.get(ContentRef::digest(b"sneaky")).await.unwrap().is_none());

  svc.transition_mode(doc.id, Mode::Beta, author("editor")).await.unwrap();
  svc.commit(doc.id, Bytes::from_static(b"ok"), author("writer"), "ok").await.unwrap();
}

#[tokio::test]
async fn denied_create_writes_nothing() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let roles = Roles { writers: vec![author("writer")], editors: vec![] };
  let svc = VersionService::new(store.clone(), store.clone(), roles, ServiceConfig::default());

  let err = svc
    .create_document(author("stranger"), Bytes::from_static(b"uninvited"))
    .await
    .unwrap_err();
  let Error::PermissionDenied { document_id, capability, .. } = err else {
    panic!("expected a denial, got {err}");
  };
  assert_eq!(capability, Capability::Write);

  assert!(store.get_document(document_id).await.unwrap().is_none());
  assert!(store.get(ContentRef::digest(b"uninvited")).await.unwrap().is_none());
}

// ─── Content backend failure ─────────────────────────────────────────────────

struct DownContent;

impl ContentBackend for DownContent {
  type Error = io::Error;

  async fn put(&self, _: Bytes) -> Result<ContentRef, io::Error> {
    Err(io::Error::other("content backend down"))
  }

  async fn get(&self, _: ContentRef) -> Result<Option<Bytes>, io::Error> {
    Err(io::Error::other("content backend down"))
  }
}

#[tokio::test]
async fn failed_content_write_creates_no_version() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let (doc, _) = store
    .create_document(NewDocument {
      id:          None,
      owner_id:    author("owner"),
      content_ref: ContentRef::digest(b"v1"),
    })
    .await
    .unwrap();
  let svc = VersionService::new(store.clone(), DownContent, AllowAll, ServiceConfig::default());

  let err = svc
    .commit(doc.id, Bytes::from_static(b"v2"), author("u"), "v2")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ContentBackendUnavailable(_)));
  assert_eq!(svc.get_document(doc.id).await.unwrap().current_version_number, 1);

  // Transitions and restores never touch content.
  svc.transition_mode(doc.id, Mode::Beta, author("u")).await.unwrap();
  svc.restore(doc.id, 1, author("u")).await.unwrap();
}

// ─── Conflict policy ─────────────────────────────────────────────────────────

/// Lets another writer slip in ahead of the next `interference` appends.
#[derive(Clone)]
struct RacingStore {
  inner:        SqliteStore,
  interference: Arc<AtomicUsize>,
}

impl RacingStore {
  fn new(inner: SqliteStore, interference: usize) -> Self {
    Self { inner, interference: Arc::new(AtomicUsize::new(interference)) }
  }
}

impl VersionStore for RacingStore {
  type Error = folio_store_sqlite::Error;

  async fn create_document(
    &self,
    input: NewDocument,
  ) -> Result<(Document, DocumentVersion), Self::Error> {
    self.inner.create_document(input).await
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>, Self::Error> {
    self.inner.get_document(id).await
  }

  async fn append(
    &self,
    document_id: Uuid,
    expected_version: u64,
    version: NewVersion,
  ) -> Result<AppendOutcome, Self::Error> {
    let interfere = self
      .interference
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if interfere {
      let interloper = NewVersion {
        author_id: author("interloper"),
        change_summary: "interloper".into(),
        ..version.clone()
      };
      self.inner.append(document_id, expected_version, interloper).await?;
    }
    self.inner.append(document_id, expected_version, version).await
  }

  async fn get_version(
    &self,
    document_id: Uuid,
    version_number: u64,
  ) -> Result<Option<DocumentVersion>, Self::Error> {
    self.inner.get_version(document_id, version_number).await
  }

  async fn list_versions(
    &self,
    document_id: Uuid,
    query: VersionQuery,
  ) -> Result<Option<Page<DocumentVersion>>, Self::Error> {
    self.inner.list_versions(document_id, query).await
  }
}

async fn racing_service(
  policy: ConflictPolicy,
  interference: usize,
) -> (VersionService<RacingStore, SqliteStore, AllowAll>, Document) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let svc = VersionService::new(
    RacingStore::new(store.clone(), 0),
    store.clone(),
    AllowAll,
    config(policy),
  );
  let doc = new_document(&svc).await;
  let svc = VersionService::new(
    RacingStore::new(store.clone(), interference),
    store,
    AllowAll,
    config(policy),
  );
  (svc, doc)
}

#[tokio::test]
async fn retry_once_recovers_from_one_lost_race() {
  let (svc, doc) = racing_service(ConflictPolicy::RetryOnce, 1).await;

  let v = svc
    .commit(doc.id, Bytes::from_static(b"mine"), author("u"), "mine")
    .await
    .unwrap();
  assert_eq!(v.version_number, 3);

  let interloper = svc.get_version(doc.id, 2).await.unwrap();
  assert_eq!(interloper.author_id, author("interloper"));
}

#[tokio::test]
async fn retry_once_gives_up_after_second_loss() {
  let (svc, doc) = racing_service(ConflictPolicy::RetryOnce, 2).await;

  let err = svc
    .commit(doc.id, Bytes::from_static(b"mine"), author("u"), "mine")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ConcurrentModificationConflict(id) if id == doc.id));

  // Only the two interlopers landed.
  let head = svc.get_document(doc.id).await.unwrap();
  assert_eq!(head.current_version_number, 3);
}

#[tokio::test]
async fn fail_policy_surfaces_first_conflict() {
  let (svc, doc) = racing_service(ConflictPolicy::Fail, 1).await;

  let err = svc
    .restore(doc.id, 1, author("u"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ConcurrentModificationConflict(_)));
  assert_eq!(svc.get_document(doc.id).await.unwrap().current_version_number, 2);
}

#[tokio::test]
async fn retried_transition_sees_fresh_mode() {
  // The interloper performs the same transition first, so the retry finds
  // the document already in the target mode.
  let (svc, doc) = racing_service(ConflictPolicy::RetryOnce, 1).await;

  let err = svc
    .transition_mode(doc.id, Mode::Publish, author("u"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoOpTransition(Mode::Publish)));

  let head = svc.get_document(doc.id).await.unwrap();
  assert_eq!(head.current_version_number, 2);
  assert_eq!(head.current_mode, Mode::Publish);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_services_never_share_a_version_number() {
  // Two services over one database model two processes: neither sees the
  // other's in-process locks, so only the store's check keeps them apart.
  const N: usize = 8;
  let store = SqliteStore::open_in_memory().await.unwrap();
  let a = Arc::new(VersionService::new(
    store.clone(),
    store.clone(),
    AllowAll,
    config(ConflictPolicy::Fail),
  ));
  let b = Arc::new(VersionService::new(
    store.clone(),
    store.clone(),
    AllowAll,
    config(ConflictPolicy::Fail),
  ));
  let id = new_document(&*a).await.id;

  let mut handles = Vec::new();
  for i in 0..N {
    for svc in [a.clone(), b.clone()] {
      handles.push(tokio::spawn(async move {
        svc
          .commit(id, Bytes::from(format!("{i}")), author("w"), "edit")
          .await
      }));
    }
  }

  let mut won = HashSet::new();
  for h in handles {
    match h.await.unwrap() {
      Ok(v) => assert!(won.insert(v.version_number)),
      Err(e) => assert!(matches!(e, Error::ConcurrentModificationConflict(_)), "{e}"),
    }
  }

  let head = a.get_document(id).await.unwrap();
  assert_eq!(head.current_version_number, won.len() as u64 + 1);
  let expected: HashSet<u64> = (2..=head.current_version_number).collect();
  assert_eq!(won, expected);
}

// ─── Pager ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pager_is_stable_and_restartable() {
  let svc = service().await;
  let doc = new_document(&svc).await;
  for i in 2..=5 {
    svc
      .commit(doc.id, Bytes::from(format!("v{i}")), author("u"), "edit")
      .await
      .unwrap();
  }

  let mut pager = svc.history(doc.id, 2);
  let first = pager.next_page().await.unwrap().unwrap();
  assert_eq!(first.as_of, 5);

  // A write mid-walk does not disturb the pinned anchor.
  svc.commit(doc.id, Bytes::from_static(b"v6"), author("u"), "late").await.unwrap();

  let rest = pager.collect_remaining().await.unwrap();
  let numbers: Vec<_> = first
    .items
    .iter()
    .chain(rest.iter())
    .map(|v| v.version_number)
    .collect();
  assert_eq!(numbers, [5, 4, 3, 2, 1]);
  assert!(pager.next_page().await.unwrap().is_none());

  pager.restart();
  let again = pager.collect_remaining().await.unwrap();
  assert_eq!(again.len(), 6);
  assert_eq!(again[0].version_number, 6);
}

#[test]
fn config_deserialises_with_defaults() {
  let cfg: ServiceConfig = serde_json::from_str(r#"{"conflict_policy":"fail"}"#).unwrap();
  assert_eq!(cfg.conflict_policy, ConflictPolicy::Fail);
  assert_eq!(cfg.lock_timeout_ms, 5_000);
}

// ─── Bounded waits and cancellation ──────────────────────────────────────────

/// Stalls inside the first `slow_appends` appends, while the caller holds
/// the document lock.
#[derive(Clone)]
struct SlowStore {
  inner:        SqliteStore,
  slow_appends: Arc<AtomicUsize>,
  delay:        Duration,
  entered:      Arc<Notify>,
}

impl VersionStore for SlowStore {
  type Error = folio_store_sqlite::Error;

  async fn create_document(
    &self,
    input: NewDocument,
  ) -> Result<(Document, DocumentVersion), Self::Error> {
    self.inner.create_document(input).await
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>, Self::Error> {
    self.inner.get_document(id).await
  }

  async fn append(
    &self,
    document_id: Uuid,
    expected_version: u64,
    version: NewVersion,
  ) -> Result<AppendOutcome, Self::Error> {
    let slow = self
      .slow_appends
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok();
    if slow {
      self.entered.notify_one();
      tokio::time::sleep(self.delay).await;
    }
    self.inner.append(document_id, expected_version, version).await
  }

  async fn get_version(
    &self,
    document_id: Uuid,
    version_number: u64,
  ) -> Result<Option<DocumentVersion>, Self::Error> {
    self.inner.get_version(document_id, version_number).await
  }

  async fn list_versions(
    &self,
    document_id: Uuid,
    query: VersionQuery,
  ) -> Result<Option<Page<DocumentVersion>>, Self::Error> {
    self.inner.list_versions(document_id, query).await
  }
}

type SlowService = VersionService<SlowStore, SqliteStore, AllowAll>;

async fn slow_service(
  conflict_policy: ConflictPolicy,
  lock_timeout_ms: u64,
  delay: Duration,
) -> (Arc<SlowService>, Uuid, Arc<Notify>) {
  let inner = SqliteStore::open_in_memory().await.unwrap();
  let entered = Arc::new(Notify::new());
  let store = SlowStore {
    inner:        inner.clone(),
    slow_appends: Arc::new(AtomicUsize::new(1)),
    delay,
    entered:      entered.clone(),
  };
  let svc = VersionService::new(
    store,
    inner,
    AllowAll,
    ServiceConfig { conflict_policy, lock_timeout_ms },
  );
  let id = new_document(&svc).await.id;
  (Arc::new(svc), id, entered)
}

fn spawn_commit(
  svc: &Arc<SlowService>,
  id: Uuid,
  body: &'static [u8],
) -> JoinHandle<Result<DocumentVersion, Error>> {
  let svc = svc.clone();
  tokio::spawn(async move {
    svc.commit(id, Bytes::from_static(body), author("holder"), "held").await
  })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lock_wait_is_bounded_under_fail() {
  let (svc, id, entered) =
    slow_service(ConflictPolicy::Fail, 100, Duration::from_millis(400)).await;

  let holder = spawn_commit(&svc, id, b"slow");
  entered.notified().await;

  let started = Instant::now();
  let err = svc
    .commit(id, Bytes::from_static(b"blocked"), author("waiter"), "blocked")
    .await
    .unwrap_err();
  let waited = started.elapsed();

  assert!(matches!(err, Error::ConcurrentModificationConflict(d) if d == id));
  assert!(waited >= Duration::from_millis(100), "gave up early: {waited:?}");
  assert!(waited < Duration::from_millis(400), "waited for the holder: {waited:?}");

  assert_eq!(holder.await.unwrap().unwrap().version_number, 2);
  assert_eq!(svc.get_document(id).await.unwrap().current_version_number, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lock_timeout_is_retried_under_retry_once() {
  let (svc, id, entered) =
    slow_service(ConflictPolicy::RetryOnce, 250, Duration::from_millis(350)).await;

  let holder = spawn_commit(&svc, id, b"slow");
  entered.notified().await;

  let started = Instant::now();
  let v = svc
    .commit(id, Bytes::from_static(b"patient"), author("waiter"), "patient")
    .await
    .unwrap();
  let waited = started.elapsed();

  // The first wait expired; the second one outlasted the holder.
  assert!(waited >= Duration::from_millis(250), "{waited:?}");
  assert_eq!(v.version_number, 3);
  assert_eq!(holder.await.unwrap().unwrap().version_number, 2);
}

#[tokio::test]
async fn dropped_commit_leaves_no_version() {
  let (svc, id, _) =
    slow_service(ConflictPolicy::Fail, 5_000, Duration::from_secs(60)).await;

  let abandoned = svc.commit(id, Bytes::from_static(b"abandoned"), author("u"), "gone");
  assert!(
    tokio::time::timeout(Duration::from_millis(100), abandoned)
      .await
      .is_err()
  );
  assert_eq!(svc.get_document(id).await.unwrap().current_version_number, 1);

  // The dropped future released its lock.
  let started = Instant::now();
  let v = svc
    .commit(id, Bytes::from_static(b"next"), author("u"), "next")
    .await
    .unwrap();
  assert_eq!(v.version_number, 2);
  assert!(started.elapsed() < Duration::from_secs(5));
}
