use crate::letter::next_letter;
use crate::scope::Scope;
use ahash::HashMap;
use tracing::trace;

/// Which separator family a scope id belongs to.
///
/// Boundary ids chain with `:` and own a top-level scope record; namespace
/// ids chain with `|` and live in the owning boundary's sub-scope table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScopeKind {
  Boundary,
  Namespace,
}

/// Allocator for deterministic suspense ids within a single render pass.
///
/// Every id is its parent's id plus one letter from a per-parent counter, and
/// every allocation is memoized under a caller-stable cache key, so a call
/// site that runs more than once (double rendering, a retried subtree) sees
/// its original id every time. Resets rewind the boundary's counters and drop
/// the records underneath it without touching the memo table, which is what
/// lets a replayed subtree reproduce the exact id sequence it produced the
/// first time.
#[derive(Default, Debug)]
pub struct SuspenseStore {
  /// Boundary scopes keyed by boundary id. The root scope lives under `""`.
  scopes: HashMap<String, Scope>,
  /// Minted ids keyed by cache key. Never cleared; resets only rewind
  /// counters, so a cached call site keeps returning its first id.
  cache: HashMap<String, String>,
  /// Whether boundary fallbacks should embed the registration marker a
  /// stream consumer needs to correlate the slot later. Markup-level
  /// concern; allocation itself ignores it.
  lifebuoy: bool,
}

impl SuspenseStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Mints (or recalls) the id for a suspense boundary under `parent_id`,
  /// registering it as a scope of its own. Pass `""` for a top-level
  /// boundary.
  pub fn create_boundary_id(&mut self, parent_id: &str, cache_key: &str) -> String {
    self.with_cache(cache_key, |store| {
      let parent = store.scopes.entry(parent_id.to_owned()).or_default();
      parent.child_letter = next_letter(&parent.child_letter);
      let id = if parent_id.is_empty() {
        parent.child_letter.clone()
      } else {
        format!("{parent_id}:{}", parent.child_letter)
      };
      store.register(&id, ScopeKind::Boundary);
      id
    })
  }

  /// Mints (or recalls) the id for a namespace under `parent_id`, which may
  /// be a boundary or another namespace. The namespace draws from the same
  /// child counter as sibling boundaries and is recorded in its owning
  /// boundary's sub-scope table.
  pub fn create_namespace_id(&mut self, parent_id: &str, cache_key: &str) -> String {
    self.with_cache(cache_key, |store| {
      let parent = store.scope_mut(parent_id, kind_of(parent_id));
      parent.child_letter = next_letter(&parent.child_letter);
      let id = format!("{parent_id}|{}", parent.child_letter);
      store.register(&id, ScopeKind::Namespace);
      id
    })
  }

  /// Mints (or recalls) an element id within the scope `scope_id`, using that
  /// scope's element counter.
  pub fn create_element_id(&mut self, scope_id: &str, cache_key: &str, kind: ScopeKind) -> String {
    self.with_cache(cache_key, |store| {
      let scope = store.scope_mut(scope_id, kind);
      scope.element_letter = next_letter(&scope.element_letter);
      format!("{scope_id}-{}", scope.element_letter)
    })
  }

  /// Rewinds a boundary's counters to their starting value and drops every
  /// record underneath it, namespaces and descendant boundaries alike, so
  /// the subtree's next render replays the same id sequence from fresh
  /// records. Resetting an id that owns no records is a no-op.
  pub fn reset_boundary(&mut self, boundary_id: &str) {
    self.scopes.retain(|id, _| !descends_from(id, boundary_id));
    if let Some(scope) = self.scopes.get_mut(boundary_id) {
      scope.rebuild();
      trace!(boundary = boundary_id, "boundary reset");
    }
  }

  /// Rewinds a namespace's element counter. The owning boundary and the
  /// namespace's own children are left alone. Unknown ids are ignored.
  pub fn reset_namespace(&mut self, namespace_id: &str) {
    let owning = owning_boundary(namespace_id);
    let sub = self
      .scopes
      .get_mut(owning)
      .and_then(|boundary| boundary.sub_scopes.get_mut(namespace_id));
    if let Some(scope) = sub {
      scope.reset_elements();
      trace!(namespace = namespace_id, "namespace reset");
    }
  }

  /// Whether boundary fallbacks should embed registration markers for a
  /// stream consumer. Off unless the streaming entry point turns it on.
  pub fn has_lifebuoy(&self) -> bool {
    self.lifebuoy
  }

  pub fn set_lifebuoy(&mut self, enabled: bool) {
    self.lifebuoy = enabled;
  }

  /// Returns the id memoized under `cache_key`, minting it with `create` on
  /// the first call. Counters only move on a miss.
  fn with_cache(&mut self, cache_key: &str, create: impl FnOnce(&mut Self) -> String) -> String {
    if let Some(hit) = self.cache.get(cache_key) {
      return hit.clone();
    }
    let id = create(self);
    self.cache.insert(cache_key.to_owned(), id.clone());
    id
  }

  /// Resolves the scope record for `id`, creating it if needed. Namespace
  /// records live flat in their owning boundary's table regardless of
  /// nesting depth.
  fn scope_mut(&mut self, id: &str, kind: ScopeKind) -> &mut Scope {
    match kind {
      ScopeKind::Boundary => self.scopes.entry(id.to_owned()).or_default(),
      ScopeKind::Namespace => {
        let owning = owning_boundary(id).to_owned();
        self
          .scopes
          .entry(owning)
          .or_default()
          .sub_scopes
          .entry(id.to_owned())
          .or_default()
      }
    }
  }

  /// Ensures a scope record exists for `id`. A record that is already live
  /// keeps its counters: ids it has handed out stay taken until the owning
  /// boundary resets.
  fn register(&mut self, id: &str, kind: ScopeKind) {
    self.scope_mut(id, kind);
    trace!(scope = id, "scope registered");
  }
}

fn kind_of(id: &str) -> ScopeKind {
  if id.contains('|') {
    ScopeKind::Namespace
  } else {
    ScopeKind::Boundary
  }
}

/// The boundary a namespace id belongs to: everything before the first `|`,
/// or the id itself when there is none.
fn owning_boundary(id: &str) -> &str {
  match id.find('|') {
    Some(split) => &id[..split],
    None => id,
  }
}

/// Whether `id` names a boundary strictly inside the subtree rooted at
/// `ancestor`. The root scope `""` contains every other boundary.
fn descends_from(id: &str, ancestor: &str) -> bool {
  id.len() > ancestor.len()
    && id.starts_with(ancestor)
    && (ancestor.is_empty() || id.as_bytes()[ancestor.len()] == b':')
}
