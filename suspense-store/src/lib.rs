//! Deterministic, hierarchical ids for streamed suspense rendering.
//!
//! A server render that streams suspense boundaries needs ids that are stable
//! between producer and consumer, short enough to stay cheap on the wire, and
//! reproducible when a subtree renders more than once. [`SuspenseStore`]
//! allocates such ids from per-scope letter counters: boundary ids chain with
//! `:`, namespace ids with `|`, and element ids attach to their scope with
//! `-`.
//!
//! ```
//! use suspense_store::{ScopeKind, SuspenseStore};
//!
//! let mut store = SuspenseStore::new();
//! let outer = store.create_boundary_id("", "outer");
//! assert_eq!(outer, "a");
//! assert_eq!(store.create_boundary_id(&outer, "inner"), "a:a");
//! assert_eq!(store.create_element_id(&outer, "anchor", ScopeKind::Boundary), "a-a");
//! // A cache key is minted once; re-rendering the call site reuses its id.
//! assert_eq!(store.create_boundary_id("", "outer"), "a");
//! ```
//!
//! Callers owe the allocator two things: every call site passes a cache key
//! that stays stable across re-execution of the same render attempt, and a
//! new boundary or namespace is requested only on entering a new deferred
//! subtree. Under that contract the ids come out identical however often the
//! host re-runs a subtree.
//!
//! One store serves one render pass. Nothing here is synchronized; concurrent
//! renders each own their store.

pub mod letter;
mod scope;
mod store;

pub use store::ScopeKind;
pub use store::SuspenseStore;
