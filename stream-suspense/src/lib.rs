//! Reconciler for the suspense reveal protocol embedded in streamed HTML.
//!
//! A server streaming a suspense-capable page sends placeholder slots in the
//! shell and the real content later, each completion chunk carrying an inline
//! script call that swaps a slot for its content. Consumers sitting on the
//! byte stream (edge rewriters, island hydrators, cache layers) need those
//! swaps surfaced as events, with any injected markup guaranteed to run
//! before the swap itself. [`StreamSuspense`] watches the chunks of one
//! response: it records slot registrations, matches reveal calls against
//! them, hands each resolution to a callback, and splices the callback's
//! markup plus the re-issued calls back into the chunk.
//!
//! ```
//! use stream_suspense::Reveal;
//! use stream_suspense::StreamSuspense;
//!
//! let mut stream = StreamSuspense::new(|suspense_id: &str, reveal| match reveal {
//!   Reveal::Complete { .. } => Some(format!("<script>reveal({suspense_id:?});</script>")),
//!   Reveal::Error { .. } => None,
//! });
//! let shell = r#"<template id="B:0"><script data-suspense-id="a:a"></script></template>"#;
//! assert!(stream.analyze(shell).is_none());
//! let swap = r#"<div hidden id="S:0">late</div><script>$RC("B:0","S:0")</script>"#;
//! let rewritten = stream.analyze(swap).unwrap();
//! assert!(rewritten.ends_with(r#"<script>$RC("B:0","S:0");</script>"#));
//! ```
//!
//! Chunks that resolve nothing come back as `None` and should be forwarded
//! verbatim. One reconciler serves one response stream; nothing here is
//! synchronized.

mod scan;

use crate::scan::scan_chunk;
use crate::scan::ChunkScan;
use crate::scan::RevealCall;
use crate::scan::RevealForm;
use ahash::HashMap;
use tracing::debug;

const SCRIPT_OPEN: &str = "<script>";
const SCRIPT_CLOSE: &str = "</script>";

/// Outcome delivered to the reveal callback for one resolved slot.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Reveal {
  /// The slot's content arrived. `count` is the child count the registration
  /// marker announced, when it carried one.
  Complete { count: Option<u32> },
  /// The producer gave up on the slot before its content was ready.
  Error { message: String },
}

/// Phase of the stream. Registrations move it out of the shell phase; the
/// distinction only matters for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum StreamState {
  AwaitingShell,
  Streaming,
}

#[derive(Clone, Debug)]
struct PendingSlot {
  suspense_id: String,
  count: Option<u32>,
}

/// Per-response reconciler: a table of pending slots fed by registration
/// markers, drained by reveal calls.
pub struct StreamSuspense<F> {
  pending: HashMap<String, PendingSlot>,
  state: StreamState,
  on_reveal: F,
}

impl<F> StreamSuspense<F>
where
  F: FnMut(&str, Reveal) -> Option<String>,
{
  pub fn new(on_reveal: F) -> Self {
    StreamSuspense {
      pending: HashMap::default(),
      state: StreamState::AwaitingShell,
      on_reveal,
    }
  }

  /// Runs one chunk through the reconciler.
  ///
  /// Registrations found in the chunk are recorded unconditionally, whatever
  /// else it contains; a shell may arrive spread over several chunks. If the
  /// chunk then resolves a pending slot, the callback runs and the rewritten
  /// chunk comes back: reveal call text cut out in place (script tags left
  /// empty by the cut go too), callback markup appended, and the distinct
  /// cut calls re-issued in one trailing script so the injected markup
  /// executes first.
  pub fn analyze(&mut self, chunk: &str) -> Option<String> {
    let scan = scan_chunk(chunk);
    self.register(&scan);
    let (slot, reveal) = self.resolve(&scan)?;
    let markup = (self.on_reveal)(&slot.suspense_id, reveal);
    Some(reassemble(chunk, &scan.reveals, markup))
  }

  fn register(&mut self, scan: &ChunkScan) {
    for reg in &scan.registrations {
      if self.pending.contains_key(reg.slot_id) {
        continue;
      }
      if self.state == StreamState::AwaitingShell {
        self.state = StreamState::Streaming;
        debug!("first slot registered; shell phase over");
      }
      debug!(slot = reg.slot_id, suspense = reg.suspense_id, count = ?reg.count, "slot registered");
      self.pending.insert(reg.slot_id.to_owned(), PendingSlot {
        suspense_id: reg.suspense_id.to_owned(),
        count: reg.count,
      });
    }
  }

  /// Picks the resolution a chunk announces, if any: the first successful
  /// reveal whose source slot is pending wins, otherwise the first failed
  /// one. Reveals referencing slots this stream never registered, or already
  /// resolved, resolve nothing; duplicate delivery of a completion chunk is
  /// a no-op.
  fn resolve(&mut self, scan: &ChunkScan) -> Option<(PendingSlot, Reveal)> {
    let first = |form: RevealForm| scan.reveals.iter().find(|call| call.form == form);
    if let Some(call) = first(RevealForm::Complete) {
      if let Some(slot) = self.pending.remove(call.from_id) {
        debug!(slot = call.from_id, content = call.to_id, "slot completed");
        let count = slot.count;
        return Some((slot, Reveal::Complete { count }));
      }
    }
    if let Some(call) = first(RevealForm::Error) {
      if let Some(slot) = self.pending.remove(call.from_id) {
        debug!(slot = call.from_id, content = call.to_id, "slot errored");
        let message = call.message.unwrap_or("").to_owned();
        return Some((slot, Reveal::Error { message }));
      }
    }
    if !scan.reveals.is_empty() {
      debug!(slot = scan.reveals[0].from_id, "reveal for unknown slot ignored");
    }
    None
  }
}

/// Splices a resolved chunk back together: every reveal call is cut out (a
/// script pair left empty by the cut goes with it), the callback markup lands
/// after the stripped chunk, and the distinct calls are replayed in one
/// trailing script.
fn reassemble(chunk: &str, reveals: &[RevealCall], markup: Option<String>) -> String {
  let mut out = String::with_capacity(chunk.len());
  let mut replays: Vec<&str> = Vec::new();
  let mut upto = 0;
  for call in reveals {
    let text = &chunk[call.start..call.end];
    if !replays.contains(&text) {
      replays.push(text);
    }
    let mut start = call.start;
    let mut end = call.end;
    if chunk[..start].ends_with(SCRIPT_OPEN) && chunk[end..].starts_with(SCRIPT_CLOSE) {
      start -= SCRIPT_OPEN.len();
      end += SCRIPT_CLOSE.len();
    }
    debug_assert!(start >= upto, "reveal spans out of order");
    out.push_str(&chunk[upto..start]);
    upto = end;
  }
  out.push_str(&chunk[upto..]);
  if let Some(markup) = markup {
    out.push_str(&markup);
  }
  out.push_str(SCRIPT_OPEN);
  for (i, call) in replays.iter().enumerate() {
    if i > 0 {
      out.push(';');
    }
    out.push_str(call);
  }
  out.push(';');
  out.push_str(SCRIPT_CLOSE);
  out
}
