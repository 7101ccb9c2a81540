use aho_corasick::AhoCorasick;
use aho_corasick::AhoCorasickBuilder;
use aho_corasick::AhoCorasickKind;
use aho_corasick::MatchKind;
use memchr::memchr;
use once_cell::sync::Lazy;

const TEMPLATE_OPEN: &str = "<template id=\"";
const MARKER_OPEN: &str = "<script data-suspense-id=\"";
const COMPLETE_OPEN: &str = "$RC(\"";
const ERROR_OPEN: &str = "$RX(\"";
const COUNT_ATTR: &str = " data-count=\"";

const PAT_TEMPLATE: usize = 0;
const PAT_MARKER: usize = 1;
const PAT_COMPLETE: usize = 2;
const PAT_ERROR: usize = 3;

static ANCHORS: Lazy<AhoCorasick> = Lazy::new(|| {
  AhoCorasickBuilder::new()
    .kind(Some(AhoCorasickKind::DFA))
    .match_kind(MatchKind::LeftmostLongest)
    .build([TEMPLATE_OPEN, MARKER_OPEN, COMPLETE_OPEN, ERROR_OPEN])
    .unwrap()
});

/// A pending-slot registration parsed out of a chunk: a marker script paired
/// with the template anchor before it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Registration<'a> {
  pub slot_id: &'a str,
  pub suspense_id: &'a str,
  pub count: Option<u32>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum RevealForm {
  Complete,
  Error,
}

/// One reveal call found in a chunk. `start..end` is the byte span of the
/// call text itself, script tags around it excluded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct RevealCall<'a> {
  pub form: RevealForm,
  pub from_id: &'a str,
  pub to_id: &'a str,
  /// Present on [`RevealForm::Error`] calls only.
  pub message: Option<&'a str>,
  pub start: usize,
  pub end: usize,
}

pub(crate) struct ChunkScan<'a> {
  pub registrations: Vec<Registration<'a>>,
  pub reveals: Vec<RevealCall<'a>>,
}

/// Byte cursor positioned just after an anchor.
struct Cursor<'a> {
  source: &'a str,
  next: usize,
}

impl<'a> Cursor<'a> {
  /// Consumes through the next `"` and returns the text before it, or None
  /// when the chunk ends first. Anchors and quotes are ASCII, so the spans
  /// handed out always sit on char boundaries.
  fn quoted(&mut self) -> Option<&'a str> {
    let len = memchr(b'"', &self.source.as_bytes()[self.next..])?;
    let value = &self.source[self.next..self.next + len];
    self.next += len + 1;
    Some(value)
  }

  /// Consumes `expected` if it is next.
  fn literal(&mut self, expected: &str) -> bool {
    if self.source[self.next..].starts_with(expected) {
      self.next += expected.len();
      true
    } else {
      false
    }
  }
}

/// Collects slot registrations and reveal calls from one chunk, in document
/// order, via a single pass over the anchor matches.
///
/// A marker pairs with the nearest template anchor before it; a marker with
/// no preceding template in the chunk is dropped. Anything malformed (an
/// unterminated quote, arguments that do not follow the call shape) is
/// skipped rather than reported, since chunks routinely carry unrelated
/// markup and script around the protocol tokens.
pub(crate) fn scan_chunk(chunk: &str) -> ChunkScan<'_> {
  let mut registrations = Vec::new();
  let mut reveals = Vec::new();
  let mut pending_template: Option<&str> = None;
  // Frontier of consumed text. An anchor hit inside already-parsed arguments
  // (reveal-call text quoted within another call, say) is not a real token.
  let mut resume = 0;
  for found in ANCHORS.find_iter(chunk) {
    if found.start() < resume {
      continue;
    }
    let mut cursor = Cursor {
      source: chunk,
      next: found.end(),
    };
    match found.pattern().as_usize() {
      PAT_TEMPLATE => {
        if let Some(slot_id) = cursor.quoted() {
          pending_template = Some(slot_id);
          resume = cursor.next;
        }
      }
      PAT_MARKER => {
        let Some(suspense_id) = cursor.quoted() else {
          continue;
        };
        let count = if cursor.literal(COUNT_ATTR) {
          cursor.quoted().and_then(|raw| raw.parse().ok())
        } else {
          None
        };
        resume = cursor.next;
        let Some(slot_id) = pending_template.take() else {
          continue;
        };
        registrations.push(Registration {
          slot_id,
          suspense_id,
          count,
        });
      }
      pat => {
        debug_assert!(pat == PAT_COMPLETE || pat == PAT_ERROR);
        let form = if pat == PAT_COMPLETE {
          RevealForm::Complete
        } else {
          RevealForm::Error
        };
        let Some(call) = parse_reveal(found.start(), &mut cursor, form) else {
          continue;
        };
        resume = call.end;
        reveals.push(call);
      }
    }
  }
  ChunkScan {
    registrations,
    reveals,
  }
}

fn parse_reveal<'a>(start: usize, cursor: &mut Cursor<'a>, form: RevealForm) -> Option<RevealCall<'a>> {
  let from_id = cursor.quoted()?;
  if !cursor.literal(",\"") {
    return None;
  }
  let to_id = cursor.quoted()?;
  let message = match form {
    RevealForm::Complete => None,
    RevealForm::Error => {
      if !cursor.literal(",\"") {
        return None;
      }
      Some(cursor.quoted()?)
    }
  };
  if !cursor.literal(")") {
    return None;
  }
  Some(RevealCall {
    form,
    from_id,
    to_id,
    message,
    start,
    end: cursor.next,
  })
}
