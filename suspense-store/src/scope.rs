use ahash::HashMap;

/// Counter state behind the ids minted under one boundary or namespace.
#[derive(Default, Debug)]
pub(crate) struct Scope {
  /// Letter most recently minted for a child scope of this scope.
  pub(crate) child_letter: String,
  /// Letter most recently minted for an element within this scope.
  pub(crate) element_letter: String,
  /// Value the counters rewind to on reset, fixed when the scope record is
  /// created.
  start_letter: String,
  /// Namespace scopes owned by this boundary, keyed by full namespace id.
  /// Nested namespaces are stored flat here too, under their owning boundary.
  /// Always empty for namespace scopes themselves.
  pub(crate) sub_scopes: HashMap<String, Scope>,
}

impl Scope {
  /// Rewinds both counters to the starting value and discards every owned
  /// namespace, leaving the starting value itself untouched.
  pub(crate) fn rebuild(&mut self) {
    self.child_letter = self.start_letter.clone();
    self.element_letter = self.start_letter.clone();
    self.sub_scopes.clear();
  }

  /// Rewinds the element counter only.
  pub(crate) fn reset_elements(&mut self) {
    self.element_letter = self.start_letter.clone();
  }
}
