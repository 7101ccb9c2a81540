/// Advances a letter token to its successor in the sequence `a, b, .., z, A,
/// .., Z, aa, ab, ..`.
///
/// Tokens are bijective base-52 numerals over the alphabet `a..z, A..Z`, most
/// significant symbol first; the empty string is the value before `"a"`. `z`
/// rolls into `A` at the same width, and `Z` carries into the symbols on its
/// left, growing by one symbol only once every position has overflowed.
pub fn next_letter(current: &str) -> String {
  debug_assert!(current.bytes().all(|b| b.is_ascii_alphabetic()));
  let Some((&last, head)) = current.as_bytes().split_last() else {
    return "a".to_owned();
  };
  // `head` is all ASCII, so the byte length is also a char boundary.
  let prefix = &current[..head.len()];
  match last {
    b'z' => format!("{prefix}A"),
    b'Z' if prefix.is_empty() => "aa".to_owned(),
    b'Z' => {
      let mut carried = next_letter(prefix);
      carried.push('a');
      carried
    }
    _ => format!("{prefix}{}", (last + 1) as char),
  }
}
