//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Values are inserted verbatim; placeholders inside values are not expanded again.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(start) = rest.find('{') {
    out.push_str(&rest[..start]);
    let after = &rest[start + 1..];
    let hit = after.find('}').and_then(|end| {
      let key = &after[..end];
      pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (end, *v))
    });
    match hit {
      Some((end, value)) => {
        out.push_str(value);
        rest = &after[end + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) { cut -= 1; }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_known_keys_and_keeps_unknown() {
    let out = fill_template("{a} and {b} but {c}", &[("a", "x"), ("b", "{a}")]);
    assert_eq!(out, "x and {a} but {c}");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "ééééé";
    let t = trunc_for_log(s, 3);
    assert!(t.starts_with('é'));
    assert!(t.ends_with("(10 bytes total)"));
    assert_eq!(trunc_for_log("short", 10), "short");
  }
}
