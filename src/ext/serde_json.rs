// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Nested lookups into loosely-shaped JSON from external tools and HTTP APIs via dotted paths
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper for typed and lenient extraction
// invariants: No panics; missing paths yield None; count() accepts numbers or numeric strings
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A location inside a JSON document, resolved lazily into a concrete type.
pub struct JsonFetched<'a> {
  inner: Option<&'a Value>,
}

impl<'a> JsonFetched<'a> {
  pub fn exists(&self) -> bool {
    self.inner.is_some_and(|v| !v.is_null())
  }

  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Non-empty trimmed string, if present.
  pub fn text(&self) -> Option<String> {
    self
      .inner
      .and_then(Value::as_str)
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
  }

  /// Non-negative count; some tools emit numbers as strings.
  pub fn count(&self) -> Option<u64> {
    match self.inner? {
      Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
      Value::String(s) => s.trim().parse::<u64>().ok(),
      _ => None,
    }
  }

  pub fn items(&self) -> &'a [Value] {
    self.inner.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Extension to fetch nested values via dotted paths like "gitinspector.changes.authors".
/// Numeric segments index into arrays ("choices.0.message.content").
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      let next = match cur {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => cur.get(key),
      };
      match next {
        Some(next) => cur = next,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
