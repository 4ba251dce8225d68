// dataruns/src/core/transform.rs

//! Defines the `Transform` trait: the single-argument contract every stage satisfies.

use crate::core::value::Value;

/// Anything that can be invoked with one `Value` and produce one `Value`.
///
/// Closures and fn items with the signature `Fn(Value) -> anyhow::Result<Value>`
/// implement this automatically. Numeric transforms, encoders and other stage
/// types implement it directly.
pub trait Transform: Send + Sync {
  fn call(&self, input: Value) -> anyhow::Result<Value>;

  /// Display name used in diagnostics and `Function[...]` renderings.
  /// Defaults to the implementing type's name.
  fn name(&self) -> String {
    short_type_name(std::any::type_name::<Self>())
  }
}

impl<F> Transform for F
where
  F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
  fn call(&self, input: Value) -> anyhow::Result<Value> {
    self(input)
  }
}

/// Reduces a full type path to the name a reader would recognise.
///
/// `my_crate::steps::double` becomes `double`, `my_crate::Normalize<f64>` becomes
/// `Normalize`, an anonymous closure becomes `closure` and a fn pointer becomes `fn`.
pub(crate) fn short_type_name(full: &str) -> String {
  let unqualified = full.strip_prefix("unsafe ").unwrap_or(full);
  if unqualified.starts_with("fn(") || unqualified.starts_with("extern ") {
    return "fn".to_string();
  }
  // Generic arguments may appear on any path segment, not only the last one.
  // The `>` of a `->` inside a fn-pointer argument does not close anything.
  let mut depth = 0usize;
  let mut prev = ' ';
  let outer: String = full
    .chars()
    .filter(|&c| {
      let keep = match c {
        '<' => {
          depth += 1;
          false
        }
        '>' if prev != '-' => {
          depth = depth.saturating_sub(1);
          false
        }
        _ => depth == 0,
      };
      prev = c;
      keep
    })
    .collect();
  let last = outer.rsplit("::").next().unwrap_or(&outer);
  if last == "{{closure}}" {
    "closure".to_string()
  } else {
    last.to_string()
  }
}
