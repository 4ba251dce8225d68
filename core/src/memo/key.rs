// dataruns/src/memo/key.rs

//! Derives value-based cache keys from call arguments.
//!
//! Normalization is a pure recursive function over a closed set of shapes:
//! mappings become key-sorted pairs, sequences become element-wise tuples, sets
//! become sorted tuples (duplicates kept), and scalars stand for themselves. Two
//! values that a stage can tell apart by length, sign or kind never share a key.
//! Values with no stable
//! value representation (opaque host objects, NaN) yield `None`, which disables
//! caching for that one call.

use crate::core::value::{Table, Value};

/// Hashable, order-aware normal form of a single value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
  Null,
  Bool(bool),
  Int(i64),
  /// Raw IEEE-754 bits; `-0.0` and `0.0` stay distinct.
  Float(u64),
  Text(String),
  Seq(Vec<KeyPart>),
  Set(Vec<KeyPart>),
  Pairs(Vec<(String, KeyPart)>),
}

/// The full derived key of one call: positional parts, then keyword pairs
/// sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  positional: Vec<KeyPart>,
  keyword: Vec<(String, KeyPart)>,
}

/// Positional and keyword arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
  pub positional: Vec<Value>,
  pub keyword: Vec<(String, Value)>,
}

impl Arguments {
  pub fn new() -> Self {
    Self::default()
  }

  /// Arguments of a stage call: exactly one positional value.
  pub fn single(value: Value) -> Self {
    Arguments {
      positional: vec![value],
      keyword: Vec::new(),
    }
  }

  pub fn arg<V: Into<Value>>(mut self, value: V) -> Self {
    self.positional.push(value.into());
    self
  }

  /// Adds a keyword argument. A repeated name replaces the earlier value.
  pub fn kwarg<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Self {
    let name = name.into();
    let value = value.into();
    match self.keyword.iter_mut().find(|(existing, _)| *existing == name) {
      Some((_, slot)) => *slot = value,
      None => self.keyword.push((name, value)),
    }
    self
  }

  pub fn keyword_value(&self, name: &str) -> Option<&Value> {
    self.keyword.iter().find(|(existing, _)| existing == name).map(|(_, v)| v)
  }
}

/// Derives the cache key for `args`, or `None` if any argument cannot be normalized.
pub fn derive_key(args: &Arguments) -> Option<CacheKey> {
  let positional = args.positional.iter().map(normalize).collect::<Option<Vec<_>>>()?;
  let mut keyword = args
    .keyword
    .iter()
    .map(|(name, value)| normalize(value).map(|part| (name.clone(), part)))
    .collect::<Option<Vec<_>>>()?;
  keyword.sort_by(|a, b| a.0.cmp(&b.0));
  Some(CacheKey { positional, keyword })
}

/// Normalizes one value into its hashable form.
pub fn normalize(value: &Value) -> Option<KeyPart> {
  match value {
    Value::Null => Some(KeyPart::Null),
    Value::Bool(b) => Some(KeyPart::Bool(*b)),
    Value::Int(i) => Some(KeyPart::Int(*i)),
    Value::Float(f) => normalize_float(*f),
    Value::Text(s) => Some(KeyPart::Text(s.clone())),
    // A list and the array it is coerced into describe the same data.
    Value::List(items) | Value::Array(items) => normalize_seq(items).map(KeyPart::Seq),
    Value::Set(items) => {
      let mut parts = normalize_seq(items)?;
      // Membership order is not meaningful, multiplicity is.
      parts.sort();
      Some(KeyPart::Set(parts))
    }
    // BTreeMap iterates in key order, so the pairs come out sorted.
    Value::Map(map) => map
      .iter()
      .map(|(k, v)| normalize(v).map(|part| (k.clone(), part)))
      .collect::<Option<Vec<_>>>()
      .map(KeyPart::Pairs),
    Value::Table(table) => normalize_table(table),
    Value::Opaque(_) => None,
  }
}

fn normalize_seq(items: &[Value]) -> Option<Vec<KeyPart>> {
  items.iter().map(normalize).collect()
}

fn normalize_float(f: f64) -> Option<KeyPart> {
  if f.is_nan() {
    // NaN never equals itself, so it can never be a cache hit.
    return None;
  }
  Some(KeyPart::Float(f.to_bits()))
}

/// Column order is part of a table's identity, so columns are not sorted.
fn normalize_table(table: &Table) -> Option<KeyPart> {
  table
    .columns()
    .map(|(name, values)| normalize_seq(values).map(|parts| (name.to_string(), KeyPart::Seq(parts))))
    .collect::<Option<Vec<_>>>()
    .map(|columns| KeyPart::Seq(vec![KeyPart::Text("table".to_string()), KeyPart::Pairs(columns)]))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::value::Opaque;
  use std::collections::BTreeMap;

  #[test]
  fn equal_arguments_derive_equal_keys() {
    let a = Arguments::new().arg(1).arg(2);
    let b = Arguments::new().arg(1).arg(2);
    assert_eq!(derive_key(&a), derive_key(&b));
    assert!(derive_key(&a).is_some());
  }

  #[test]
  fn positional_order_matters() {
    let a = Arguments::new().arg(1).arg(2);
    let b = Arguments::new().arg(2).arg(1);
    assert_ne!(derive_key(&a), derive_key(&b));
  }

  #[test]
  fn keyword_order_does_not_matter() {
    let a = Arguments::new().kwarg("x", 1).kwarg("y", 2);
    let b = Arguments::new().kwarg("y", 2).kwarg("x", 1);
    assert_eq!(derive_key(&a), derive_key(&b));
  }

  #[test]
  fn nested_lists_and_maps_normalize() {
    let mut inner = BTreeMap::new();
    inner.insert("b".to_string(), Value::from(vec![1, 2]));
    inner.insert("a".to_string(), Value::Text("x".into()));
    let part = normalize(&Value::Map(inner)).unwrap();
    assert_eq!(
      part,
      KeyPart::Pairs(vec![
        ("a".to_string(), KeyPart::Text("x".into())),
        ("b".to_string(), KeyPart::Seq(vec![KeyPart::Int(1), KeyPart::Int(2)])),
      ])
    );
  }

  #[test]
  fn sets_ignore_element_order() {
    let a = Value::Set(vec![Value::Int(3), Value::Int(1)]);
    let b = Value::Set(vec![Value::Int(1), Value::Int(3)]);
    assert_eq!(normalize(&a), normalize(&b));
  }

  #[test]
  fn list_and_array_share_a_key() {
    let list: Value = vec![1, 2].into();
    assert_eq!(normalize(&list), normalize(&list.clone().into_array_like()));
  }

  #[test]
  fn opaque_anywhere_prevents_a_key() {
    let nested = Value::Array(vec![Value::Int(1), Value::Opaque(Opaque::new(5_u8))]);
    assert_eq!(normalize(&nested), None);
    assert_eq!(derive_key(&Arguments::new().arg(1).kwarg("o", nested)), None);
  }

  #[test]
  fn nan_has_no_key_and_signed_zeros_stay_apart() {
    assert_eq!(normalize(&Value::Float(f64::NAN)), None);
    assert_ne!(normalize(&Value::Float(-0.0)), normalize(&Value::Float(0.0)));
    assert_eq!(normalize(&Value::Float(-0.0)), normalize(&Value::Float(-0.0)));
  }

  #[test]
  fn sets_keep_duplicate_elements() {
    let once = Value::Set(vec![Value::Int(1)]);
    let twice = Value::Set(vec![Value::Int(1), Value::Int(1)]);
    assert_ne!(normalize(&once), normalize(&twice));
  }

  #[test]
  fn set_and_list_with_same_elements_differ() {
    let set = Value::Set(vec![Value::Int(1), Value::Int(2)]);
    let list: Value = vec![1, 2].into();
    assert_ne!(normalize(&set), normalize(&list));
  }

  #[test]
  fn keyword_value_finds_by_name() {
    let args = Arguments::new().kwarg("scale", 2).kwarg("scale", 3).kwarg("bias", 1);
    assert_eq!(args.keyword_value("scale"), Some(&Value::Int(3)));
    assert_eq!(args.keyword_value("missing"), None);
  }
}
