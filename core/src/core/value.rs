// dataruns/src/core/value.rs

//! The dynamic `Value` that flows between pipeline stages.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value passed into, between and out of pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  /// A plain ordered sequence, as written by a caller. Pipelines coerce it into
  /// an `Array` before the first stage runs.
  List(Vec<Value>),
  /// Array-like data, the shape stages normally operate on.
  Array(Vec<Value>),
  /// An unordered collection. Element order carries no meaning.
  Set(Vec<Value>),
  /// String-keyed mapping. Accepted by stages but never as pipeline input.
  Map(BTreeMap<String, Value>),
  Table(Table),
  /// A host object with no value representation; equal only to itself.
  Opaque(Opaque),
}

impl Value {
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn is_mapping(&self) -> bool {
    matches!(self, Value::Map(_))
  }

  /// Turns a plain `List` into an `Array`; every other value is returned as is.
  pub fn into_array_like(self) -> Value {
    match self {
      Value::List(items) => Value::Array(items),
      other => other,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(i) => Some(*i as f64),
      Value::Float(f) => Some(*f),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Elements of a `List`, `Array` or `Set`.
  pub fn as_slice(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) | Value::Array(items) | Value::Set(items) => Some(items),
      _ => None,
    }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Text(_) => "text",
      Value::List(_) => "list",
      Value::Array(_) => "array",
      Value::Set(_) => "set",
      Value::Map(_) => "map",
      Value::Table(_) => "table",
      Value::Opaque(_) => "opaque",
    }
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self {
    Value::Int(i64::from(i))
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Text(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Text(s)
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(items: Vec<T>) -> Self {
    Value::List(items.into_iter().map(Into::into).collect())
  }
}

impl From<BTreeMap<String, Value>> for Value {
  fn from(map: BTreeMap<String, Value>) -> Self {
    Value::Map(map)
  }
}

impl From<Table> for Value {
  fn from(table: Table) -> Self {
    Value::Table(table)
  }
}

impl From<Opaque> for Value {
  fn from(opaque: Opaque) -> Self {
    Value::Opaque(opaque)
  }
}

/// Tabular data: named columns kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
  columns: Vec<(String, Vec<Value>)>,
}

impl Table {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a column, replacing any existing column with the same name in place.
  pub fn with_column<S: Into<String>>(mut self, name: S, values: Vec<Value>) -> Self {
    let name = name.into();
    match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
      Some((_, slot)) => *slot = values,
      None => self.columns.push((name, values)),
    }
    self
  }

  pub fn column(&self, name: &str) -> Option<&[Value]> {
    self
      .columns
      .iter()
      .find(|(existing, _)| existing == name)
      .map(|(_, values)| values.as_slice())
  }

  pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
    self.columns.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
  }

  pub fn num_columns(&self) -> usize {
    self.columns.len()
  }

  /// Length of the longest column.
  pub fn num_rows(&self) -> usize {
    self.columns.iter().map(|(_, values)| values.len()).max().unwrap_or(0)
  }
}

/// Shared handle to an arbitrary host object.
///
/// Two handles compare equal only when they point at the same allocation, so
/// an `Opaque` never yields a stable cache key.
#[derive(Clone)]
pub struct Opaque {
  type_name: &'static str,
  inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Opaque {
      type_name: std::any::type_name::<T>(),
      inner: Arc::new(value),
    }
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.inner.downcast_ref::<T>()
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }
}

impl PartialEq for Opaque {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for Opaque {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Opaque").field("type_name", &self.type_name).finish()
  }
}
