//! Textual dumps of contextual objects.
//!
//! A report can carry a contextual object, typically the request that was
//! being served. The object is rendered as indented `name = value` lines:
//!
//! ```text
//! method = POST
//! started: 2026-10-18 14:03:11
//! user:
//! 	id = 7
//! 	email = nil
//!
//! ```
//!
//! Rendering is driven by two capabilities:
//!
//! - [`Dump`] turns any value into a [`Value`]: text, a timestamp, nothing, or
//!   a nested struct.
//! - [`Describe`] lists the fields of a struct, in declaration order.
//!
//! Structs usually get both through `#[derive(Describe)]`, which includes
//! `pub` fields only. Implementing them by hand is short:
//!
//! ```rust
//! use reportkit::dump::{self, Describe, Dump, Fields, Value};
//!
//! struct Job {
//!     name: String,
//!     attempts: u32,
//! }
//!
//! impl Describe for Job {
//!     fn describe(&self, fields: &mut Fields) {
//!         fields.field("name", &self.name).field("attempts", &self.attempts);
//!     }
//! }
//!
//! impl Dump for Job {
//!     fn dump_value(&self) -> Value {
//!         Value::nested(self)
//!     }
//! }
//!
//! let job = Job { name: "reindex".into(), attempts: 3 };
//! assert_eq!(dump::dump(&job, ""), "name = reindex\nattempts = 3\n\n");
//! ```

use core::fmt;
use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
    time::{Duration, SystemTime},
};

/// The rendered form of a single value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// A plain value, rendered as `name = text`.
    Text(String),
    /// A point in time, rendered inline as `name: timestamp`.
    Timestamp(String),
    /// An absent value, rendered as `name = nil`.
    Nil,
    /// A struct, rendered as `name:` followed by its fields one level deeper.
    Struct(Fields),
}

impl Value {
    /// Renders `value` through its [`Display`](fmt::Display) impl.
    pub fn text(value: impl fmt::Display) -> Self {
        Self::Text(value.to_string())
    }

    /// Captures the fields of a struct.
    pub fn nested<T: Describe + ?Sized>(value: &T) -> Self {
        Self::Struct(Fields::of(value))
    }
}

/// Inline form, used for values inside sequences and maps: structs render as
/// `{a b c}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) | Value::Timestamp(text) => f.write_str(text),
            Value::Nil => f.write_str("nil"),
            Value::Struct(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", field.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A named field of a struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// The field name as it should appear in the dump.
    pub name: Cow<'static, str>,
    /// The rendered value.
    pub value: Value,
}

/// The ordered fields of a struct.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<Field>,
}

impl Fields {
    /// Creates an empty field list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the fields of `value`.
    pub fn of<T: Describe + ?Sized>(value: &T) -> Self {
        let mut fields = Self::new();
        value.describe(&mut fields);
        fields
    }

    /// Appends an already rendered value.
    pub fn push(&mut self, name: impl Into<Cow<'static, str>>, value: Value) -> &mut Self {
        self.entries.push(Field {
            name: name.into(),
            value,
        });
        self
    }

    /// Appends a field rendered through [`Dump`].
    pub fn field<T: Dump + ?Sized>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: &T,
    ) -> &mut Self {
        self.push(name, value.dump_value())
    }

    /// Appends a field rendered through its [`Display`](fmt::Display) impl.
    pub fn field_display<T: fmt::Display + ?Sized>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: &T,
    ) -> &mut Self {
        self.push(name, Value::Text(value.to_string()))
    }

    /// Appends a field rendered through its [`Debug`](fmt::Debug) impl.
    pub fn field_debug<T: fmt::Debug + ?Sized>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: &T,
    ) -> &mut Self {
        self.push(name, Value::Text(format!("{value:?}")))
    }

    /// Iterates over the fields in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, Field> {
        self.entries.iter()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a [`Display`](fmt::Display) adapter rendering the fields at
    /// the given indentation.
    pub fn display<'a>(&'a self, indent: &'a str) -> impl fmt::Display + 'a {
        Indented {
            fields: self,
            indent,
        }
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = core::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct Indented<'a> {
    fields: &'a Fields,
    indent: &'a str,
}

impl fmt::Display for Indented<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = self.indent;
        for Field { name, value } in self.fields {
            match value {
                Value::Text(text) => writeln!(f, "{indent}{name} = {text}")?,
                Value::Nil => writeln!(f, "{indent}{name} = nil")?,
                Value::Timestamp(timestamp) => writeln!(f, "{indent}{name}: {timestamp}")?,
                Value::Struct(nested) => {
                    writeln!(f, "{indent}{name}:")?;
                    let deeper = format!("{indent}\t");
                    write!(f, "{}", nested.display(&deeper))?;
                }
            }
        }
        writeln!(f)
    }
}

/// A value that can be rendered into a dump.
pub trait Dump {
    /// Renders the value.
    fn dump_value(&self) -> Value;
}

/// A struct that can list its fields.
pub trait Describe {
    /// Appends the fields of `self`, in declaration order.
    fn describe(&self, fields: &mut Fields);
}

/// Renders `value` as indented `name = value` lines.
///
/// - Absent values (`()`, `None`) render as the empty string.
/// - Values that are not structs render as a single newline.
/// - Structs render one line per field, nested structs one tab deeper, and
///   every level ends with a blank line.
///
/// # Examples
///
/// ```rust
/// use reportkit::dump::dump;
///
/// assert_eq!(dump(&None::<u32>, ""), "");
/// assert_eq!(dump(&42, ""), "\n");
/// ```
pub fn dump<T: Dump + ?Sized>(value: &T, indent: &str) -> String {
    match value.dump_value() {
        Value::Nil => String::new(),
        Value::Struct(fields) => fields.display(indent).to_string(),
        Value::Text(_) | Value::Timestamp(_) => "\n".to_string(),
    }
}

macro_rules! dump_as_text {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Dump for $ty {
                fn dump_value(&self) -> Value {
                    Value::Text(self.to_string())
                }
            }
        )*
    };
}

dump_as_text!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, str,
    String, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr,
);

impl Dump for () {
    fn dump_value(&self) -> Value {
        Value::Nil
    }
}

impl<T: Dump> Dump for Option<T> {
    fn dump_value(&self) -> Value {
        match self {
            Some(value) => value.dump_value(),
            None => Value::Nil,
        }
    }
}

impl<T: Dump + ?Sized> Dump for &T {
    fn dump_value(&self) -> Value {
        (**self).dump_value()
    }
}

impl<T: Dump + ?Sized> Dump for &mut T {
    fn dump_value(&self) -> Value {
        (**self).dump_value()
    }
}

impl<T: Dump + ?Sized> Dump for Box<T> {
    fn dump_value(&self) -> Value {
        (**self).dump_value()
    }
}

impl<T: Dump + ?Sized> Dump for Rc<T> {
    fn dump_value(&self) -> Value {
        (**self).dump_value()
    }
}

impl<T: Dump + ?Sized> Dump for Arc<T> {
    fn dump_value(&self) -> Value {
        (**self).dump_value()
    }
}

impl<B: Dump + ToOwned + ?Sized> Dump for Cow<'_, B> {
    fn dump_value(&self) -> Value {
        (**self).dump_value()
    }
}

impl Dump for dyn Describe + '_ {
    fn dump_value(&self) -> Value {
        Value::nested(self)
    }
}

impl Dump for dyn Describe + Send + Sync + '_ {
    fn dump_value(&self) -> Value {
        Value::nested(self)
    }
}

impl Dump for Path {
    fn dump_value(&self) -> Value {
        Value::Text(self.display().to_string())
    }
}

impl Dump for PathBuf {
    fn dump_value(&self) -> Value {
        self.as_path().dump_value()
    }
}

impl Dump for Duration {
    fn dump_value(&self) -> Value {
        Value::Text(format!("{self:?}"))
    }
}

impl Dump for SystemTime {
    fn dump_value(&self) -> Value {
        Value::Timestamp(chrono::DateTime::<chrono::Utc>::from(*self).to_string())
    }
}

impl<Tz: chrono::TimeZone> Dump for chrono::DateTime<Tz>
where
    Tz::Offset: fmt::Display,
{
    fn dump_value(&self) -> Value {
        Value::Timestamp(self.to_string())
    }
}

impl Dump for chrono::NaiveDateTime {
    fn dump_value(&self) -> Value {
        Value::Timestamp(self.to_string())
    }
}

impl Dump for chrono::NaiveDate {
    fn dump_value(&self) -> Value {
        Value::Timestamp(self.to_string())
    }
}

impl Dump for chrono::NaiveTime {
    fn dump_value(&self) -> Value {
        Value::Timestamp(self.to_string())
    }
}

fn sequence<'a, T: Dump + 'a>(items: impl IntoIterator<Item = &'a T>) -> Value {
    let rendered: Vec<String> = items
        .into_iter()
        .map(|item| item.dump_value().to_string())
        .collect();
    Value::Text(format!("[{}]", rendered.join(" ")))
}

fn mapping<'a, K: Dump + 'a, V: Dump + 'a>(
    entries: impl IntoIterator<Item = (&'a K, &'a V)>,
) -> Value {
    let rendered: Vec<String> = entries
        .into_iter()
        .map(|(key, value)| format!("{}:{}", key.dump_value(), value.dump_value()))
        .collect();
    Value::Text(format!("map[{}]", rendered.join(" ")))
}

impl<T: Dump> Dump for [T] {
    fn dump_value(&self) -> Value {
        sequence(self)
    }
}

impl<T: Dump, const N: usize> Dump for [T; N] {
    fn dump_value(&self) -> Value {
        sequence(self)
    }
}

impl<T: Dump> Dump for Vec<T> {
    fn dump_value(&self) -> Value {
        sequence(self)
    }
}

impl<T: Dump> Dump for VecDeque<T> {
    fn dump_value(&self) -> Value {
        sequence(self)
    }
}

impl<T: Dump> Dump for BTreeSet<T> {
    fn dump_value(&self) -> Value {
        sequence(self)
    }
}

impl<T: Dump, S> Dump for HashSet<T, S> {
    fn dump_value(&self) -> Value {
        sequence(self)
    }
}

impl<T: Dump, S> Dump for indexmap::IndexSet<T, S> {
    fn dump_value(&self) -> Value {
        sequence(self)
    }
}

impl<K: Dump, V: Dump> Dump for BTreeMap<K, V> {
    fn dump_value(&self) -> Value {
        mapping(self)
    }
}

impl<K: Dump, V: Dump, S> Dump for HashMap<K, V, S> {
    fn dump_value(&self) -> Value {
        mapping(self)
    }
}

impl<K: Dump, V: Dump, S> Dump for indexmap::IndexMap<K, V, S> {
    fn dump_value(&self) -> Value {
        mapping(self)
    }
}
