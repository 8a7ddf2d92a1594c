use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment-local document id, assigned densely from zero at flush time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

/// Location of a document inside a reader: segment position plus local id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocAddress {
    pub segment_ord: u32,
    pub doc_id: DocId,
}

impl DocAddress {
    pub fn new(segment_ord: u32, doc_id: DocId) -> Self {
        DocAddress { segment_ord, doc_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),        // Analyzed into tokens
    StoredExact(String), // Indexed as one term, never analyzed
    Integer(i64),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::StoredExact(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "text<{}>", s),
            FieldValue::StoredExact(s) => write!(f, "exact<{}>", s),
            FieldValue::Integer(v) => write!(f, "int<{}>", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub stored: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue, stored: bool) -> Self {
        Field {
            name: name.into(),
            value,
            stored,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(name, FieldValue::Text(value.into()), true)
    }

    pub fn exact(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(name, FieldValue::StoredExact(value.into()), true)
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Field::new(name, FieldValue::Integer(value), true)
    }

    /// Index the value without keeping it retrievable
    pub fn indexed_only(mut self) -> Self {
        self.stored = false;
        self
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let flag = if self.stored { "stored" } else { "indexed" };
        write!(f, "{}:{} ({})", self.name, self.value, flag)
    }
}

/// Ordered set of fields. Documents are values: "updating" one means
/// building a modified copy and submitting it again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub fields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Vec::new() }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn without_fields(mut self, name: &str) -> Self {
        self.remove_fields(name);
        self
    }

    pub fn remove_fields(&mut self, name: &str) {
        self.fields.retain(|f| f.name != name);
    }

    /// First value of the named field
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| &f.value)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Copy holding only the retrievable fields
    pub fn stored_only(&self) -> Document {
        Document {
            fields: self.fields.iter().filter(|f| f.stored).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Document<")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, ">")
    }
}
