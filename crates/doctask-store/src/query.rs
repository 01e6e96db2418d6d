//! Pure document matching and dotted-path navigation.

use bson::{Bson, Document};

/// Field-wise equality match. Filter keys may use dotted paths; an empty
/// filter matches every document.
pub(crate) fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, expected)| {
        get_path(doc, path).map_or(false, |actual| bson_eq(actual, expected))
    })
}

/// Resolve a dotted path inside a document.
pub(crate) fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut current = doc;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        let value = current.get(part)?;
        if parts.peek().is_none() {
            return Some(value);
        }
        current = value.as_document()?;
    }
    None
}

/// Value equality with numeric coercion: `Int32(1)`, `Int64(1)` and
/// `Double(1.0)` all compare equal, the way the store compares keys.
pub(crate) fn bson_eq(a: &Bson, b: &Bson) -> bool {
    if a == b {
        return true;
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}
