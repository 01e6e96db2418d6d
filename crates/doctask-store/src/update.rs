//! Pure application of update operator documents.
//!
//! An operator document either carries `$`-operators (`$set`, `$push`,
//! `$addToSet`, each honoring `{$each: [...]}` batches and dotted paths) or
//! none at all, in which case its fields are merged into the target.

use bson::{Bson, Document};

use crate::error::{StoreError, StoreResult};
use crate::query::bson_eq;

/// Apply `operator` to `target` in place. Returns whether anything changed.
pub(crate) fn apply_update(target: &mut Document, operator: &Document) -> StoreResult<bool> {
    if !operator.keys().any(|k| k.starts_with('$')) {
        return set_fields(target, operator);
    }

    let mut modified = false;
    for (op, arg) in operator {
        let arg = arg
            .as_document()
            .ok_or_else(|| StoreError::UnsupportedOperator(op.clone()))?;
        modified |= match op.as_str() {
            "$set" => set_fields(target, arg)?,
            "$push" => push_fields(target, arg, false)?,
            "$addToSet" => push_fields(target, arg, true)?,
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        };
    }
    Ok(modified)
}

fn set_fields(target: &mut Document, fields: &Document) -> StoreResult<bool> {
    let mut modified = false;
    for (path, value) in fields {
        let previous = set_path(target, path, value.clone())?;
        modified |= previous.as_ref() != Some(value);
    }
    Ok(modified)
}

fn push_fields(target: &mut Document, fields: &Document, to_set: bool) -> StoreResult<bool> {
    let mut modified = false;
    for (path, value) in fields {
        let elements = each_elements(path, value)?;
        let array = array_at_path(target, path)?;
        for element in elements {
            if to_set && array.iter().any(|existing| bson_eq(existing, &element)) {
                continue;
            }
            array.push(element);
            modified = true;
        }
    }
    Ok(modified)
}

/// Elements to append for one field: the `$each` batch when present,
/// otherwise the value itself as a single element. A composite (document)
/// value without `$each` is one element, never expanded.
fn each_elements(path: &str, value: &Bson) -> StoreResult<Vec<Bson>> {
    if let Bson::Document(d) = value {
        if d.len() == 1 && d.contains_key("$each") {
            return match d.get("$each") {
                Some(Bson::Array(items)) => Ok(items.clone()),
                _ => Err(StoreError::EachNotArray {
                    path: path.to_string(),
                }),
            };
        }
    }
    Ok(vec![value.clone()])
}

/// Set `value` at a dotted path, creating intermediate documents. Returns the
/// previous value at the leaf, if any.
fn set_path(doc: &mut Document, path: &str, value: Bson) -> StoreResult<Option<Bson>> {
    let (parent, leaf) = descend(doc, path)?;
    Ok(parent.insert(leaf, value))
}

/// Mutable reference to the array at a dotted path, creating intermediate
/// documents and the array itself when missing.
fn array_at_path<'a>(doc: &'a mut Document, path: &str) -> StoreResult<&'a mut Vec<Bson>> {
    let (parent, leaf) = descend(doc, path)?;
    if !parent.contains_key(&leaf) {
        parent.insert(leaf.clone(), Bson::Array(Vec::new()));
    }
    match parent.get_mut(&leaf) {
        Some(Bson::Array(array)) => Ok(array),
        _ => Err(StoreError::NotAnArray {
            path: path.to_string(),
        }),
    }
}

/// Walk all but the last path segment, creating missing intermediate
/// documents, and return the parent document plus the leaf key.
fn descend<'a>(doc: &'a mut Document, path: &str) -> StoreResult<(&'a mut Document, String)> {
    let mut parts: Vec<&str> = path.split('.').collect();
    let leaf = match parts.pop() {
        Some(leaf) => leaf.to_string(),
        None => {
            return Err(StoreError::NotADocument {
                path: path.to_string(),
            })
        }
    };

    let mut current = doc;
    for part in parts {
        if !current.contains_key(part) {
            current.insert(part, Document::new());
        }
        current = match current.get_mut(part) {
            Some(Bson::Document(next)) => next,
            _ => {
                return Err(StoreError::NotADocument {
                    path: path.to_string(),
                })
            }
        };
    }
    Ok((current, leaf))
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    // -----------------------------------------------------------------------
    // Field merge (operator-free documents)
    // -----------------------------------------------------------------------

    #[test]
    fn operator_free_document_merges_fields() {
        let mut d = doc! { "user": "number 1" };
        let modified = apply_update(&mut d, &doc! { "name": "Diego" }).unwrap();
        assert!(modified);
        assert_eq!(d, doc! { "user": "number 1", "name": "Diego" });
    }

    #[test]
    fn merging_an_identical_value_is_not_a_modification() {
        let mut d = doc! { "user": "number 1" };
        let modified = apply_update(&mut d, &doc! { "user": "number 1" }).unwrap();
        assert!(!modified);
    }

    #[test]
    fn empty_operator_document_is_a_no_op() {
        let mut d = doc! { "user": "number 1" };
        let modified = apply_update(&mut d, &doc! {}).unwrap();
        assert!(!modified);
        assert_eq!(d, doc! { "user": "number 1" });
    }

    // -----------------------------------------------------------------------
    // $set
    // -----------------------------------------------------------------------

    #[test]
    fn set_with_dotted_path_creates_intermediates() {
        let mut d = doc! { "user": "number 1" };
        apply_update(&mut d, &doc! { "$set": { "label.en": "thing" } }).unwrap();
        assert_eq!(
            d,
            doc! { "user": "number 1", "label": { "en": "thing" } }
        );
    }

    #[test]
    fn set_through_scalar_is_rejected() {
        let mut d = doc! { "user": "number 1" };
        let err = apply_update(&mut d, &doc! { "$set": { "user.name": "x" } }).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotADocument {
                path: "user.name".into()
            }
        );
    }

    // -----------------------------------------------------------------------
    // $push / $addToSet
    // -----------------------------------------------------------------------

    #[test]
    fn push_creates_the_array_and_appends() {
        let mut d = doc! { "user": "number 1" };
        apply_update(&mut d, &doc! { "$push": { "attachments.section": "thing" } }).unwrap();
        assert_eq!(
            d.get_document("attachments").unwrap(),
            &doc! { "section": ["thing"] }
        );
    }

    #[test]
    fn push_appends_duplicates() {
        let mut d = doc! { "attachments": { "section": ["thing"] } };
        let modified =
            apply_update(&mut d, &doc! { "$push": { "attachments.section": "thing" } }).unwrap();
        assert!(modified);
        assert_eq!(
            d.get_document("attachments").unwrap(),
            &doc! { "section": ["thing", "thing"] }
        );
    }

    #[test]
    fn add_to_set_skips_present_values() {
        let mut d = doc! { "attachments": { "section": ["thing"] } };
        let modified =
            apply_update(&mut d, &doc! { "$addToSet": { "attachments.section": "thing" } })
                .unwrap();
        assert!(!modified);
        assert_eq!(
            d.get_document("attachments").unwrap(),
            &doc! { "section": ["thing"] }
        );
    }

    #[test]
    fn add_to_set_compares_documents_structurally() {
        let mut d = doc! { "obj": [ { "this": "object" } ] };
        let same =
            apply_update(&mut d, &doc! { "$addToSet": { "obj": { "this": "object" } } }).unwrap();
        assert!(!same);

        let other =
            apply_update(&mut d, &doc! { "$addToSet": { "obj": { "this": "object2" } } }).unwrap();
        assert!(other);
        assert_eq!(
            d.get_array("obj").unwrap().len(),
            2,
            "distinct document appended"
        );
    }

    #[test]
    fn each_batch_appends_all_elements() {
        let mut d = doc! {};
        apply_update(
            &mut d,
            &doc! { "$push": { "section": { "$each": ["thing", "stuff"] } } },
        )
        .unwrap();
        assert_eq!(d, doc! { "section": ["thing", "stuff"] });
    }

    #[test]
    fn each_batch_to_set_dedups_per_element() {
        let mut d = doc! { "section": ["thing"] };
        apply_update(
            &mut d,
            &doc! { "$addToSet": { "section": { "$each": ["thing", "somethingelse"] } } },
        )
        .unwrap();
        assert_eq!(d, doc! { "section": ["thing", "somethingelse"] });
    }

    #[test]
    fn each_with_non_array_is_rejected() {
        let mut d = doc! {};
        let err = apply_update(&mut d, &doc! { "$push": { "a": { "$each": "scalar" } } })
            .unwrap_err();
        assert_eq!(err, StoreError::EachNotArray { path: "a".into() });
    }

    #[test]
    fn push_to_non_array_is_rejected() {
        let mut d = doc! { "a": "scalar" };
        let err = apply_update(&mut d, &doc! { "$push": { "a": "x" } }).unwrap_err();
        assert_eq!(err, StoreError::NotAnArray { path: "a".into() });
    }

    // -----------------------------------------------------------------------
    // Operator validation
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_operator_is_rejected() {
        let mut d = doc! {};
        let err = apply_update(&mut d, &doc! { "$rename": { "a": "b" } }).unwrap_err();
        assert_eq!(err, StoreError::UnsupportedOperator("$rename".into()));
    }

    #[test]
    fn operator_with_non_document_argument_is_rejected() {
        let mut d = doc! {};
        let err = apply_update(&mut d, &doc! { "$set": 5 }).unwrap_err();
        assert_eq!(err, StoreError::UnsupportedOperator("$set".into()));
    }
}
