//! Update application for in-memory documents.
//!
//! An update is either an operator document (`$set`, `$unset`, `$inc`, `$setOnInsert`) or a
//! replacement document without operators. Upserts seed the new document from the plain
//! equality clauses of the filter before applying the update.

use bson::{Bson, Document, oid::ObjectId};

use doclink_core::error::{BackendError, BackendResult};

pub(crate) const ID_FIELD: &str = "_id";

fn is_operator_update(update: &Document) -> bool {
    update.keys().next().is_some_and(|key| key.starts_with('$'))
}

fn operand<'a>(op: &str, value: &'a Bson) -> BackendResult<&'a Document> {
    value
        .as_document()
        .ok_or_else(|| BackendError::Message(format!("{op} requires a document")))
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> BackendResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }

            match document.get_mut(head) {
                Some(Bson::Document(inner)) => set_path(inner, rest, value),
                _ => Err(BackendError::Message(format!("cannot create field {rest} in non-document {head}"))),
            }
        }
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                unset_path(inner, rest);
            }
        }
    }
}

fn increment(current: Option<&Bson>, by: &Bson) -> BackendResult<Bson> {
    Ok(match (current, by) {
        (None, by) => by.clone(),
        // i32 overflow widens to i64; i64 overflow is rejected.
        (Some(Bson::Int32(a)), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(*a as i64 + *b as i64),
        },
        (Some(Bson::Int64(a)), Bson::Int32(b)) => Bson::Int64(checked_i64(*a, *b as i64)?),
        (Some(Bson::Int32(a)), Bson::Int64(b)) => Bson::Int64(checked_i64(*a as i64, *b)?),
        (Some(Bson::Int64(a)), Bson::Int64(b)) => Bson::Int64(checked_i64(*a, *b)?),
        (Some(a), b) => match (as_number(a), as_number(b)) {
            (Some(a), Some(b)) => Bson::Double(a + b),
            _ => return Err(BackendError::Message("$inc requires numeric values".into())),
        },
    })
}

fn checked_i64(a: i64, b: i64) -> BackendResult<i64> {
    a.checked_add(b)
        .ok_or_else(|| BackendError::Message(format!("$inc overflows a 64-bit integer: {a} + {b}")))
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(*n as f64),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Applies `update` to `document` in place.
///
/// `inserting` enables `$setOnInsert`. The `_id` field is never changed.
pub(crate) fn apply_update(document: &mut Document, update: &Document, inserting: bool) -> BackendResult<()> {
    if !is_operator_update(update) {
        let id = document.get(ID_FIELD).cloned();
        *document = update.clone();
        if let Some(id) = id {
            document.insert(ID_FIELD, id);
        }
        return Ok(());
    }

    for (op, value) in update {
        match op.as_str() {
            "$set" => {
                for (path, value) in operand(op, value)? {
                    if path != ID_FIELD {
                        set_path(document, path, value.clone())?;
                    }
                }
            }
            "$setOnInsert" => {
                if inserting {
                    for (path, value) in operand(op, value)? {
                        set_path(document, path, value.clone())?;
                    }
                }
            }
            "$unset" => {
                for (path, _) in operand(op, value)? {
                    if path != ID_FIELD {
                        unset_path(document, path);
                    }
                }
            }
            "$inc" => {
                for (path, by) in operand(op, value)? {
                    let next = increment(crate::evaluator::lookup(document, path), by)?;
                    set_path(document, path, next)?;
                }
            }
            other => return Err(BackendError::Message(format!("unsupported update operator {other}"))),
        }
    }

    Ok(())
}

/// Builds the document inserted by an upsert that matched nothing.
pub(crate) fn seed_from_filter(filter: &Document, update: &Document) -> BackendResult<Document> {
    let mut document = Document::new();

    if is_operator_update(update) {
        for (key, value) in filter {
            if key.starts_with('$') {
                continue;
            }

            match value {
                Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
                    if let Some(eq) = ops.get("$eq") {
                        set_path(&mut document, key, eq.clone())?;
                    }
                }
                plain => set_path(&mut document, key, plain.clone())?,
            }
        }
    }

    apply_update(&mut document, update, true)?;

    if !document.contains_key(ID_FIELD) {
        document.insert(ID_FIELD, ObjectId::new());
    }

    Ok(document)
}
