//! Filter evaluation for in-memory documents.
//!
//! Filters use the store-native document syntax: plain `field: value` pairs match by
//! equality, operator documents (`{ "$gt": 3 }`) apply comparisons, and the top-level
//! `$and`, `$or` and `$nor` combine sub-filters. Field names may be dotted paths into
//! embedded documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use doclink_core::error::{BackendError, BackendResult};


/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so `Int32(1)` equals `Double(1.0)`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    // Anything else only equals itself.
    Opaque(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            other => Comparable::Opaque(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Opaque(a), Comparable::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

fn is_operator_document(value: &Bson) -> bool {
    match value {
        Bson::Document(doc) => doc.keys().next().is_some_and(|key| key.starts_with('$')),
        _ => false,
    }
}

fn as_filters(operator: &str, value: &Bson) -> BackendResult<Vec<Document>> {
    value
        .as_array()
        .ok_or_else(|| BackendError::Message(format!("{operator} requires an array of filters")))?
        .iter()
        .map(|item| {
            item.as_document()
                .cloned()
                .ok_or_else(|| BackendError::Message(format!("{operator} entries must be documents")))
        })
        .collect()
}

/// Evaluates store-native filters against one document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns whether the document satisfies every clause of `filter`.
    pub fn matches(&self, filter: &Document) -> BackendResult<bool> {
        for (key, value) in filter {
            let matched = match key.as_str() {
                "$and" => {
                    let mut all = true;
                    for sub in as_filters(key, value)? {
                        if !self.matches(&sub)? {
                            all = false;
                            break;
                        }
                    }
                    all
                }
                "$or" => {
                    let mut any = false;
                    for sub in as_filters(key, value)? {
                        if self.matches(&sub)? {
                            any = true;
                            break;
                        }
                    }
                    any
                }
                "$nor" => {
                    let mut none = true;
                    for sub in as_filters(key, value)? {
                        if self.matches(&sub)? {
                            none = false;
                            break;
                        }
                    }
                    none
                }
                op if op.starts_with('$') => {
                    return Err(BackendError::Message(format!("unknown top-level operator {op}")));
                }
                field => self.matches_field(field, value)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn matches_field(&self, field: &str, condition: &Bson) -> BackendResult<bool> {
        let actual = lookup(self.document, field);

        if !is_operator_document(condition) {
            return Ok(Self::equals(actual, condition));
        }

        let Bson::Document(operators) = condition else {
            unreachable!("operator documents are documents");
        };

        for (op, operand) in operators {
            if !Self::apply(op, actual, operand)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    // A missing field equals null; an array field equals a value it contains.
    fn equals(actual: Option<&Bson>, expected: &Bson) -> bool {
        match actual {
            None => matches!(expected, Bson::Null),
            Some(value) => {
                let left = Comparable::from(value);
                let right = Comparable::from(expected);

                if left == right {
                    return true;
                }

                match left {
                    Comparable::Array(items) => items.iter().any(|item| item == &right),
                    _ => false,
                }
            }
        }
    }

    fn compare(actual: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
        let Some(value) = actual else {
            return false;
        };
        let right = Comparable::from(operand);

        match Comparable::from(value) {
            Comparable::Array(items) => items
                .iter()
                .any(|item| item.partial_cmp(&right).is_some_and(accept)),
            left => left.partial_cmp(&right).is_some_and(accept),
        }
    }

    fn apply(op: &str, actual: Option<&Bson>, operand: &Bson) -> BackendResult<bool> {
        Ok(match op {
            "$eq" => Self::equals(actual, operand),
            "$ne" => !Self::equals(actual, operand),
            "$gt" => Self::compare(actual, operand, |o| o == Ordering::Greater),
            "$gte" => Self::compare(actual, operand, |o| o != Ordering::Less),
            "$lt" => Self::compare(actual, operand, |o| o == Ordering::Less),
            "$lte" => Self::compare(actual, operand, |o| o != Ordering::Greater),
            "$in" | "$nin" => {
                let candidates = operand
                    .as_array()
                    .ok_or_else(|| BackendError::Message(format!("{op} requires an array")))?;
                let found = candidates
                    .iter()
                    .any(|candidate| Self::equals(actual, candidate));

                if op == "$in" { found } else { !found }
            }
            "$exists" => {
                let should_exist = match operand {
                    Bson::Boolean(flag) => *flag,
                    Bson::Int32(n) => *n != 0,
                    Bson::Int64(n) => *n != 0,
                    _ => true,
                };

                actual.is_some() == should_exist
            }
            "$not" => {
                let Bson::Document(inner) = operand else {
                    return Err(BackendError::Message("$not requires an operator document".into()));
                };

                let mut all = true;
                for (inner_op, inner_operand) in inner {
                    if !Self::apply(inner_op, actual, inner_operand)? {
                        all = false;
                        break;
                    }
                }
                !all
            }
            other => return Err(BackendError::Message(format!("unsupported operator {other}"))),
        })
    }
}
