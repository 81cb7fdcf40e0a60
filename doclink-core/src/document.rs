//! Core traits describing documents and the containers they are materialized into.
//!
//! - [`Document`] marks a caller-defined serde type that the store can decode into and
//!   encode from.
//! - [`Element`] describes what gets appended to a destination for each decoded document:
//!   either the document value itself or a single-level indirection to it (`Box<D>`,
//!   `Arc<D>`).
//! - [`DocumentSink`] is a growable ordered sequence of elements (`Vec<E>`, `VecDeque<E>`).
//!
//! Because the destination's element shape is a type parameter, it is resolved once at
//! compile time, and destinations that are not growable sequences are rejected by the
//! compiler rather than at runtime.

use bson::{
    Document as RawDocument, de::deserialize_from_document, error::Error as BsonError,
    ser::serialize_to_document,
};
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::VecDeque, sync::Arc};

/// Core trait for caller-defined document shapes.
///
/// `Document` has no methods of its own; it ties together the bounds the access layer
/// needs. Implement it by hand or with `#[derive(Document)]`, which also implements
/// [`Element`] for the value shape.
///
/// # Example
///
/// ```ignore
/// use doclink::document::{Document, Element};
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Guild {
///     pub guild_id: String,
///     pub prefix: String,
/// }
///
/// impl Document for Guild {}
///
/// impl Element for Guild {
///     type Document = Self;
///
///     fn from_document(document: Self) -> Self {
///         document
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Extension trait providing BSON conversion utilities for documents.
///
/// This trait is automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Encodes this document as a raw BSON document.
    fn to_raw(&self) -> Result<RawDocument, BsonError>;

    /// Decodes a raw BSON document into a fresh value.
    fn from_raw(raw: RawDocument) -> Result<Self, BsonError>;
}

impl<D: Document> DocumentExt for D {
    fn to_raw(&self) -> Result<RawDocument, BsonError> {
        serialize_to_document(self)
    }

    fn from_raw(raw: RawDocument) -> Result<Self, BsonError> {
        deserialize_from_document(raw)
    }
}

/// The shape of one element in a destination sequence.
///
/// `Element::Document` is the type each raw document is decoded into; `from_document`
/// wraps the decoded value into the element shape.
pub trait Element: Send + Sized {
    /// The document type decoded for each element.
    type Document: Document;

    /// Wraps a freshly decoded document into this element shape.
    fn from_document(document: Self::Document) -> Self;
}

impl<D: Document> Element for Box<D> {
    type Document = D;

    fn from_document(document: D) -> Self {
        Box::new(document)
    }
}

impl<D: Document> Element for Arc<D> {
    type Document = D;

    fn from_document(document: D) -> Self {
        Arc::new(document)
    }
}

/// A growable, ordered, append-only destination for materialized documents.
///
/// Existing elements are never removed or reordered; each call to [`DocumentSink::append`]
/// adds one element at the end.
pub trait DocumentSink: Send {
    type Element: Element;

    /// Appends one element at the end of the sequence.
    fn append(&mut self, element: Self::Element);

    /// Returns the number of elements currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Element> DocumentSink for Vec<E> {
    type Element = E;

    fn append(&mut self, element: E) {
        self.push(element);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<E: Element> DocumentSink for VecDeque<E> {
    type Element = E;

    fn append(&mut self, element: E) {
        self.push_back(element);
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}
