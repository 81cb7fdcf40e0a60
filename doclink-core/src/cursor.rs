//! Lazy sequences of raw documents returned by `Collection::find_many`.

use bson::Document;
use serde::de::DeserializeOwned;

use crate::{
    backend::StoreCursor,
    context::Context,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A lazy sequence of raw documents matching a query.
///
/// The cursor holds store resources until [`Cursor::close`] is called. Dropping it without
/// closing leaves cleanup to the backend's own drop behavior.
#[derive(Debug)]
pub struct Cursor<R: StoreCursor> {
    collection: String,
    // `None` when the store reported no documents.
    inner: Option<R>,
}

impl<R: StoreCursor> Cursor<R> {
    pub(crate) fn new(collection: String, inner: R) -> Self {
        Self { collection, inner: Some(inner) }
    }

    pub(crate) fn empty(collection: String) -> Self {
        Self { collection, inner: None }
    }

    /// Returns the name of the collection this cursor reads from.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Fetches the next raw document, or `None` once the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::Query`] if the store fails to produce the next batch
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn next(&mut self, ctx: &Context) -> DocumentStoreResult<Option<Document>> {
        self.fetch(ctx, "cursor_next").await
    }

    pub(crate) async fn fetch(
        &mut self,
        ctx: &Context,
        op: &'static str,
    ) -> DocumentStoreResult<Option<Document>> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };

        ctx.run(op, inner.next_document())
            .await?
            .map_err(|source| DocumentStoreError::Query {
                op,
                collection: self.collection.clone(),
                source,
            })
    }

    /// Fetches the next document and decodes it as `D`.
    ///
    /// # Errors
    ///
    /// Same as [`Cursor::next`], plus [`DocumentStoreError::Decode`] if the document does not
    /// fit `D`.
    pub async fn next_as<D>(&mut self, ctx: &Context) -> DocumentStoreResult<Option<D>>
    where
        D: DeserializeOwned,
    {
        match self.next(ctx).await? {
            Some(raw) => bson::de::deserialize_from_document(raw)
                .map(Some)
                .map_err(|source| DocumentStoreError::Decode {
                    op: "cursor_next",
                    collection: self.collection.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Releases the store resources held by this cursor.
    ///
    /// Release is not bound to a context: it runs to completion even after cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Resource`] if the store fails to release the cursor.
    pub async fn close(self) -> DocumentStoreResult<()> {
        self.release("cursor_close").await
    }

    pub(crate) async fn release(self, op: &'static str) -> DocumentStoreResult<()> {
        match self.inner {
            Some(inner) => inner
                .close()
                .await
                .map_err(|source| DocumentStoreError::Resource {
                    op,
                    collection: self.collection,
                    source,
                }),
            None => Ok(()),
        }
    }
}
