//! Collection-scoped document operations.
//!
//! A [`Collection`] is obtained from a [`Session`] and names one collection of the bound
//! database. Every operation first snapshots the session's database binding: without a
//! healthy session it fails with [`DocumentStoreError::NotReady`] before any I/O.
//!
//! # Example
//!
//! ```ignore
//! use doclink::prelude::*;
//! use bson::doc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Document)]
//! pub struct Guild {
//!     pub guild_id: String,
//!     pub prefix: String,
//! }
//!
//! # async fn example(session: &Session<impl StoreClient>) -> DocumentStoreResult<()> {
//! let ctx = session.context();
//! let guilds = session.collection("guilds");
//!
//! guilds
//!     .upsert_one(&ctx, doc! { "guild_id": "42" }, doc! { "$set": { "prefix": "!" } })
//!     .await?;
//!
//! let mut all: Vec<Box<Guild>> = Vec::new();
//! guilds.find_many_into(&ctx, doc! {}, &mut all).await?;
//! # Ok(()) }
//! ```

use bson::{Document as RawDocument, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    backend::{StoreClient, StoreDatabase},
    context::Context,
    cursor::Cursor,
    document::{DocumentSink, Element},
    error::{BackendError, DocumentStoreError, DocumentStoreResult},
    session::Session,
};

/// The cursor type returned by [`Collection::find_many`] for a client `C`.
pub type CursorOf<C> = Cursor<<<C as StoreClient>::Database as StoreDatabase>::Cursor>;

/// An accessor for one named collection of a session's bound database.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the session reference
/// * `C` - The store client type
#[derive(Debug)]
pub struct Collection<'a, C: StoreClient> {
    name: String,
    session: &'a Session<C>,
}

impl<'a, C: StoreClient> Collection<'a, C> {
    pub(crate) fn new(name: String, session: &'a Session<C>) -> Self {
        Self { name, session }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn write_error(&self, op: &'static str) -> impl FnOnce(BackendError) -> DocumentStoreError + '_ {
        move |source| DocumentStoreError::Write {
            op,
            collection: self.name.clone(),
            source,
        }
    }

    /// Deletes the first document matching `filter`.
    ///
    /// Succeeds when nothing matches; match counts are not surfaced.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotReady`] without a healthy session
    /// - [`DocumentStoreError::Write`] if the store rejects the delete
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn delete_one(&self, ctx: &Context, filter: RawDocument) -> DocumentStoreResult<()> {
        const OP: &str = "delete_one";

        let database = self.session.bound_database(OP).await?;
        let deleted = ctx
            .run(OP, database.delete_one(&self.name, filter))
            .await?
            .map_err(self.write_error(OP))?;

        tracing::debug!(collection = %self.name, deleted, "delete_one");

        Ok(())
    }

    /// Deletes every document matching `filter`.
    ///
    /// Succeeds when nothing matches; match counts are not surfaced.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::delete_one`].
    pub async fn delete_many(&self, ctx: &Context, filter: RawDocument) -> DocumentStoreResult<()> {
        const OP: &str = "delete_many";

        let database = self.session.bound_database(OP).await?;
        let deleted = ctx
            .run(OP, database.delete_many(&self.name, filter))
            .await?
            .map_err(self.write_error(OP))?;

        tracing::debug!(collection = %self.name, deleted, "delete_many");

        Ok(())
    }

    /// Inserts one document as-is.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotReady`] without a healthy session
    /// - [`DocumentStoreError::Encode`] if `document` does not serialize to a BSON document
    /// - [`DocumentStoreError::Write`] if the store rejects the insert
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn insert_one<D>(&self, ctx: &Context, document: &D) -> DocumentStoreResult<()>
    where
        D: Serialize,
    {
        const OP: &str = "insert_one";

        let database = self.session.bound_database(OP).await?;
        let raw = serialize_to_document(document).map_err(|source| DocumentStoreError::Encode {
            op: OP,
            collection: self.name.clone(),
            source,
        })?;

        ctx.run(OP, database.insert_one(&self.name, raw))
            .await?
            .map_err(self.write_error(OP))?;

        tracing::debug!(collection = %self.name, "insert_one");

        Ok(())
    }

    /// Updates the document matching `filter` with `update`, inserting one when nothing
    /// matches. Upsert mode is always on.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::delete_one`].
    pub async fn upsert_one(
        &self,
        ctx: &Context,
        filter: RawDocument,
        update: RawDocument,
    ) -> DocumentStoreResult<()> {
        const OP: &str = "upsert_one";

        let database = self.session.bound_database(OP).await?;

        ctx.run(OP, database.update_one(&self.name, filter, update, true))
            .await?
            .map_err(self.write_error(OP))?;

        tracing::debug!(collection = %self.name, "upsert_one");

        Ok(())
    }

    /// Finds the first document matching `filter` and decodes it as `D`.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotReady`] without a healthy session
    /// - [`DocumentStoreError::NotFound`] if nothing matches
    /// - [`DocumentStoreError::Decode`] if the match does not fit `D`
    /// - [`DocumentStoreError::Query`] if the read fails
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn find_one<D>(&self, ctx: &Context, filter: RawDocument) -> DocumentStoreResult<D>
    where
        D: DeserializeOwned,
    {
        const OP: &str = "find_one";

        let database = self.session.bound_database(OP).await?;
        let found = match ctx.run(OP, database.find_one(&self.name, filter)).await? {
            Ok(found) => found,
            Err(source) if source.is_no_documents() => None,
            Err(source) => {
                return Err(DocumentStoreError::Query {
                    op: OP,
                    collection: self.name.clone(),
                    source,
                });
            }
        };

        let raw = found.ok_or_else(|| DocumentStoreError::NotFound {
            op: OP,
            collection: self.name.clone(),
        })?;

        deserialize_from_document(raw).map_err(|source| DocumentStoreError::Decode {
            op: OP,
            collection: self.name.clone(),
            source,
        })
    }

    /// Opens a lazy cursor over the raw documents matching `filter`. Nothing is decoded.
    ///
    /// A store-reported "no documents" condition yields an empty cursor rather than an
    /// error. Note that [`Collection::find_many_into`] does not fold that condition.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotReady`] without a healthy session
    /// - [`DocumentStoreError::Query`] if the query fails for any other reason
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn find_many(&self, ctx: &Context, filter: RawDocument) -> DocumentStoreResult<CursorOf<C>> {
        const OP: &str = "find_many";

        let database = self.session.bound_database(OP).await?;

        match ctx.run(OP, database.find(&self.name, filter)).await? {
            Ok(inner) => Ok(Cursor::new(self.name.clone(), inner)),
            Err(source) if source.is_no_documents() => {
                tracing::debug!(collection = %self.name, "find_many matched no documents");
                Ok(Cursor::empty(self.name.clone()))
            }
            Err(source) => Err(DocumentStoreError::Query {
                op: OP,
                collection: self.name.clone(),
                source,
            }),
        }
    }

    /// Queries every document matching `filter` and appends each, decoded, to `destination`.
    ///
    /// The element shape is fixed by the destination type: for `Vec<D>` each document is
    /// decoded into a fresh `D`; for `Vec<Box<D>>` or `Vec<Arc<D>>` it is decoded into a
    /// fresh `D` and wrapped. Elements are appended in store order after any elements the
    /// destination already holds. Destinations that are not growable sequences do not
    /// compile:
    ///
    /// ```compile_fail
    /// # use doclink_core::{backend::StoreClient, context::Context, session::Session};
    /// # async fn example<C: StoreClient>(session: &Session<C>, ctx: &Context) {
    /// let mut single = String::new();
    /// let _ = session
    ///     .collection("guilds")
    ///     .find_many_into(ctx, bson::doc! {}, &mut single)
    ///     .await;
    /// # }
    /// ```
    ///
    /// The cursor is released on every exit path, including cancellation.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotReady`] without a healthy session
    /// - [`DocumentStoreError::Query`] if the query fails, including when the store reports
    ///   "no documents"
    /// - [`DocumentStoreError::Decode`] if a document does not fit the element's document
    ///   type. Elements appended before the failing document are kept.
    /// - [`DocumentStoreError::Resource`] if releasing the cursor fails and nothing else did
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn find_many_into<S>(
        &self,
        ctx: &Context,
        filter: RawDocument,
        destination: &mut S,
    ) -> DocumentStoreResult<()>
    where
        S: DocumentSink,
    {
        const OP: &str = "find_many_into";

        let database = self.session.bound_database(OP).await?;
        let inner = ctx
            .run(OP, database.find(&self.name, filter))
            .await?
            .map_err(|source| DocumentStoreError::Query {
                op: OP,
                collection: self.name.clone(),
                source,
            })?;

        let mut cursor = Cursor::new(self.name.clone(), inner);
        let before = destination.len();
        let drained = self.drain_into(ctx, &mut cursor, destination).await;
        let released = cursor.release(OP).await;

        tracing::debug!(
            collection = %self.name,
            appended = destination.len() - before,
            "find_many_into"
        );

        match (drained, released) {
            (Err(err), Err(release_err)) => {
                tracing::warn!(collection = %self.name, error = %release_err, "cursor release failed after an earlier error");
                Err(err)
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    async fn drain_into<S>(
        &self,
        ctx: &Context,
        cursor: &mut CursorOf<C>,
        destination: &mut S,
    ) -> DocumentStoreResult<()>
    where
        S: DocumentSink,
    {
        const OP: &str = "find_many_into";

        while let Some(raw) = cursor.fetch(ctx, OP).await? {
            let document: <S::Element as Element>::Document = deserialize_from_document(raw)
                .map_err(|source| DocumentStoreError::Decode {
                    op: OP,
                    collection: self.name.clone(),
                    source,
                })?;

            destination.append(<S::Element as Element>::from_document(document));
        }

        Ok(())
    }
}
