use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc};
use mongodb::{
    Client, Collection as MongoCollection, Cursor as MongoCursor, Database,
    options::{ClientOptions, ReadPreference, SelectionCriteria},
};
use doclink_core::{
    backend::{StoreClient, StoreCursor, StoreDatabase},
    error::{BackendError, BackendResult},
};


/// A MongoDB client speaking the doclink store protocol.
///
/// The driver manages its own connection pool. [`StoreClient::connect`] runs a `hello`
/// handshake before warming it, and [`StoreClient::disconnect`] shuts it down.
#[derive(Debug, Clone)]
pub struct MongoDbClient {
    client: Client,
}

impl MongoDbClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StoreClient for MongoDbClient {
    type Database = MongoDbDatabase;

    async fn from_uri(uri: &str) -> BackendResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(BackendError::invalid_options)?;

        Ok(Self::new(
            Client::with_options(options).map_err(BackendError::invalid_options)?,
        ))
    }

    async fn connect(&self) -> BackendResult<()> {
        // Server selection and the handshake happen on the first command.
        self.client
            .database("admin")
            .run_command(doc! { "hello": 1 })
            .await
            .map_err(BackendError::driver)?;

        self.client.warm_connection_pool().await;
        tracing::debug!("mongodb handshake completed");

        Ok(())
    }

    async fn disconnect(&self) -> BackendResult<()> {
        self.client.clone().shutdown().await;
        tracing::debug!("mongodb client shut down");

        Ok(())
    }

    async fn ping(&self) -> BackendResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
            .await
            .map_err(BackendError::driver)?;

        Ok(())
    }

    fn database(&self, name: &str) -> Self::Database {
        MongoDbDatabase {
            database: self.client.database(name),
        }
    }
}


/// A handle to a MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoDbDatabase {
    database: Database,
}

impl MongoDbDatabase {
    fn get_collection(&self, collection: &str) -> MongoCollection<Document> {
        self.database.collection(collection)
    }
}

#[async_trait]
impl StoreDatabase for MongoDbDatabase {
    type Cursor = MongoDbCursor;

    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        Ok(self
            .get_collection(collection)
            .delete_one(filter)
            .await
            .map_err(BackendError::driver)?
            .deleted_count)
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        Ok(self
            .get_collection(collection)
            .delete_many(filter)
            .await
            .map_err(BackendError::driver)?
            .deleted_count)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> BackendResult<()> {
        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(BackendError::driver)?;

        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> BackendResult<()> {
        self.get_collection(collection)
            .update_one(filter, update)
            .upsert(upsert)
            .await
            .map_err(BackendError::driver)?;

        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: Document) -> BackendResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(filter)
            .await
            .map_err(BackendError::driver)
    }

    async fn find(&self, collection: &str, filter: Document) -> BackendResult<Self::Cursor> {
        Ok(MongoDbCursor {
            cursor: self
                .get_collection(collection)
                .find(filter)
                .await
                .map_err(BackendError::driver)?,
        })
    }
}


/// A server-side MongoDB cursor.
#[derive(Debug)]
pub struct MongoDbCursor {
    cursor: MongoCursor<Document>,
}

#[async_trait]
impl StoreCursor for MongoDbCursor {
    async fn next_document(&mut self) -> BackendResult<Option<Document>> {
        self.cursor.try_next().await.map_err(BackendError::driver)
    }

    async fn close(self) -> BackendResult<()> {
        // Dropping an unexhausted cursor issues killCursors in the background.
        drop(self.cursor);

        Ok(())
    }
}
