//! MongoDB backend
//!
//! The driver's client owns a connection pool; each operation checks a
//! connection out for its duration only. Server selection and connect timeouts
//! are both set from the configured store timeout.

use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::warn;

use crate::config::StoreConfig;
use crate::{Error, Result};

pub(super) struct MongoBackend {
    client: Client,
    database: String,
}

impl MongoBackend {
    pub(super) async fn connect(config: &StoreConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri).await.map_err(classify)?;
        options.server_selection_timeout = Some(config.timeout);
        options.connect_timeout = Some(config.timeout);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).map_err(classify)?;
        Ok(Self {
            client,
            database: config.database.clone(),
        })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.database).collection(name)
    }

    pub(super) async fn insert(&self, collection: &str, doc: Document) -> Result<()> {
        self.collection(collection)
            .insert_one(doc, None)
            .await
            .map_err(classify)?;
        Ok(())
    }

    pub(super) async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(None, None)
            .await
            .map_err(classify)?;
        cursor.try_collect().await.map_err(classify)
    }

    pub(super) async fn find_one(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>> {
        self.collection(collection)
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(classify)
    }

    /// `$set` merge; true when a document matched
    pub(super) async fn update(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Document,
    ) -> Result<bool> {
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields }, None)
            .await
            .map_err(classify)?;
        Ok(result.matched_count > 0)
    }

    pub(super) async fn delete(&self, collection: &str, id: ObjectId) -> Result<bool> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(classify)?;
        Ok(result.deleted_count > 0)
    }
}

fn classify(err: mongodb::error::Error) -> Error {
    match &*err.kind {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => {
            warn!("MongoDB unreachable: {}", err);
            Error::StorageUnavailable(err.to_string())
        }
        ErrorKind::InvalidArgument { .. } => Error::Config(err.to_string()),
        _ => {
            warn!("MongoDB rejected operation: {}", err);
            Error::Storage(err.to_string())
        }
    }
}
