//! MongoDB connection management

pub mod users;

pub use users::{MongoUserStore, StoreError, UserDocument, UserStore};

use mongodb::{bson::doc, options::ClientOptions, Client, Collection};
use std::time::Duration;

/// Upper bound for connecting and answering the startup ping
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared MongoDB handle bound to one database and collection
#[derive(Clone)]
pub struct Database {
    client: Client,
    database: String,
    collection: String,
}

impl Database {
    /// Connect and ping the server, failing if either step exceeds
    /// [`CONNECT_TIMEOUT`]
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        Self::connect_within(uri, database, collection, CONNECT_TIMEOUT).await
    }

    async fn connect_within(
        uri: &str,
        database: &str,
        collection: &str,
        deadline: Duration,
    ) -> Result<Self, StoreError> {
        let client = tokio::time::timeout(deadline, Self::establish(uri))
            .await
            .map_err(|_| StoreError::Timeout(deadline))??;

        Ok(Self {
            client,
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }

    async fn establish(uri: &str) -> Result<Client, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        // Timeouts given in the URI take precedence
        options.connect_timeout.get_or_insert(CONNECT_TIMEOUT);
        options.server_selection_timeout.get_or_insert(CONNECT_TIMEOUT);

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;

        Ok(client)
    }

    /// The users collection on the shared client
    pub fn users(&self) -> Collection<UserDocument> {
        self.client
            .database(&self.database)
            .collection::<UserDocument>(&self.collection)
    }

    /// Close all pooled connections
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::info!("MongoDB connection closed");
    }
}
