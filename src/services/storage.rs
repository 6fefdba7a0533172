// src/services/storage.rs
use async_trait::async_trait;
use redis::Client;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => StoreError::Connection(err.to_string()),
            redis::ErrorKind::AuthenticationFailed => StoreError::Connection("Authentication failed".to_string()),
            _ => StoreError::Operation(err.to_string()),
        }
    }
}

/// String-keyed, string-valued persistence used by the notification store and the tracker.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

pub async fn get_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string())),
        None => Ok(None),
    }
}

pub async fn set_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.set(key, &json).await
}

// Redis-backed store
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    pub async fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(|e| StoreError::Connection(e.to_string()))?;

        let instance = Self { client };
        // Fail fast on a bad URL or unreachable server
        let mut conn = instance.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        tracing::info!("Connected to Redis at {}", redis_url);
        Ok(instance)
    }

    async fn get_connection(&self) -> Result<redis::aio::Connection, StoreError> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(data)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let _: () = redis::cmd("SET").arg(key).arg(value).query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}

// Memory store for development/testing
#[derive(Default)]
pub struct MemoryStore {
    store: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.store.read().await.contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.store.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.store.write().await.remove(key);
        Ok(())
    }
}

// Key generators for everything the tracker persists
pub struct StoreKeys;

impl StoreKeys {
    pub fn tracker() -> String {
        "booking_status_tracker".to_string()
    }

    pub fn booking_details(booking_id: i64) -> String {
        format!("booking_{}_details", booking_id)
    }

    pub fn booking_customer(booking_id: i64) -> String {
        format!("booking_{}_customerId", booking_id)
    }

    pub fn notifications(customer_id: &str) -> String {
        format!("notifications_{}", customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(StoreKeys::tracker(), "booking_status_tracker");
        assert_eq!(StoreKeys::booking_details(42), "booking_42_details");
        assert_eq!(StoreKeys::booking_customer(42), "booking_42_customerId");
        assert_eq!(StoreKeys::notifications("cust1"), "notifications_cust1");
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.delete("k").await.unwrap();
        assert!(!store.contains_key("k").await);
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::new();
        set_json(&store, "list", &vec![1, 2, 3]).await.unwrap();

        let list: Option<Vec<i32>> = get_json(&store, "list").await.unwrap();
        assert_eq!(list, Some(vec![1, 2, 3]));

        store.set("broken", "{oops").await.unwrap();
        let broken: Result<Option<Vec<i32>>, _> = get_json(&store, "broken").await;
        assert!(matches!(broken, Err(StoreError::Serialization(_))));
    }
}
