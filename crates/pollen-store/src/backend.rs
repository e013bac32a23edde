//! The key/value substrate seam.
//!
//! [`KeyValue`] covers exactly the primitive operations the index needs.
//! Implementations guarantee atomicity per call only; callers composing
//! several calls get no isolation between them.

use async_trait::async_trait;

use crate::error::Result;

/// Primitive key/value and set operations over physical keys.
#[async_trait]
pub trait KeyValue: Send + Sync {
    /// Read a string value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Read several string values in one round trip.
    ///
    /// The result has one entry per key, in the order of `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Write a string value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Add a member to a set, creating the set if needed.
    async fn add_member(&self, set: &str, member: &str) -> Result<()>;

    /// All members of a set. A missing set has no members.
    async fn members(&self, set: &str) -> Result<Vec<String>>;

    /// Number of members in a set, without transferring them.
    async fn member_count(&self, set: &str) -> Result<usize>;

    /// Round trip to the substrate without touching any key.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
impl<T: KeyValue + ?Sized> KeyValue for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        (**self).get_many(keys).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn add_member(&self, set: &str, member: &str) -> Result<()> {
        (**self).add_member(set, member).await
    }

    async fn members(&self, set: &str) -> Result<Vec<String>> {
        (**self).members(set).await
    }

    async fn member_count(&self, set: &str) -> Result<usize> {
        (**self).member_count(set).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}
