//! Document store boundary

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::PrincipalId;

/// Collection holding one profile document per principal
pub const PROFILES_COLLECTION: &str = "users";

/// Remote document store, reduced to what profile resolution and sign-up use
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read one document. `Ok(None)` when it does not exist.
    async fn get_document(
        &self,
        collection: &str,
        id: &PrincipalId,
    ) -> Result<Option<serde_json::Value>>;

    /// Create or replace one document
    async fn put_document(
        &self,
        collection: &str,
        id: &PrincipalId,
        document: serde_json::Value,
    ) -> Result<()>;
}
