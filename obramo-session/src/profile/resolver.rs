//! ProfileResolver — one profile read per call, no retries

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::identity::PrincipalId;

use super::store::{ProfileStore, PROFILES_COLLECTION};
use super::types::{NewProfile, ProfileRecord};

/// Outcome of a successful profile read
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileLookup {
    Found(ProfileRecord),
    /// The document does not exist (sign-up never completed)
    NotFound,
}

/// Reads and writes profile documents through a [`ProfileStore`]
#[derive(Clone)]
pub struct ProfileResolver {
    store: Arc<dyn ProfileStore>,
}

impl ProfileResolver {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Fetch the profile for `id`.
    ///
    /// Store failures and undecodable documents are errors; a missing
    /// document is `Ok(ProfileLookup::NotFound)`.
    pub async fn resolve(&self, id: &PrincipalId) -> Result<ProfileLookup> {
        match self.store.get_document(PROFILES_COLLECTION, id).await? {
            Some(document) => {
                let record = ProfileRecord::from_document(id.clone(), document)?;
                debug!(principal_id = %id, role = %record.role, "Profile resolved");
                Ok(ProfileLookup::Found(record))
            }
            None => {
                debug!(principal_id = %id, "Profile not found");
                Ok(ProfileLookup::NotFound)
            }
        }
    }

    /// Sign-up write path. Never used by the session core.
    pub async fn create_profile(&self, id: &PrincipalId, profile: NewProfile) -> Result<ProfileRecord> {
        profile.validate()?;
        let record = profile.into_record(id.clone());
        self.store
            .put_document(PROFILES_COLLECTION, id, record.to_document()?)
            .await?;
        info!(principal_id = %id, role = %record.role, "Profile created");
        Ok(record)
    }
}
