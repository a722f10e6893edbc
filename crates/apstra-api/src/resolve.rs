//! Identifier resolution
//!
//! Users name resources either by canonical ID or by label. Resolution lists
//! the whole collection and takes the first item whose ID matches exactly or
//! whose label matches ignoring case. There is no index and no cache.

use apstra_core::{Error, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::client::{endpoints, ApstraClient};
use crate::types::{BlueprintSummary, Collection};

/// Items that can be looked up by ID or label
pub trait Labeled {
    fn id(&self) -> Option<&str>;
    fn label(&self) -> Option<&str>;

    /// Exact ID match or case-insensitive label match
    fn matches(&self, identifier: &str) -> bool {
        if self.id() == Some(identifier) {
            return true;
        }
        self.label()
            .map_or(false, |label| label.to_lowercase() == identifier.to_lowercase())
    }
}

impl Labeled for BlueprintSummary {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// First item in listing order matching `identifier`
pub fn find_match<'a, T: Labeled>(items: &'a [T], identifier: &str) -> Option<&'a T> {
    items.iter().find(|item| item.matches(identifier))
}

/// A resolved resource with its canonical ID
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub id: String,
    pub item: T,
    /// What the caller asked for
    pub requested: String,
}

impl<T: Labeled> Resolved<T> {
    /// Label for messages, falling back to the requested identifier
    pub fn display_name(&self) -> &str {
        self.item.label().unwrap_or(&self.requested)
    }
}

impl ApstraClient {
    /// Resolve `identifier` against the collection at `endpoint`.
    ///
    /// A malformed listing counts as "not found".
    pub async fn resolve<T>(
        &self,
        endpoint: &str,
        kind: &'static str,
        identifier: &str,
    ) -> Result<Resolved<T>>
    where
        T: DeserializeOwned + Labeled + Clone,
    {
        let listing: Collection<T> = match self.get(endpoint).await {
            Ok(listing) => listing,
            Err(Error::MalformedResponse { reason, .. }) => {
                warn!(endpoint, %reason, "Unusable listing while resolving {}", kind);
                return Err(Error::not_found(kind, identifier));
            }
            Err(e) => return Err(e),
        };

        let found = find_match(&listing.items, identifier)
            .and_then(|item| item.id().map(|id| (id.to_string(), item.clone())));

        match found {
            Some((id, item)) => {
                debug!(identifier, %id, "Resolved {}", kind);
                Ok(Resolved {
                    id,
                    item,
                    requested: identifier.to_string(),
                })
            }
            None => Err(Error::not_found(kind, identifier)),
        }
    }

    /// Resolve a blueprint by ID or label
    pub async fn resolve_blueprint(&self, identifier: &str) -> Result<Resolved<BlueprintSummary>> {
        self.resolve(endpoints::BLUEPRINTS, "Blueprint", identifier)
            .await
    }
}
