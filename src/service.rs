//! Business rules for creating, resolving, updating and deleting mappings.
//!
//! The service holds no locks and no cache. Short code uniqueness comes
//! entirely from the store's atomic insert: candidates are generated blind and
//! a clash simply means another attempt with a fresh code.
//!
//! Duplicate URLs are caught with a lookup before inserting. That check is not
//! atomic, so two concurrent creates for the same new URL can both succeed and
//! leave two mappings for it. This is accepted; later creates see the oldest
//! one as the existing mapping.

use crate::{
    generator::{is_well_formed, CodeGenerator},
    models::Mapping,
    recorder::AccessRecorder,
    storage::{Storage, StorageError},
    validate::{validate_url, UrlError},
};
use chrono::Utc;
use std::sync::Arc;

/// How many fresh codes `create` tries before giving up.
pub const MAX_CREATE_ATTEMPTS: usize = 5;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid URL provided. Must be a valid http or https link ({0})")]
    InvalidInput(#[from] UrlError),

    #[error("Short code not found")]
    NotFound,

    /// The URL is already shortened; carries the mapping that owns it.
    #[error("URL already shortened as '{}'", .0.short_code)]
    Conflict(Box<Mapping>),

    #[error("failed to generate a unique short code after {0} attempts")]
    ExhaustedRetries(usize),

    #[error(transparent)]
    StorageFailure(#[from] StorageError),
}

#[derive(Clone)]
pub struct MappingService {
    store: Arc<dyn Storage>,
    generator: Arc<dyn CodeGenerator>,
    recorder: AccessRecorder,
}

impl MappingService {
    pub fn new(
        store: Arc<dyn Storage>,
        generator: Arc<dyn CodeGenerator>,
        recorder: AccessRecorder,
    ) -> Self {
        Self {
            store,
            generator,
            recorder,
        }
    }

    /// Shorten `url`.
    ///
    /// Returns [`ServiceError::Conflict`] with the existing mapping if the URL
    /// was shortened before.
    pub async fn create(&self, url: &str) -> Result<Mapping> {
        validate_url(url)?;

        if let Some(existing) = self.store.find_by_url(url).await? {
            tracing::debug!("'{}' is already shortened as '{}'", url, existing.short_code);
            return Err(ServiceError::Conflict(Box::new(existing)));
        }

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let candidate = Mapping::new(url, self.generator.generate(), Utc::now());

            match self.store.insert(candidate).await {
                Ok(mapping) => {
                    tracing::info!("Created short code '{}' for {}", mapping.short_code, url);
                    return Ok(mapping);
                }
                Err(StorageError::CodeTaken(code)) => {
                    tracing::debug!(
                        "Short code '{}' collided (attempt {}/{})",
                        code,
                        attempt,
                        MAX_CREATE_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            "Gave up shortening {} after {} colliding codes",
            url,
            MAX_CREATE_ATTEMPTS
        );
        Err(ServiceError::ExhaustedRetries(MAX_CREATE_ATTEMPTS))
    }

    pub async fn get(&self, code: &str) -> Result<Mapping> {
        // Nothing malformed is ever stored, so skip the round trip.
        if !is_well_formed(code) {
            return Err(ServiceError::NotFound);
        }

        self.store
            .find_by_code(code)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Point `code` at a new destination. The short code itself never changes.
    pub async fn update(&self, code: &str, url: &str) -> Result<Mapping> {
        validate_url(url)?;

        let requested_at = Utc::now();
        let mut mapping = self
            .store
            .update_url(code, url)
            .await?
            .ok_or(ServiceError::NotFound)?;

        // The store may hand back the pre-write snapshot.
        mapping.url = url.to_owned();
        if mapping.updated_at < requested_at {
            mapping.updated_at = requested_at;
        }

        tracing::info!("Updated short code '{}' to {}", code, url);
        Ok(mapping)
    }

    pub async fn delete(&self, code: &str) -> Result<()> {
        if self.store.delete_by_code(code).await? {
            tracing::info!("Deleted short code '{}'", code);
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    /// Same lookup as [`get`](Self::get). The access count may not yet include
    /// redirects whose increment is still queued.
    pub async fn stats(&self, code: &str) -> Result<Mapping> {
        self.get(code).await
    }

    /// Resolve `code` to its destination and queue an access-count increment.
    /// The increment's outcome never affects the result.
    pub async fn redirect(&self, code: &str) -> Result<String> {
        let mapping = self.get(code).await?;
        self.recorder.record(&mapping.short_code);
        Ok(mapping.url)
    }
}
