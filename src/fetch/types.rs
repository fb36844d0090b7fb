// src/fetch/types.rs
use anyhow::Result;

use crate::model::Joke;

/// A remote joke provider.
///
/// `Ok(None)` means the provider answered but had nothing to give (empty body);
/// any transport or decode failure is an `Err`.
#[async_trait::async_trait]
pub trait JokeSource: Send + Sync {
    async fn fetch_joke(&self) -> Result<Option<Joke>>;
    fn name(&self) -> &'static str;
}
