//! Shared handler state.
//!
//! Constructed once in `main` and cloned into each handler; no module-level
//! singletons. The reply cache is the only cross-invocation mutable state.

use std::sync::Arc;

use crate::cache::ReplyCache;
use crate::config::Config;
use crate::fallback::FallbackGenerator;
use crate::upstream::ChatProvider;

pub struct AppState<P: ChatProvider> {
    pub cache: Arc<ReplyCache>,
    pub provider: Arc<P>,
    pub fallback: FallbackGenerator,

    /// Retry bound for buffered and streaming chat calls.
    pub chat_max_attempts: u32,

    /// Retry bound for TTS calls.
    pub tts_max_attempts: u32,
}

impl<P: ChatProvider> AppState<P> {
    pub fn new(config: &Config, provider: P) -> Self {
        Self {
            cache: Arc::new(ReplyCache::new(config.cache_capacity, config.cache_ttl)),
            provider: Arc::new(provider),
            fallback: FallbackGenerator::new(),
            chat_max_attempts: config.chat_max_attempts,
            tts_max_attempts: config.tts_max_attempts,
        }
    }

    /// Full construction for tests: explicit cache and seeded fallback.
    pub fn with_parts(
        cache: Arc<ReplyCache>,
        provider: P,
        fallback: FallbackGenerator,
        chat_max_attempts: u32,
        tts_max_attempts: u32,
    ) -> Self {
        Self {
            cache,
            provider: Arc::new(provider),
            fallback,
            chat_max_attempts,
            tts_max_attempts,
        }
    }
}

impl<P: ChatProvider> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            provider: Arc::clone(&self.provider),
            fallback: self.fallback.clone(),
            chat_max_attempts: self.chat_max_attempts,
            tts_max_attempts: self.tts_max_attempts,
        }
    }
}
