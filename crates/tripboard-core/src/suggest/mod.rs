//! Accommodation suggestions from a generative model.
//!
//! Suggestions are plain drafts; the caller decides whether to add them to
//! the trip (as origin `ai`).

mod gemini;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SuggestionConfig;
use crate::error::Result;
use crate::models::{AccommodationDraft, ImageSource, TripDetails};

pub use gemini::GeminiSuggestionProvider;

/// Source of accommodation suggestions for given trip details
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, params: &TripDetails) -> Result<Vec<AccommodationDraft>>;
}

/// Fixed suggestions, used when no API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSuggestionProvider;

#[async_trait]
impl SuggestionProvider for MockSuggestionProvider {
    async fn suggest(&self, _params: &TripDetails) -> Result<Vec<AccommodationDraft>> {
        tracing::warn!("No suggestion API key configured; returning sample places");
        Ok(vec![
            AccommodationDraft {
                name: "Rin Rak House (sample)".to_string(),
                price: "2500".to_string(),
                link: "https://www.google.com/search?q=Rin+Rak+House+Koh+Larn".to_string(),
                location_link: "https://maps.google.com/?q=Rin+Rak+House+Koh+Larn".to_string(),
                images: vec![ImageSource::External(
                    "https://cf.bstatic.com/xdata/images/hotel/max1024x768/343438075.jpg"
                        .to_string(),
                )],
                notes: "White minimalist rooms right on the beach (sample data)".to_string(),
            },
            AccommodationDraft {
                name: "Rimtalay Resort (sample)".to_string(),
                price: "1800".to_string(),
                link: "https://www.google.com/search?q=Rimtalay+Resort".to_string(),
                location_link: "https://maps.google.com/?q=Rimtalay+Resort".to_string(),
                images: Vec::new(),
                notes: "Relaxed atmosphere, barbecue allowed (sample data)".to_string(),
            },
        ])
    }
}

/// Pick the provider for a configuration: Gemini with a key, samples without.
pub fn provider_for(config: &SuggestionConfig) -> Result<Arc<dyn SuggestionProvider>> {
    match &config.api_key {
        Some(_) => Ok(Arc::new(GeminiSuggestionProvider::new(config)?)),
        None => Ok(Arc::new(MockSuggestionProvider)),
    }
}
