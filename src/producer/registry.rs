//! Producer registry keyed by site id

use super::{
    ComicControl, ComicEasel, ComicNav, HeadlineStrip, LightboxGallery, MultiImage,
    PageProducer, PictureStrip,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Page producers by site id
#[derive(Clone, Default)]
pub struct ProducerRegistry {
    producers: BTreeMap<String, Arc<dyn PageProducer>>,
}

impl ProducerRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in site rule
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LightboxGallery));
        registry.register(Arc::new(ComicEasel));
        registry.register(Arc::new(ComicNav));
        registry.register(Arc::new(ComicControl));
        registry.register(Arc::new(MultiImage));
        registry.register(Arc::new(PictureStrip));
        registry.register(Arc::new(HeadlineStrip));
        registry
    }

    /// Registers a producer under its site id, replacing any earlier one
    pub fn register(&mut self, producer: Arc<dyn PageProducer>) {
        let site = producer.site().to_string();
        if self.producers.insert(site.clone(), producer).is_some() {
            tracing::debug!("Replaced producer for site '{}'", site);
        }
    }

    pub fn get(&self, site: &str) -> Option<Arc<dyn PageProducer>> {
        self.producers.get(site).cloned()
    }

    /// Registered site ids in sorted order
    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.producers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ProducerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerRegistry")
            .field("sites", &self.sites().collect::<Vec<_>>())
            .finish()
    }
}
