use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::translate::{TranslateError, TranslateRequest, Translation, Translator};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    target: String,
    source: String,
    text: String,
}

impl CacheKey {
    fn new(target: &str, source: &str, text: &str) -> Self {
        Self {
            target: target.to_string(),
            source: source.to_string(),
            text: text.to_string(),
        }
    }

    fn from_request(request: &TranslateRequest) -> Self {
        Self::new(&request.target_lang, &request.source_lang, &request.text)
    }
}

/// Small LRU over translated responses, keyed by (target, source, text).
///
/// A hit refreshes recency; inserting past capacity evicts the least
/// recently used entry.
#[derive(Debug)]
pub struct TranslationCache {
    capacity: usize,
    entries: HashMap<CacheKey, (String, u64)>,
    recency: BTreeMap<u64, CacheKey>,
    clock: u64,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &CacheKey) -> u64 {
        self.clock += 1;
        self.recency.insert(self.clock, key.clone());
        self.clock
    }

    /// Recalls a response and refreshes its recency.
    pub fn get(&mut self, target: &str, source: &str, text: &str) -> Option<String> {
        let key = CacheKey::new(target, source, text);
        let (value, stamp) = self.entries.get(&key)?.clone();
        self.recency.remove(&stamp);
        let fresh = self.touch(&key);
        self.entries.insert(key, (value.clone(), fresh));
        Some(value)
    }

    /// Stores a response, evicting the least recently used entries past
    /// capacity.
    pub fn insert(&mut self, target: &str, source: &str, text: &str, value: String) {
        let key = CacheKey::new(target, source, text);
        if let Some((_, stamp)) = self.entries.remove(&key) {
            self.recency.remove(&stamp);
        }
        let stamp = self.touch(&key);
        self.entries.insert(key, (value, stamp));
        while self.entries.len() > self.capacity {
            let Some((&oldest, _)) = self.recency.iter().next() else {
                break;
            };
            if let Some(key) = self.recency.remove(&oldest) {
                self.entries.remove(&key);
            }
        }
    }

    /// Recall without refreshing recency.
    pub fn peek(&self, target: &str, source: &str, text: &str) -> Option<&str> {
        let key = CacheKey::new(target, source, text);
        self.entries.get(&key).map(|(value, _)| value.as_str())
    }
}

/// Wraps any [`Translator`] with the LRU response cache. Only successful
/// responses are cached; failures always fall through to the backend again.
pub struct CachingTranslator<T> {
    inner: T,
    cache: Mutex<TranslationCache>,
}

impl<T> CachingTranslator<T> {
    pub fn new(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(TranslationCache::new(capacity)),
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl<T: Translator> Translator for CachingTranslator<T> {
    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, TranslateError> {
        let key = CacheKey::from_request(request);
        let hit = self
            .cache
            .lock()
            .unwrap()
            .get(&key.target, &key.source, &key.text);
        if let Some(hit) = hit {
            return Ok(Translation {
                translated_text: hit,
                cached: true,
            });
        }
        let translation = self.inner.translate(request).await?;
        self.cache.lock().unwrap().insert(
            &key.target,
            &key.source,
            &key.text,
            translation.translated_text.clone(),
        );
        Ok(translation)
    }
}
