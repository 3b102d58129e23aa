//! Mock implementations of core traits for testing.
//!
//! Shared by unit and integration tests across the workspace.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    traits::{Generation, InferenceClient, ResponseCache},
    types::{CacheEntry, Fingerprint, UploadedMedia},
    Error, Result,
};

// =============================================================================
// Mock Inference Client
// =============================================================================

/// Scripted reply for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Generation),
    Fail(String),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Ok(Generation::text(text))
    }

    pub fn fail(message: &str) -> Self {
        Reply::Fail(message.to_string())
    }

    fn into_result(self) -> Result<Generation> {
        match self {
            Reply::Ok(generation) => Ok(generation),
            Reply::Fail(message) => Err(Error::model_provider(message)),
        }
    }
}

/// Which inference operation a call used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Prompt plus inline media.
    Media,
    /// Prompt only.
    Text,
}

/// A call observed by [`ScriptedInference`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub prompt: String,
    pub mime_type: Option<String>,
}

/// Scripted inference client that records every call.
///
/// Media calls always get the media reply. Text calls consume the queued
/// replies in order; the last queued reply repeats once the queue is down
/// to one.
pub struct ScriptedInference {
    media_reply: Mutex<Reply>,
    text_replies: Mutex<VecDeque<Reply>>,
    latency: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for ScriptedInference {
    fn default() -> Self {
        Self {
            media_reply: Mutex::new(Reply::text("A mock description.")),
            text_replies: Mutex::new(VecDeque::new()),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply for every media call.
    pub fn with_media_reply(self, reply: Reply) -> Self {
        *self.media_reply.lock().unwrap() = reply;
        self
    }

    /// Queue a reply for the next text call.
    pub fn with_text_reply(self, reply: Reply) -> Self {
        self.text_replies.lock().unwrap().push_back(reply);
        self
    }

    /// Sleep this long inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn media_calls(&self) -> Vec<RecordedCall> {
        self.calls_of(CallKind::Media)
    }

    pub fn text_calls(&self) -> Vec<RecordedCall> {
        self.calls_of(CallKind::Text)
    }

    fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    fn record(&self, kind: CallKind, prompt: &str, mime_type: Option<&str>) {
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            prompt: prompt.to_string(),
            mime_type: mime_type.map(str::to_string),
        });
    }

    fn next_text_reply(&self) -> Reply {
        let mut queue = self.text_replies.lock().unwrap();
        match queue.len() {
            0 => Reply::text("FINAL ANSWER: Done"),
            1 => queue[0].clone(),
            _ => queue.pop_front().unwrap(),
        }
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    async fn generate_with_media(&self, prompt: &str, media: &UploadedMedia) -> Result<Generation> {
        self.record(CallKind::Media, prompt, Some(&media.mime_type));
        self.pause().await;
        let reply = self.media_reply.lock().unwrap().clone();
        reply.into_result()
    }

    async fn generate(&self, prompt: &str) -> Result<Generation> {
        self.record(CallKind::Text, prompt, None);
        let reply = self.next_text_reply();
        self.pause().await;
        reply.into_result()
    }
}

// =============================================================================
// Mock Response Cache
// =============================================================================

/// Unbounded map-backed cache that counts writes.
#[derive(Default)]
pub struct MockResponseCache {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    writes: Mutex<usize>,
}

impl MockResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `set` calls, including overwrites.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ResponseCache for MockResponseCache {
    async fn get(&self, key: &Fingerprint) -> Result<Option<CacheEntry>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &Fingerprint, entry: CacheEntry) -> Result<()> {
        *self.writes.lock().unwrap() += 1;
        self.entries.lock().unwrap().insert(key.clone(), entry);
        Ok(())
    }
}
