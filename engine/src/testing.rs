//! In-memory engine for exercising callers without a container runtime.

use crate::engine::ContainerEngine;
use crate::error::EngineError;
use crate::types::*;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailAt {
    Pull,
    Create,
    Start,
    Wait,
    Logs,
    Commit,
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ImageExists(String),
    Pull(String),
    Create(CreateContainerOpts),
    Start(String),
    Wait(String),
    Logs(String),
    Commit { id: String, image: String },
    Remove { id: String, force: bool },
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    /// Live container ids with their labels.
    live: BTreeMap<String, HashMap<String, String>>,
    images: HashSet<String>,
    next_id: u64,
}

pub struct FakeEngine {
    state: Mutex<State>,
    failures: HashSet<FailAt>,
    log_chunks: Vec<Vec<u8>>,
    exit_code: i64,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            failures: HashSet::new(),
            log_chunks: Vec::new(),
            exit_code: 0,
        }
    }

    /// Logs are handed back as one buffer built from these chunks.
    pub fn with_logs<I, B>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        self.log_chunks = chunks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exit_code(mut self, code: i64) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_image(self, image: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .images
            .insert(image.to_string());
        self
    }

    pub fn failing_at(mut self, point: FailAt) -> Self {
        self.failures.insert(point);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Containers created and not yet removed.
    pub fn live_containers(&self) -> Vec<String> {
        self.state.lock().unwrap().live.keys().cloned().collect()
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.state.lock().unwrap().images.contains(image)
    }

    pub fn created(&self) -> Vec<CreateContainerOpts> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(opts) => Some(opts),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn fails(&self, point: FailAt) -> bool {
        self.failures.contains(&point)
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn version(&self) -> Result<EngineVersion, EngineError> {
        Ok(EngineVersion {
            version: "fake".to_string(),
            api_version: "1.41".to_string(),
        })
    }

    async fn image_exists(&self, image: &str) -> Result<bool, EngineError> {
        self.record(Call::ImageExists(image.to_string()));
        Ok(self.has_image(image))
    }

    async fn pull_image(&self, image: &str) -> Result<(), EngineError> {
        self.record(Call::Pull(image.to_string()));
        if self.fails(FailAt::Pull) {
            return Err(EngineError::PullFailed {
                image: image.to_string(),
                reason: "manifest unknown".to_string(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .images
            .insert(image.to_string());
        Ok(())
    }

    async fn create(&self, opts: CreateContainerOpts) -> Result<String, EngineError> {
        let labels = opts.config.labels.clone();
        self.record(Call::Create(opts));
        if self.fails(FailAt::Create) {
            return Err(EngineError::CreateFailed("no such image".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("fake-{}", state.next_id);
        state.live.insert(id.clone(), labels);
        Ok(id)
    }

    async fn start(&self, id: &str) -> Result<(), EngineError> {
        self.record(Call::Start(id.to_string()));
        if self.fails(FailAt::Start) {
            return Err(EngineError::StartFailed {
                id: id.to_string(),
                reason: "exec format error".to_string(),
            });
        }
        Ok(())
    }

    async fn wait(&self, id: &str) -> Result<WaitResult, EngineError> {
        self.record(Call::Wait(id.to_string()));
        if self.fails(FailAt::Wait) {
            return Err(EngineError::WaitFailed {
                id: id.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        Ok(WaitResult {
            exit_code: self.exit_code,
            error: None,
        })
    }

    async fn logs(&self, id: &str) -> Result<Vec<u8>, EngineError> {
        self.record(Call::Logs(id.to_string()));
        if self.fails(FailAt::Logs) {
            return Err(EngineError::LogsFailed {
                id: id.to_string(),
                reason: "log driver none".to_string(),
            });
        }
        Ok(self.log_chunks.concat())
    }

    async fn commit(&self, id: &str, image: &str) -> Result<(), EngineError> {
        self.record(Call::Commit {
            id: id.to_string(),
            image: image.to_string(),
        });
        if self.fails(FailAt::Commit) {
            return Err(EngineError::CommitFailed {
                id: id.to_string(),
                image: image.to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .images
            .insert(image.to_string());
        Ok(())
    }

    async fn remove(&self, id: &str, force: bool) -> Result<(), EngineError> {
        self.record(Call::Remove {
            id: id.to_string(),
            force,
        });
        if self.fails(FailAt::Remove) {
            return Err(EngineError::RemoveFailed {
                id: id.to_string(),
                reason: "device busy".to_string(),
            });
        }
        self.state.lock().unwrap().live.remove(id);
        Ok(())
    }

    async fn list_by_label(&self, label: &str) -> Result<Vec<String>, EngineError> {
        let (key, value) = match label.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (label, None),
        };

        let state = self.state.lock().unwrap();
        Ok(state
            .live
            .iter()
            .filter(|(_, labels)| match (labels.get(key), value) {
                (Some(found), Some(wanted)) => found == wanted,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .map(|(id, _)| id.clone())
            .collect())
    }
}
