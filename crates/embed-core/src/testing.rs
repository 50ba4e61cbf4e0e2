//! Host Doubles
//!
//! In-memory markers, page hosts, status clients and timers for tests and
//! native tooling. Nothing here touches a real browser.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::AttributeSource;
use crate::error::{EmbedError, Result};
use crate::guard::{PageHost, UnloadPrompt};
use crate::mount::{IframeSpec, LoadCallback, MarkerElement, REF_ATTRIBUTE};
use crate::reference::TransactionReference;
use crate::status::StatusClient;
use crate::timer::Timer;

/// Marker element backed by a map of attributes
#[derive(Default)]
pub struct FakeMarker {
    attributes: RefCell<HashMap<String, String>>,
    mounted: RefCell<Option<IframeSpec>>,
    on_load: RefCell<Option<LoadCallback>>,
}

impl FakeMarker {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        let marker = Self::default();
        marker.attributes.borrow_mut().extend(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );
        marker
    }

    /// Address of the mounted iframe, if any
    pub fn mounted_src(&self) -> Option<String> {
        self.mounted.borrow().as_ref().map(|spec| spec.src.clone())
    }

    /// Simulate the iframe's first load event
    pub fn fire_load(&self) {
        let callback = self.on_load.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl AttributeSource for FakeMarker {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }
}

impl MarkerElement for FakeMarker {
    fn mount(&self, iframe: &IframeSpec, on_load: LoadCallback) -> Result<()> {
        *self.mounted.borrow_mut() = Some(iframe.clone());
        *self.on_load.borrow_mut() = Some(on_load);
        Ok(())
    }

    fn set_reference(&self, reference: &str) -> Result<()> {
        self.attributes
            .borrow_mut()
            .insert(REF_ATTRIBUTE.into(), reference.into());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PageLog {
    installed: usize,
    removed: usize,
    navigations: Vec<String>,
}

/// Page host that records prompt registrations and navigations
#[derive(Clone, Debug, Default)]
pub struct RecordingPage {
    log: Rc<RefCell<PageLog>>,
}

impl RecordingPage {
    pub fn installed(&self) -> usize {
        self.log.borrow().installed
    }

    pub fn removed(&self) -> usize {
        self.log.borrow().removed
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.borrow().navigations.clone()
    }

    /// Prompts currently registered
    pub fn active_prompts(&self) -> usize {
        let log = self.log.borrow();
        log.installed - log.removed
    }
}

struct RecordingPrompt {
    log: Rc<RefCell<PageLog>>,
}

impl UnloadPrompt for RecordingPrompt {
    fn install(&self, _message: &str) -> Result<()> {
        self.log.borrow_mut().installed += 1;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.log.borrow_mut().removed += 1;
        Ok(())
    }
}

impl PageHost for RecordingPage {
    fn unload_prompt(&self) -> Box<dyn UnloadPrompt> {
        Box::new(RecordingPrompt {
            log: self.log.clone(),
        })
    }

    fn navigate(&self, url: &Url) -> Result<()> {
        self.log.borrow_mut().navigations.push(url.to_string());
        Ok(())
    }
}

/// Status client replaying scripted responses; repeats the last one when exhausted
#[derive(Default)]
pub struct ScriptedStatusClient {
    responses: RefCell<VecDeque<Result<Value>>>,
    requests: RefCell<Vec<(String, String)>>,
}

impl ScriptedStatusClient {
    pub fn new(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::default(),
        }
    }

    /// `(reference, auth)` of every request made
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl StatusClient for ScriptedStatusClient {
    async fn fetch_status(&self, reference: &TransactionReference, auth: &str) -> Result<Value> {
        self.requests
            .borrow_mut()
            .push((reference.to_string(), auth.to_string()));

        let mut responses = self.responses.borrow_mut();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().map(|r| match r {
                Ok(body) => Ok(body.clone()),
                Err(e) => Err(EmbedError::Parse(e.to_string())),
            })
        };
        next.unwrap_or_else(|| Err(EmbedError::Parse("no scripted response".into())))
    }
}

/// Timer that returns immediately and counts the waits
#[derive(Debug, Default)]
pub struct ImmediateTimer {
    sleeps: Cell<u32>,
    total: Cell<Duration>,
}

impl ImmediateTimer {
    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }

    pub fn total(&self) -> Duration {
        self.total.get()
    }
}

#[async_trait(?Send)]
impl Timer for ImmediateTimer {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.total.set(self.total.get() + duration);
    }
}
