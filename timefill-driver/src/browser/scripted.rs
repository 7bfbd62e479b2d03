//! In-memory capability double for tests: scripts when each descriptor becomes
//! actionable and records every call in order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::capabilities::{Descriptor, ElementCapabilities, UiError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Locate { descriptor: String, timeout: Duration },
    Hover(String),
    Click(String),
    Type(String, String),
    Scroll(String),
}

#[derive(Debug, Clone, Copy)]
enum Script {
    /// Actionable from this 1-based attempt onward.
    ReadyOn(u32),
    Never,
    SessionLost,
}

#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    scripts: Mutex<HashMap<String, Script>>,
    attempts: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready_on(self, descriptor: &str, attempt: u32) -> Self {
        self.script(descriptor, Script::ReadyOn(attempt))
    }

    pub fn never(self, descriptor: &str) -> Self {
        self.script(descriptor, Script::Never)
    }

    pub fn session_lost(self, descriptor: &str) -> Self {
        self.script(descriptor, Script::SessionLost)
    }

    fn script(self, descriptor: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(descriptor.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn locate_calls(&self, descriptor: &str) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Locate {
                    descriptor: d,
                    timeout,
                } if d == descriptor => Some(timeout),
                _ => None,
            })
            .collect()
    }

    pub fn located(&self, descriptor: &str) -> bool {
        !self.locate_calls(descriptor).is_empty()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ElementCapabilities for ScriptedBrowser {
    type Handle = String;

    async fn locate(&self, descriptor: &Descriptor, timeout: Duration) -> Result<String, UiError> {
        let key = descriptor.as_str().to_string();
        self.record(Call::Locate {
            descriptor: key.clone(),
            timeout,
        });
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .unwrap_or(Script::ReadyOn(1));
        match script {
            Script::ReadyOn(ready) if attempt >= ready => Ok(key),
            Script::SessionLost => Err(UiError::Session("invalid session id".into())),
            Script::ReadyOn(_) | Script::Never => Err(UiError::Timeout {
                descriptor: descriptor.clone(),
                timeout,
            }),
        }
    }

    async fn hover(&self, handle: &String) -> Result<(), UiError> {
        self.record(Call::Hover(handle.clone()));
        Ok(())
    }

    async fn click(&self, handle: &String) -> Result<(), UiError> {
        self.record(Call::Click(handle.clone()));
        Ok(())
    }

    async fn type_text(&self, handle: &String, text: &str) -> Result<(), UiError> {
        self.record(Call::Type(handle.clone(), text.to_string()));
        Ok(())
    }

    async fn scroll_into_view(&self, handle: &String) -> Result<(), UiError> {
        self.record(Call::Scroll(handle.clone()));
        Ok(())
    }
}
