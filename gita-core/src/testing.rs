//! Test doubles shared by session and server tests.

use crate::provider::{GenerateRequest, Generator, ProviderError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

struct Script {
    chunks: Vec<String>,
    error: Option<String>,
}

/// Replays scripted chunk sequences, consuming one script per call.
pub(crate) struct ScriptedGenerator {
    scripts: Mutex<VecDeque<Script>>,
}

impl ScriptedGenerator {
    /// One script per expected call.
    pub fn new(scripts: Vec<Vec<&str>>) -> Self {
        Self {
            scripts: Mutex::new(
                scripts
                    .into_iter()
                    .map(|chunks| Script {
                        chunks: chunks.into_iter().map(String::from).collect(),
                        error: None,
                    })
                    .collect(),
            ),
        }
    }

    /// A single successful call streaming the given chunks.
    pub fn single(chunks: &[&str]) -> Self {
        Self::new(vec![chunks.to_vec()])
    }

    /// A single call that streams the given chunks, then fails.
    pub fn failing(chunks: &[&str], error: &str) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::from([Script {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                error: Some(error.to_string()),
            }])),
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate<'a>(
        &'a self,
        _request: GenerateRequest,
        mut callback: Box<dyn for<'b> FnMut(&'b str) + Send + 'a>,
    ) -> Result<()> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("no script left for this call");

        for chunk in &script.chunks {
            callback(chunk);
        }

        match script.error {
            Some(message) => Err(ProviderError::Api {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                message,
            }),
            None => Ok(()),
        }
    }
}
