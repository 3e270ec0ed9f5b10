//! Streaming session state machine.
//!
//! A session owns the accumulator for one question at a time: the growing
//! buffer of decoded text collected from the streamed response. On every
//! received chunk the full accumulator is re-scanned and the complete verse
//! record list rebuilt, so the records delivered to the caller are always a
//! pure function of the text received so far.
//!
//! # Single flight
//!
//! Exactly one generation may be in flight per session. A submission while
//! one is active is rejected with [`SessionError::Busy`] instead of racing
//! on the shared accumulator. The in-flight flag doubles as the loading
//! indicator and is released by a scope guard on every exit path, so it can
//! never be left stuck after an error.

use crate::prompt;
use crate::provider::{GenerateRequest, Generator, ProviderError};
use crate::verse::{parse_verses, VerseRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while asking a question.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a generation is already in flight")]
    Busy,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Snapshot delivered to the update callback.
///
/// One update is delivered per received chunk with `done = false`, and a
/// final one with `done = true` after the stream completes.
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    /// Full accumulated response text so far.
    pub text: String,
    /// Verse records re-derived from `text`.
    pub verses: Vec<VerseRecord>,
    /// True exactly once, on the final update.
    pub done: bool,
}

/// One question-and-answer session against a generation backend.
pub struct Session {
    generator: Arc<dyn Generator>,
    transcript: Mutex<String>,
    in_flight: AtomicBool,
}

impl Session {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            transcript: Mutex::new(String::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a generation is currently in flight.
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Full response text accumulated by the most recent question.
    pub fn transcript(&self) -> String {
        self.lock_transcript().clone()
    }

    /// Asks a question and streams the generated verses.
    ///
    /// Clears the accumulator, dispatches the templated prompt to the
    /// generation backend, and invokes `on_update` with a fresh snapshot
    /// after every received chunk. Returns the final verse record list once
    /// the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if another generation is in flight on
    /// this session, or a [`ProviderError`] if the request or stream fails.
    /// The accumulator keeps whatever text arrived before a failure.
    pub async fn ask<F>(&self, question: &str, mut on_update: F) -> Result<Vec<VerseRecord>>
    where
        F: FnMut(SessionUpdate) + Send,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        let guard = FlightGuard {
            flag: &self.in_flight,
        };

        self.lock_transcript().clear();

        let request = GenerateRequest::new(prompt::build_prompt(question));
        debug!(question_len = question.len(), "Starting generation");

        self.generator
            .generate(
                request,
                Box::new(|chunk| {
                    let mut transcript = self.lock_transcript();
                    transcript.push_str(chunk);
                    let text = transcript.clone();
                    drop(transcript);

                    on_update(SessionUpdate {
                        verses: parse_verses(&text),
                        text,
                        done: false,
                    });
                }),
            )
            .await?;

        let text = self.transcript();
        let verses = parse_verses(&text);
        debug!(verse_count = verses.len(), "Generation complete");

        // Clear the loading state before the final update so observers see
        // the session idle again by the time they render the results.
        drop(guard);

        on_update(SessionUpdate {
            text,
            verses: verses.clone(),
            done: true,
        });

        Ok(verses)
    }

    fn lock_transcript(&self) -> MutexGuard<'_, String> {
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the in-flight flag on every exit path.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn test_ask_streams_and_parses() {
        let generator = ScriptedGenerator::single(&["Krishna: Be still.\n", "This is the answer.\n"]);
        let session = Session::new(Arc::new(generator));

        let mut updates = Vec::new();
        let verses = session
            .ask("peace", |update| updates.push(update))
            .await
            .unwrap();

        // Two chunk updates plus the final done update.
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].text, "Krishna: Be still.\n");
        assert_eq!(updates[0].verses.len(), 1);
        assert_eq!(updates[0].verses[0].answer, Some(String::new()));
        assert!(!updates[0].done);
        assert!(updates[2].done);

        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].verse, "Krishna: Be still.");
        assert_eq!(verses[0].answer, Some("This is the answer.".to_string()));
    }

    #[tokio::test]
    async fn test_updates_are_pure_function_of_accumulator() {
        let generator = ScriptedGenerator::single(&["Krishna: Seek", " peace within.\nKrishna: Act."]);
        let session = Session::new(Arc::new(generator));

        session
            .ask("peace", |update| {
                assert_eq!(update.verses, parse_verses(&update.text));
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_accumulator_resets_between_questions() {
        let generator = ScriptedGenerator::new(vec![
            vec!["Krishna: First.\n"],
            vec!["Krishna: Second.\n"],
        ]);
        let session = Session::new(Arc::new(generator));

        session.ask("one", |_| {}).await.unwrap();
        assert_eq!(session.transcript(), "Krishna: First.\n");

        session.ask("two", |_| {}).await.unwrap();
        assert_eq!(session.transcript(), "Krishna: Second.\n");
    }

    #[tokio::test]
    async fn test_error_clears_loading_state() {
        let generator = ScriptedGenerator::failing(&["Krishna: partial"], "upstream exploded");
        let session = Session::new(Arc::new(generator));

        let result = session.ask("peace", |_| {}).await;

        assert!(matches!(
            result,
            Err(SessionError::Provider(ProviderError::Api { .. }))
        ));
        assert!(!session.is_generating());
        // Text received before the failure is retained for inspection.
        assert_eq!(session.transcript(), "Krishna: partial");
    }

    #[tokio::test]
    async fn test_loading_cleared_before_done_update() {
        let generator = ScriptedGenerator::single(&["Krishna: Be still.\n"]);
        let session = Arc::new(Session::new(Arc::new(generator)));

        let observed = Arc::new(StdMutex::new(Vec::new()));
        let session_ref = Arc::clone(&session);
        let observed_ref = Arc::clone(&observed);
        session
            .ask("peace", move |update| {
                observed_ref
                    .lock()
                    .unwrap()
                    .push((update.done, session_ref.is_generating()));
            })
            .await
            .unwrap();

        let observed = observed.lock().unwrap();
        assert_eq!(*observed, vec![(false, true), (true, false)]);
    }

    /// Holds the stream open until released, so a second ask can overlap.
    struct GatedGenerator {
        release: StdMutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl Generator for GatedGenerator {
        async fn generate<'a>(
            &'a self,
            _request: GenerateRequest,
            mut callback: Box<dyn for<'b> FnMut(&'b str) + Send + 'a>,
        ) -> crate::provider::Result<()> {
            callback("Krishna: waiting.\n");
            let release = self.release.lock().unwrap().take().expect("generate called twice");
            let _ = release.await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_second_ask_while_in_flight_is_rejected() {
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();
        let generator = GatedGenerator {
            release: StdMutex::new(Some(release_rx)),
        };
        let session = Arc::new(Session::new(Arc::new(generator)));

        let background = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.ask("first", |_| {}).await })
        };

        while !session.is_generating() {
            tokio::task::yield_now().await;
        }

        let error = session.ask("second", |_| {}).await.unwrap_err();
        assert!(matches!(error, SessionError::Busy));
        // The rejected submission must not disturb the active accumulator.
        assert_eq!(session.transcript(), "Krishna: waiting.\n");

        release_tx.send(()).unwrap();
        background.await.unwrap().unwrap();
        assert!(!session.is_generating());
    }
}
