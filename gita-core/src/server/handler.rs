use super::types::{Request, StreamChunk};
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub type ChunkSender = mpsc::UnboundedSender<StreamChunk>;

/// Runs generation requests against the shared session and streams the
/// response chunks back through a channel.
///
/// The session enforces single flight, so a request that arrives while
/// another is streaming is answered with an `error` chunk instead of
/// corrupting the active accumulator.
pub struct RequestHandler {
    session: Arc<Session>,
}

impl RequestHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Handles one request, sending `chunk* done` on success or a trailing
    /// `error` chunk on failure. Every outcome is reported to the client.
    pub async fn handle(&self, request: Request, sender: ChunkSender) {
        debug!(question_len = request.question.len(), "Handling generation request");

        let mut sent = 0;
        let result = self
            .session
            .ask(&request.question, |update| {
                if update.done {
                    return;
                }
                // Updates carry the full accumulator; the wire carries deltas.
                let delta = update.text[sent..].to_string();
                sent = update.text.len();
                if !delta.is_empty() {
                    let _ = sender.send(StreamChunk::chunk(delta));
                }
            })
            .await;

        match result {
            Ok(verses) => {
                let _ = sender.send(StreamChunk::done(self.session.transcript(), verses));
            }
            Err(e) => {
                let _ = sender.send(StreamChunk::error(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    async fn collect(handler: &RequestHandler, question: &str) -> Vec<StreamChunk> {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        handler
            .handle(
                Request {
                    question: question.to_string(),
                },
                sender,
            )
            .await;

        let mut chunks = Vec::new();
        while let Some(chunk) = receiver.recv().await {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_handle_streams_chunks_then_done() {
        let generator = ScriptedGenerator::single(&["Krishna: Be still.\n", "This is the answer.\n"]);
        let session = Arc::new(Session::new(Arc::new(generator)));
        let handler = RequestHandler::new(session);

        let chunks = collect(&handler, "peace").await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chunk_type, "chunk");
        assert_eq!(chunks[0].content, "Krishna: Be still.\n");
        assert_eq!(chunks[1].content, "This is the answer.\n");

        let done = &chunks[2];
        assert_eq!(done.chunk_type, "done");
        assert_eq!(done.content, "Krishna: Be still.\nThis is the answer.\n");
        let verses = done.verses.as_ref().unwrap();
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].answer, Some("This is the answer.".to_string()));
    }

    #[tokio::test]
    async fn test_handle_reports_provider_failure() {
        let generator = ScriptedGenerator::failing(&[], "upstream exploded");
        let session = Arc::new(Session::new(Arc::new(generator)));
        let handler = RequestHandler::new(session);

        let chunks = collect(&handler, "peace").await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, "error");
        assert!(chunks[0].error.as_ref().unwrap().contains("upstream exploded"));
    }
}
