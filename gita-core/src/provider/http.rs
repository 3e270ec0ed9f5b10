//! HTTP client for the verse generation endpoint.
//!
//! The endpoint accepts a JSON body `{"prompt": ...}` and answers with a
//! streamed plain-text body rather than a single JSON payload. The body is
//! read chunk-by-chunk until exhausted; chunk boundaries are arbitrary and
//! may split multi-byte UTF-8 sequences, so decoding carries state across
//! reads.

use super::types::*;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

/// HTTP generation endpoint client.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    /// Full URL of the generation endpoint (e.g. "http://localhost:3000/api/generate")
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpGenerator {
    /// Creates a new client for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate<'a>(
        &'a self,
        request: GenerateRequest,
        mut callback: Box<dyn for<'b> FnMut(&'b str) + Send + 'a>,
    ) -> Result<()> {
        debug!(endpoint = %self.endpoint, "Dispatching generation request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await?;
            return Err(ProviderError::Api { status, message });
        }

        let mut stream = response.bytes_stream();
        let mut decoder = Utf8Decoder::new();

        // Sequential single-reader loop; suspends at each read until the
        // next chunk arrives.
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            if let Some(text) = decoder.push(&chunk)? {
                callback(&text);
            }
        }

        decoder.finish()?;
        debug!("Generation stream exhausted");

        Ok(())
    }
}

/// Stateful UTF-8 decoder that carries incomplete trailing sequences across
/// stream chunks.
#[derive(Debug, Default)]
struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes and returns the longest decodable prefix, if any.
    ///
    /// Bytes that form an incomplete sequence at the end of the input are
    /// held back for the next call. Invalid bytes are an error.
    fn push(&mut self, bytes: &[u8]) -> Result<Option<String>> {
        self.carry.extend_from_slice(bytes);

        let valid_up_to = match std::str::from_utf8(&self.carry) {
            Ok(_) => self.carry.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(ProviderError::Decode(e)),
        };

        if valid_up_to == 0 {
            return Ok(None);
        }

        let tail = self.carry.split_off(valid_up_to);
        let head = std::mem::replace(&mut self.carry, tail);
        let decoded = String::from_utf8(head).map_err(|e| ProviderError::Decode(e.utf8_error()))?;

        Ok(Some(decoded))
    }

    /// Signals end of stream; bytes still held back are a decode error.
    fn finish(&mut self) -> Result<()> {
        match std::str::from_utf8(&self.carry) {
            Ok(_) => Ok(()),
            Err(e) => Err(ProviderError::Decode(e)),
        }
    }
}
