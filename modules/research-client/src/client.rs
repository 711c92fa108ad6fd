use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{classify_transport, ResearchError, TransportKind};
use crate::stream::{decode_line, extract_fenced_json, LineBuffer, StreamEvent};
use crate::types::{ResearchRequest, ResearchResult, ResearchSession, ResearchStatus};

/// Timeout for the short thread/run setup calls. The stream itself is
/// governed by the wall-clock deadline instead.
const SETUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wall-clock deadline for the whole stream. Research runs
/// legitimately take minutes.
const DEFAULT_STREAM_DEADLINE: Duration = Duration::from_secs(300);

/// Raw confidence given to a result assembled from plain text instead of
/// a structured article block.
const UNSTRUCTURED_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    thread_id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    run_id: String,
}

pub struct ResearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    stream_deadline: Duration,
}

impl ResearchClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        // No client-wide timeout: it would cut the long-lived stream.
        // Setup calls get a per-request timeout instead.
        let http = reqwest::Client::new();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            stream_deadline: DEFAULT_STREAM_DEADLINE,
        }
    }

    /// Override the stream completion deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.stream_deadline = deadline;
        self
    }

    /// Run one research task end to end and return the synthesized
    /// article.
    pub async fn research_topic(
        &self,
        request: &ResearchRequest,
    ) -> Result<ResearchResult, ResearchError> {
        request.validate()?;

        let mut session = ResearchSession::new();

        session.thread_id = self.create_thread().await?;
        debug!(thread_id = %session.thread_id, "research: thread opened");

        session.run_id = self.submit_run(&session.thread_id, request).await?;
        info!(
            thread_id = %session.thread_id,
            run_id = %session.run_id,
            depth = request.depth.as_str(),
            "research: run submitted"
        );

        session.status = ResearchStatus::Streaming;
        let result = self.consume_stream(&mut session, request).await;

        match &result {
            Ok(r) if r.partial => info!(run_id = %session.run_id, "research: partial completion"),
            Ok(_) => info!(run_id = %session.run_id, "research: completed"),
            Err(e) => warn!(run_id = %session.run_id, error = %e, "research: failed"),
        }
        result
    }

    async fn create_thread(&self) -> Result<String, ResearchError> {
        let url = format!("{}/threads", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(SETUP_TIMEOUT)
            .send()
            .await
            .map_err(|e| ResearchError::ThreadCreation {
                kind: classify_transport(&e),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResearchError::Upstream {
                code: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body: ThreadResponse = resp.json().await.map_err(|e| ResearchError::ThreadCreation {
            kind: TransportKind::Other,
            message: format!("malformed thread response: {e}"),
        })?;
        Ok(body.thread_id)
    }

    async fn submit_run(
        &self,
        thread_id: &str,
        request: &ResearchRequest,
    ) -> Result<String, ResearchError> {
        let url = format!("{}/threads/{}/runs", self.base_url, thread_id);
        let body = serde_json::json!({ "message": build_prompt(request) });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(SETUP_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ResearchError::RunSubmission {
                kind: classify_transport(&e),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResearchError::Upstream {
                code: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body: RunResponse = resp.json().await.map_err(|e| ResearchError::RunSubmission {
            kind: TransportKind::Other,
            message: format!("malformed run response: {e}"),
        })?;
        Ok(body.run_id)
    }

    /// Consume the run's event stream until `[DONE]`, stream close, or
    /// the deadline. The latest full message always replaces the running
    /// answer; the agent resends complete content on every delta.
    async fn consume_stream(
        &self,
        session: &mut ResearchSession,
        request: &ResearchRequest,
    ) -> Result<ResearchResult, ResearchError> {
        let url = format!(
            "{}/threads/{}/runs/{}/stream",
            self.base_url, session.thread_id, session.run_id
        );

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| {
                session.status = ResearchStatus::Failed;
                ResearchError::Stream(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            session.status = ResearchStatus::Failed;
            return Err(ResearchError::Upstream {
                code: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let mut body = resp.bytes_stream();
        let mut lines = LineBuffer::new();
        let mut answer: Option<String> = None;

        let deadline = tokio::time::sleep(self.stream_deadline);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    session.status = ResearchStatus::TimedOut;
                    return match answer {
                        Some(content) => {
                            Ok(assemble_result(&content, request, true))
                        }
                        None => Err(ResearchError::TimedOutEmpty),
                    };
                }
                chunk = body.next() => match chunk {
                    None => break,
                    Some(Err(e)) => {
                        session.status = ResearchStatus::Failed;
                        return Err(ResearchError::Stream(e.to_string()));
                    }
                    Some(Ok(bytes)) => {
                        let chunk_text = String::from_utf8_lossy(&bytes).into_owned();
                        for line in lines.push(&chunk_text) {
                            match decode_line(&line) {
                                StreamEvent::Message(content) => answer = Some(content),
                                StreamEvent::Error(message) => {
                                    session.status = ResearchStatus::Failed;
                                    return Err(ResearchError::Agent(message));
                                }
                                StreamEvent::Done => {
                                    return finish(session, answer, request);
                                }
                                StreamEvent::Ignored => {}
                            }
                        }
                    }
                }
            }
        }

        // Stream closed without the sentinel; the tail may still hold a
        // final complete line.
        if let Some(rest) = lines.remainder() {
            if let StreamEvent::Message(content) = decode_line(rest) {
                answer = Some(content);
            }
        }
        finish(session, answer, request)
    }
}

fn finish(
    session: &mut ResearchSession,
    answer: Option<String>,
    request: &ResearchRequest,
) -> Result<ResearchResult, ResearchError> {
    match answer {
        Some(content) if !content.trim().is_empty() => {
            session.status = ResearchStatus::Completed;
            Ok(assemble_result(&content, request, false))
        }
        _ => {
            session.status = ResearchStatus::Failed;
            Err(ResearchError::Stream(
                "stream ended without content".to_string(),
            ))
        }
    }
}

/// Build the final result: the structured article block when the agent
/// produced one, the raw text otherwise.
fn assemble_result(content: &str, request: &ResearchRequest, partial: bool) -> ResearchResult {
    if let Some(json) = extract_fenced_json(content) {
        match serde_json::from_str::<ResearchResult>(&json) {
            Ok(mut result) => {
                result.confidence = result.confidence.clamp(0.0, 1.0);
                result.partial = partial;
                return result;
            }
            Err(e) => debug!(error = %e, "research: article block failed to parse, using raw text"),
        }
    }

    ResearchResult {
        title: request.query.clone(),
        content: content.to_string(),
        summary: None,
        category_hint: None,
        confidence: UNSTRUCTURED_CONFIDENCE,
        sources: Vec::new(),
        partial,
    }
}

fn build_prompt(request: &ResearchRequest) -> String {
    let category_section = if request.category_hints.is_empty() {
        String::new()
    } else {
        format!(
            "Known categories (pick one as the category field when it fits, otherwise propose your own): {}\n\n",
            request.category_hints.join(", ")
        )
    };

    format!(
        r#"Research the following topic and write an original news article about it.

Topic: {query}

Research depth: {depth}. Consult at most {max_sources} sources and cite each one.

{category_section}Respond with the article, and include a fenced JSON block of this exact shape:

```json
{{
  "title": "...",
  "content": "...",
  "summary": "...",
  "category": "...",
  "confidence": 0.0,
  "sources": [{{"title": "...", "url": "...", "snippet": "...", "reliability": 0.0}}]
}}
```"#,
        query = request.query.trim(),
        depth = request.depth.as_str(),
        max_sources = request.max_sources,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sse_body(lines: &[&str]) -> String {
        let mut out = String::new();
        for line in lines {
            out.push_str(line);
            out.push_str("\n\n");
        }
        out
    }

    async fn mock_setup(server: &mut mockito::ServerGuard) -> (mockito::Mock, mockito::Mock) {
        let thread = server
            .mock("POST", "/threads")
            .with_status(200)
            .with_body(r#"{"thread_id": "t1"}"#)
            .create_async()
            .await;
        let run = server
            .mock("POST", "/threads/t1/runs")
            .with_status(200)
            .with_body(r#"{"run_id": "r1"}"#)
            .create_async()
            .await;
        (thread, run)
    }

    #[tokio::test]
    async fn completes_with_structured_article() {
        let mut server = mockito::Server::new_async().await;
        let (_t, _r) = mock_setup(&mut server).await;

        let article = r#"{\"title\": \"Kentsel dönüşüm hızlanıyor\", \"content\": \"Uzun gövde metni.\", \"summary\": \"Özet.\", \"category\": \"gündem\", \"confidence\": 0.9, \"sources\": [{\"title\": \"Kaynak A\", \"url\": \"https://a.example\", \"snippet\": \"alıntı\", \"reliability\": 0.8}]}"#;
        let final_message = format!(
            r#"data: {{"role":"assistant","content":"Araştırma bitti.\n```json\n{article}\n```"}}"#
        );

        let body = sse_body(&[
            r#"data: {"role":"assistant","content":"İlk taslak"}"#,
            &final_message,
            "data: [DONE]",
        ]);
        let _stream = server
            .mock("GET", "/threads/t1/runs/r1/stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let client = ResearchClient::new(&server.url(), "key");
        let request = ResearchRequest::new("kentsel dönüşüm politikaları");
        let result = client.research_topic(&request).await.unwrap();

        // The parsed JSON wins over the raw fenced text, and the last
        // message replaced the first
        assert_eq!(result.title, "Kentsel dönüşüm hızlanıyor");
        assert_eq!(result.content, "Uzun gövde metni.");
        assert_eq!(result.category_hint.as_deref(), Some("gündem"));
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].title, "Kaynak A");
        assert!(!result.partial);
    }

    #[tokio::test]
    async fn plain_text_answer_is_wrapped() {
        let mut server = mockito::Server::new_async().await;
        let (_t, _r) = mock_setup(&mut server).await;

        let body = sse_body(&[
            r#"data: {"role":"assistant","content":"Sadece düz metin."}"#,
            "data: [DONE]",
        ]);
        let _stream = server
            .mock("GET", "/threads/t1/runs/r1/stream")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = ResearchClient::new(&server.url(), "key");
        let request = ResearchRequest::new("asgari ücret görüşmeleri");
        let result = client.research_topic(&request).await.unwrap();

        assert_eq!(result.content, "Sadece düz metin.");
        assert_eq!(result.title, "asgari ücret görüşmeleri");
        assert_eq!(result.confidence, UNSTRUCTURED_CONFIDENCE);
    }

    #[tokio::test]
    async fn error_event_rejects_the_operation() {
        let mut server = mockito::Server::new_async().await;
        let (_t, _r) = mock_setup(&mut server).await;

        let body = sse_body(&[r#"data: {"error": "model overloaded"}"#]);
        let _stream = server
            .mock("GET", "/threads/t1/runs/r1/stream")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = ResearchClient::new(&server.url(), "key");
        let request = ResearchRequest::new("enflasyon verileri");
        let err = client.research_topic(&request).await.unwrap_err();
        assert!(matches!(err, ResearchError::Agent(m) if m == "model overloaded"));
    }

    #[tokio::test]
    async fn invalid_query_fails_before_any_network_call() {
        let mut server = mockito::Server::new_async().await;
        let thread = server.mock("POST", "/threads").expect(0).create_async().await;

        let client = ResearchClient::new(&server.url(), "key");
        let err = client
            .research_topic(&ResearchRequest::new("ab"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResearchError::Validation(_)));
        thread.assert_async().await;
    }

    #[tokio::test]
    async fn timeout_with_partial_content_is_a_partial_success() {
        let mut server = mockito::Server::new_async().await;
        let (_t, _r) = mock_setup(&mut server).await;

        let _stream = server
            .mock("GET", "/threads/t1/runs/r1/stream")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(
                    "data: {\"role\":\"assistant\",\"content\":\"Yarım kalan cevap\"}\n\n".as_bytes(),
                )?;
                w.flush()?;
                // Keep the stream open well past the client deadline
                std::thread::sleep(std::time::Duration::from_millis(1500));
                w.write_all(b"data: [DONE]\n\n")
            })
            .create_async()
            .await;

        let client = ResearchClient::new(&server.url(), "key")
            .with_deadline(Duration::from_millis(400));
        let request = ResearchRequest::new("deprem bölgesinde konut üretimi");
        let result = client.research_topic(&request).await.unwrap();

        assert!(result.partial);
        assert_eq!(result.content, "Yarım kalan cevap");
    }

    #[tokio::test]
    async fn timeout_with_nothing_captured_is_a_hard_failure() {
        let mut server = mockito::Server::new_async().await;
        let (_t, _r) = mock_setup(&mut server).await;

        let _stream = server
            .mock("GET", "/threads/t1/runs/r1/stream")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_millis(1500));
                w.write_all(b"data: [DONE]\n\n")
            })
            .create_async()
            .await;

        let client = ResearchClient::new(&server.url(), "key")
            .with_deadline(Duration::from_millis(300));
        let request = ResearchRequest::new("yerel seçim anketleri");
        let err = client.research_topic(&request).await.unwrap_err();
        assert!(matches!(err, ResearchError::TimedOutEmpty));
    }

    #[tokio::test]
    async fn thread_creation_http_error_is_terminal() {
        let mut server = mockito::Server::new_async().await;
        let _thread = server
            .mock("POST", "/threads")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ResearchClient::new(&server.url(), "key");
        let err = client
            .research_topic(&ResearchRequest::new("uzay programı bütçesi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResearchError::Upstream { code: 500, .. }));
    }
}
