//! Terminal chat client for the HTTP API.
//!
//! History lives only in the client session; the server is stateless.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot connect to the backend: {0}")]
    Connection(String),
    #[error("backend returned HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("invalid response received from backend: {0}")]
    InvalidResponse(String),
    #[error("no answer returned from the chatbot")]
    EmptyAnswer,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Connection(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Online,
    Offline,
}

pub struct ChatClient {
    base_url: String,
    client: Client,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Any HTTP response within three seconds counts as online.
    pub async fn status(&self) -> BackendStatus {
        match self
            .client
            .get(format!("{}/", self.base_url))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
        {
            Ok(_) => BackendStatus::Online,
            Err(err) => {
                tracing::debug!("Status check failed: {}", err);
                BackendStatus::Offline
            }
        }
    }

    pub async fn ask(&self, question: &str) -> Result<String, ClientError> {
        let res = self
            .client
            .post(format!("{}/medicalchatbot", self.base_url))
            .json(&json!({ "question": question }))
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ClientError::Http { status, body });
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|err| ClientError::InvalidResponse(err.to_string()))?;
        match payload.get("answer").and_then(Value::as_str) {
            Some(answer) if !answer.trim().is_empty() => Ok(answer.to_string()),
            _ => Err(ClientError::EmptyAnswer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Ask(&'a str),
    Blank,
    Clear,
    History,
    Quit,
}

pub fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Blank,
        "/clear" => Command::Clear,
        "/history" => Command::History,
        "/quit" | "/exit" => Command::Quit,
        question => Command::Ask(question),
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<Exchange>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Asks and records the exchange; failed questions are not kept.
    pub async fn ask(&mut self, client: &ChatClient, question: &str) -> Result<&Exchange, ClientError> {
        let answer = client.ask(question).await?;
        self.history.push(Exchange {
            question: question.to_string(),
            answer,
        });
        let index = self.history.len() - 1;
        Ok(&self.history[index])
    }

    pub fn render_history(&self) -> String {
        if self.history.is_empty() {
            return "(no messages yet)".to_string();
        }
        self.history
            .iter()
            .map(|exchange| format!("You: {}\nMedibot: {}", exchange.question, exchange.answer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Interactive loop over stdin until `/quit` or end of input.
pub async fn run_chat(client: &ChatClient) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let status = match client.status().await {
        BackendStatus::Online => "online",
        BackendStatus::Offline => "offline",
    };
    stdout
        .write_all(
            format!(
                "AI Medical Chatbot ({} is {})\nType a question, /history, /clear or /quit.\n",
                client.base_url(),
                status
            )
            .as_bytes(),
        )
        .await?;

    let mut session = ChatSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match parse_command(&line) {
            Command::Quit => break,
            Command::Blank => "Please enter a valid medical question.".to_string(),
            Command::Clear => {
                session.clear();
                "Chat cleared.".to_string()
            }
            Command::History => session.render_history(),
            Command::Ask(question) => match session.ask(client, question).await {
                Ok(exchange) => format!("Medibot: {}", exchange.answer),
                Err(err) => format!("Error: {}", err),
            },
        };
        stdout.write_all(format!("{}\n", output).as_bytes()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn commands_are_recognised() {
        assert_eq!(parse_command("  "), Command::Blank);
        assert_eq!(parse_command("/clear"), Command::Clear);
        assert_eq!(parse_command("/history\n"), Command::History);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command(" What is flu? "), Command::Ask("What is flu?"));
    }

    #[tokio::test]
    async fn ask_posts_question_and_reads_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/medicalchatbot"))
            .and(body_json(json!({ "question": "What is flu?" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "answer": "A viral infection." })),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(&format!("{}/", server.uri()));
        let mut session = ChatSession::new();
        let exchange = session.ask(&client, "What is flu?").await.unwrap().clone();

        assert_eq!(exchange.answer, "A viral infection.");
        assert_eq!(session.history().len(), 1);
        assert!(session.render_history().contains("Medibot: A viral infection."));

        session.clear();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn error_kinds_are_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/medicalchatbot"))
            .and(body_json(json!({ "question": "500" })))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/medicalchatbot"))
            .and(body_json(json!({ "question": "html" })))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/medicalchatbot"))
            .and(body_json(json!({ "question": "empty" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "" })))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri());
        assert!(matches!(
            client.ask("500").await,
            Err(ClientError::Http { status, .. }) if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(matches!(
            client.ask("html").await,
            Err(ClientError::InvalidResponse(_))
        ));
        assert!(matches!(client.ask("empty").await, Err(ClientError::EmptyAnswer)));
    }

    #[tokio::test]
    async fn failed_question_is_not_recorded() {
        let client = ChatClient::new("http://127.0.0.1:1");
        let mut session = ChatSession::new();
        let err = session.ask(&client, "What is flu?").await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn status_reports_online_and_offline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert_eq!(ChatClient::new(&server.uri()).status().await, BackendStatus::Online);
        assert_eq!(
            ChatClient::new("http://127.0.0.1:1").status().await,
            BackendStatus::Offline
        );
    }
}
