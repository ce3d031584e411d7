//! Row access against the hosted backend.

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use agentverse_core::repository::{AgentRepository, ContentRepository};
use agentverse_types::agent::{AgentId, AgentPersona, ReplyBehavior, UserId};
use agentverse_types::error::RepositoryError;
use agentverse_types::reply::{NewComment, NewThreadMessage};

use super::auth::RestAuthClient;
use super::status_error;

const AGENTS: &str = "agents";
const PROFILES: &str = "profiles";
const COMMENTS: &str = "comments";
const THREAD_MESSAGES: &str = "thread_messages";

/// Agent row as stored by the hosted backend. The owner column is `user_id`.
#[derive(Debug, Deserialize)]
struct AgentRecord {
    id: AgentId,
    name: String,
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    persona: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    max_post_length: Option<u32>,
    #[serde(default)]
    max_reply_length: Option<u32>,
    #[serde(default)]
    reply_behavior: Option<String>,
    #[serde(default)]
    reply_tone: Option<String>,
    #[serde(default)]
    posting_frequency: Option<String>,
}

impl AgentRecord {
    fn into_agent(self) -> Result<AgentPersona, RepositoryError> {
        let mut agent = AgentPersona::new(self.name, self.persona.unwrap_or_default());
        agent.id = self.id;
        agent.handle = self.handle;
        agent.owner_id = self.user_id;
        agent.max_post_length = self.max_post_length;
        agent.max_reply_length = self.max_reply_length;
        if let Some(temperature) = self.temperature {
            agent.temperature = temperature;
        }
        if let Some(behavior) = self.reply_behavior {
            agent.reply_behavior = behavior
                .parse::<ReplyBehavior>()
                .map_err(RepositoryError::Query)?;
        }
        if let Some(tone) = self.reply_tone {
            agent.reply_tone = tone;
        }
        if let Some(frequency) = self.posting_frequency {
            agent.posting_frequency = frequency;
        }
        Ok(agent)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRecord {
    id: UserId,
    #[serde(default)]
    handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    content: String,
}

/// PostgREST-style implementation of the agent and content repositories.
pub struct RestRepository {
    http: reqwest::Client,
    auth: Arc<RestAuthClient>,
}

impl RestRepository {
    pub fn new(auth: Arc<RestAuthClient>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.auth.base_url())
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", self.auth.anon_key().expose_secret())
            .bearer_auth(self.auth.bearer_token().await)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, RepositoryError> {
        let request = self
            .authorized(self.http.get(self.table_url(table)).query(params))
            .await;
        let response = request.send().await.map_err(|e| {
            tracing::warn!(table, error = %e, "hosted backend unreachable");
            RepositoryError::Connection
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(table, error = %e, "failed to read hosted backend response");
            RepositoryError::Connection
        })?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        serde_json::from_str(&body)
            .map_err(|e| RepositoryError::Query(format!("malformed {table} rows: {e}")))
    }

    async fn insert(
        &self,
        table: &str,
        row: serde_json::Value,
        prefer: &str,
    ) -> Result<String, RepositoryError> {
        let request = self
            .authorized(
                self.http
                    .post(self.table_url(table))
                    .header("Prefer", prefer)
                    .json(&row),
            )
            .await;
        let response = request.send().await.map_err(|e| {
            tracing::warn!(table, error = %e, "hosted backend unreachable");
            RepositoryError::Connection
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(body)
    }
}

impl AgentRepository for RestRepository {
    async fn list_agents(&self) -> Result<Vec<AgentPersona>, RepositoryError> {
        let records: Vec<AgentRecord> = self
            .select(
                AGENTS,
                &[
                    ("select", "*".to_string()),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        records.into_iter().map(AgentRecord::into_agent).collect()
    }

    async fn owner_handles(
        &self,
        owners: &[UserId],
    ) -> Result<HashMap<UserId, String>, RepositoryError> {
        if owners.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = owners
            .iter()
            .map(UserId::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let records: Vec<ProfileRecord> = self
            .select(
                PROFILES,
                &[
                    ("select", "id,handle".to_string()),
                    ("id", format!("in.({ids})")),
                ],
            )
            .await?;

        Ok(records
            .into_iter()
            .filter_map(|r| r.handle.map(|handle| (r.id, handle)))
            .collect())
    }

    async fn get_agent(&self, id: &AgentId) -> Result<Option<AgentPersona>, RepositoryError> {
        let records: Vec<AgentRecord> = self
            .select(
                AGENTS,
                &[("select", "*".to_string()), ("id", format!("eq.{id}"))],
            )
            .await?;
        records.into_iter().next().map(AgentRecord::into_agent).transpose()
    }

    async fn upsert_agent(&self, agent: &AgentPersona) -> Result<AgentPersona, RepositoryError> {
        let row = serde_json::json!({
            "id": agent.id,
            "name": agent.name,
            "handle": agent.handle,
            "persona": agent.persona,
            "temperature": agent.temperature,
            "user_id": agent.owner_id,
            "max_post_length": agent.max_post_length,
            "max_reply_length": agent.max_reply_length,
            "reply_behavior": agent.reply_behavior.to_string(),
            "reply_tone": agent.reply_tone,
            "posting_frequency": agent.posting_frequency,
        });
        self.insert(AGENTS, row, "resolution=merge-duplicates,return=minimal")
            .await?;
        Ok(agent.clone())
    }
}

impl ContentRepository for RestRepository {
    async fn insert_comment(&self, comment: &NewComment) -> Result<Uuid, RepositoryError> {
        let row = serde_json::to_value(comment).map_err(|e| RepositoryError::Query(e.to_string()))?;
        self.insert(COMMENTS, row, "return=minimal").await?;
        Ok(comment.id)
    }

    async fn insert_thread_message(
        &self,
        message: &NewThreadMessage,
    ) -> Result<Uuid, RepositoryError> {
        let row = serde_json::to_value(message).map_err(|e| RepositoryError::Query(e.to_string()))?;
        self.insert(THREAD_MESSAGES, row, "return=minimal").await?;
        Ok(message.id)
    }

    async fn recent_thread_messages(
        &self,
        thread_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError> {
        let records: Vec<MessageRecord> = self
            .select(
                THREAD_MESSAGES,
                &[
                    ("select", "content".to_string()),
                    ("thread_id", format!("eq.{thread_id}")),
                    ("order", "created_at.desc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(records.into_iter().rev().map(|r| r.content).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubResponse, StubServer};
    use agentverse_types::session::Session;
    use chrono::Utc;
    use secrecy::SecretString;
    use serde_json::json;

    async fn repo(server: &StubServer, token: Option<&str>) -> RestRepository {
        let auth = RestAuthClient::new(&server.base_url, SecretString::from("anon".to_string()))
            .unwrap();
        if let Some(token) = token {
            auth.set_session(Some(Session {
                access_token: token.to_string(),
                refresh_token: "r".to_string(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
                user_id: None,
            }))
            .await;
        }
        RestRepository::new(Arc::new(auth))
    }

    #[tokio::test]
    async fn list_agents_maps_rows_and_authorizes_with_session() {
        let owner = UserId::new();
        let id = AgentId::new();
        let server = StubServer::start(vec![StubResponse::json(
            200,
            json!([{
                "id": id.to_string(),
                "name": "TechBot",
                "handle": "@techbot",
                "persona": "Rust enthusiast",
                "temperature": 0.9,
                "user_id": owner.to_string(),
                "max_reply_length": 280,
                "reply_behavior": "always",
                "created_at": "2026-01-01T00:00:00Z"
            }]),
        )])
        .await;

        let agents = repo(&server, Some("session-token")).await.list_agents().await.unwrap();
        assert_eq!(agents.len(), 1);
        let agent = &agents[0];
        assert_eq!(agent.id, id);
        assert_eq!(agent.owner_id, Some(owner));
        assert_eq!(agent.reply_behavior, ReplyBehavior::Always);
        assert_eq!(agent.max_reply_length, Some(280));
        assert_eq!(agent.reply_tone, "friendly");

        let recorded = &server.requests()[0];
        assert!(recorded.request_line.starts_with("GET /rest/v1/agents?"));
        assert_eq!(recorded.header("authorization"), Some("Bearer session-token"));
        assert_eq!(recorded.header("apikey"), Some("anon"));
    }

    #[tokio::test]
    async fn owner_handles_skips_missing_handles() {
        let (a, b) = (UserId::new(), UserId::new());
        let server = StubServer::start(vec![StubResponse::json(
            200,
            json!([{"id": a.to_string(), "handle": "alice"}, {"id": b.to_string(), "handle": null}]),
        )])
        .await;
        let handles = repo(&server, None).await.owner_handles(&[a, b]).await.unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[&a], "alice");
        assert_eq!(server.requests()[0].header("authorization"), Some("Bearer anon"));
    }

    #[tokio::test]
    async fn insert_comment_posts_row() {
        let server = StubServer::start(vec![StubResponse::json(201, json!(null))]).await;
        let comment = NewComment {
            id: Uuid::now_v7(),
            post_id: Uuid::now_v7(),
            agent_id: AgentId::new(),
            content: "Interesting!".to_string(),
            created_at: Utc::now(),
        };
        let id = repo(&server, Some("t")).await.insert_comment(&comment).await.unwrap();
        assert_eq!(id, comment.id);

        let recorded = &server.requests()[0];
        assert!(recorded.request_line.starts_with("POST /rest/v1/comments "));
        assert_eq!(recorded.header("prefer"), Some("return=minimal"));
        let body = recorded.json();
        assert_eq!(body["content"], "Interesting!");
        assert_eq!(body["post_id"], comment.post_id.to_string());
    }

    #[tokio::test]
    async fn recent_messages_are_returned_oldest_first() {
        let server = StubServer::start(vec![StubResponse::json(
            200,
            json!([{"content": "newest"}, {"content": "middle"}, {"content": "oldest"}]),
        )])
        .await;
        let thread = Uuid::now_v7();
        let messages = repo(&server, None)
            .await
            .recent_thread_messages(&thread, 3)
            .await
            .unwrap();
        assert_eq!(messages, vec!["oldest", "middle", "newest"]);
        let line = &server.requests()[0].request_line;
        assert!(line.contains("limit=3"));
        assert!(line.contains(&format!("thread_id=eq.{thread}")));
    }

    #[tokio::test]
    async fn status_codes_map_to_repository_errors() {
        let server = StubServer::start(vec![
            StubResponse::json(401, json!({"message": "JWT expired"})),
            StubResponse::json(409, json!({"message": "duplicate key"})),
            StubResponse::json(500, json!({"message": "boom"})),
        ])
        .await;
        let repo = repo(&server, Some("expired")).await;
        assert!(matches!(
            repo.list_agents().await.unwrap_err(),
            RepositoryError::Unauthorized(_)
        ));
        assert!(matches!(
            repo.upsert_agent(&AgentPersona::new("A", "b")).await.unwrap_err(),
            RepositoryError::Conflict(_)
        ));
        assert!(matches!(
            repo.get_agent(&AgentId::new()).await.unwrap_err(),
            RepositoryError::Query(_)
        ));
    }
}
