//! REST access to the board.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use campusboard_core::types::id::{CommentId, NoticeId, NotificationId};
use campusboard_entity::{Comment, Notice, Notification};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// A notification record with the notice it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNotification {
    /// The record.
    #[serde(flatten)]
    pub notification: Notification,
    /// The referenced notice, absent once deleted.
    #[serde(default)]
    pub related_notice: Option<Notice>,
}

/// One page of the caller's records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPage {
    /// Newest first.
    pub items: Vec<RemoteNotification>,
    /// Server-side unread total.
    pub unread_count: u64,
}

/// The REST calls the client views make.
#[async_trait]
pub trait BoardApi: Send + Sync + 'static {
    /// `GET /notifications?limit=N`
    async fn notifications(&self, token: &str, limit: u64) -> ClientResult<NotificationPage>;

    /// `GET /notices?department=D&limit=N`
    async fn public_notices(&self, department: &str, limit: u64) -> ClientResult<Vec<Notice>>;

    /// `PUT /notifications/{id}/read`
    async fn mark_read(&self, token: &str, id: NotificationId) -> ClientResult<()>;

    /// `PUT /notifications/read-all`
    async fn mark_all_read(&self, token: &str) -> ClientResult<()>;

    /// `DELETE /notifications/{id}`
    async fn delete_notification(&self, token: &str, id: NotificationId) -> ClientResult<()>;

    /// `GET /comments/notice/{id}`
    async fn comments(&self, notice_id: NoticeId) -> ClientResult<Vec<Comment>>;

    /// `POST /comments`
    async fn create_comment(
        &self,
        token: &str,
        notice_id: NoticeId,
        content: &str,
        parent_comment_id: Option<CommentId>,
    ) -> ClientResult<Comment>;

    /// `PUT /comments/{id}`
    async fn edit_comment(&self, token: &str, id: CommentId, content: &str)
    -> ClientResult<Comment>;

    /// `DELETE /comments/{id}`
    async fn delete_comment(&self, token: &str, id: CommentId) -> ClientResult<Comment>;
}

/// Runs a call with an upper bound on its duration.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ClientError::Timeout))
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationEnvelope {
    #[serde(default)]
    data: Vec<RemoteNotification>,
    #[serde(default)]
    unread_count: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewComment<'a> {
    notice_id: NoticeId,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_comment_id: Option<CommentId>,
}

#[derive(Serialize)]
struct EditComment<'a> {
    content: &'a str,
}

/// [`BoardApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBoardApi {
    client: Client,
    base: Url,
}

impl HttpBoardApi {
    /// Creates a client for the configured API base.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut raw = config.api_base.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn data<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let body = Self::checked(response).await?.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.data)
    }

    async fn checked(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn notifications(&self, token: &str, limit: u64) -> ClientResult<NotificationPage> {
        let mut url = self.url("notifications")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let body = Self::checked(response).await?.bytes().await?;
        let envelope: NotificationEnvelope = serde_json::from_slice(&body)?;
        debug!(count = envelope.data.len(), "Fetched notifications");
        Ok(NotificationPage {
            items: envelope.data,
            unread_count: envelope.unread_count,
        })
    }

    async fn public_notices(&self, department: &str, limit: u64) -> ClientResult<Vec<Notice>> {
        let mut url = self.url("notices")?;
        url.query_pairs_mut()
            .append_pair("department", department)
            .append_pair("limit", &limit.to_string());

        let response = self.client.get(url).send().await?;
        Self::data(response).await
    }

    async fn mark_read(&self, token: &str, id: NotificationId) -> ClientResult<()> {
        let url = self.url(&format!("notifications/{id}/read"))?;
        let response = self.client.put(url).bearer_auth(token).send().await?;
        Self::checked(response).await.map(|_| ())
    }

    async fn mark_all_read(&self, token: &str) -> ClientResult<()> {
        let url = self.url("notifications/read-all")?;
        let response = self.client.put(url).bearer_auth(token).send().await?;
        Self::checked(response).await.map(|_| ())
    }

    async fn delete_notification(&self, token: &str, id: NotificationId) -> ClientResult<()> {
        let url = self.url(&format!("notifications/{id}"))?;
        let response = self.client.delete(url).bearer_auth(token).send().await?;
        Self::checked(response).await.map(|_| ())
    }

    async fn comments(&self, notice_id: NoticeId) -> ClientResult<Vec<Comment>> {
        let url = self.url(&format!("comments/notice/{notice_id}"))?;
        let response = self.client.get(url).send().await?;
        Self::data(response).await
    }

    async fn create_comment(
        &self,
        token: &str,
        notice_id: NoticeId,
        content: &str,
        parent_comment_id: Option<CommentId>,
    ) -> ClientResult<Comment> {
        let url = self.url("comments")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&NewComment {
                notice_id,
                content,
                parent_comment_id,
            })
            .send()
            .await?;
        Self::data(response).await
    }

    async fn edit_comment(
        &self,
        token: &str,
        id: CommentId,
        content: &str,
    ) -> ClientResult<Comment> {
        let url = self.url(&format!("comments/{id}"))?;
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&EditComment { content })
            .send()
            .await?;
        Self::data(response).await
    }

    async fn delete_comment(&self, token: &str, id: CommentId) -> ClientResult<Comment> {
        let url = self.url(&format!("comments/{id}"))?;
        let response = self.client.delete(url).bearer_auth(token).send().await?;
        Self::data(response).await
    }
}
