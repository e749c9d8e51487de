use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{BotQuery, CommandRecord, CustomGraphData, StatsSnapshot};

pub const DEFAULT_BASE_URL: &str = "https://disstat-api.tomatenkuchen.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the DisStat API. Every request is authenticated with the API key.
#[derive(Clone)]
pub struct DisstatClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CustomDataBody<'a> {
    #[serde(rename = "customData")]
    custom_data: &'a CustomGraphData,
}

impl DisstatClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        Url::parse(base_url)?;

        let mut auth = HeaderValue::from_str(api_key).map_err(|_| Error::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bot_url(&self, bot_id: u64) -> String {
        format!("{}/bot/{bot_id}", self.base_url)
    }

    /// Posts the bot's current counts.
    pub async fn post_stats(&self, bot_id: u64, snapshot: &StatsSnapshot) -> Result<Value> {
        debug!("Posting stats for bot {bot_id}: {snapshot:?}");

        self.send(self.http.post(self.bot_url(bot_id)).json(snapshot))
            .await
    }

    /// Posts a single command invocation. Empty command names are rejected before any request is made.
    pub async fn post_command(&self, bot_id: u64, record: &CommandRecord) -> Result<Value> {
        record.validate()?;

        debug!("Posting command {} for bot {bot_id}", record.command);

        let url = format!("{}/command", self.bot_url(bot_id));
        self.send(self.http.post(url).json(record)).await
    }

    pub async fn post_custom_graph_data(
        &self,
        bot_id: u64,
        data: &CustomGraphData,
    ) -> Result<Value> {
        let url = format!("{}/custom", self.bot_url(bot_id));
        let body = CustomDataBody { custom_data: data };

        self.send(self.http.post(url).json(&body)).await
    }

    /// Reads a bot's public entry, optionally including its stats history.
    pub async fn get_bot(&self, bot_id: u64, query: &BotQuery) -> Result<Value> {
        let mut url = Url::parse(&self.bot_url(bot_id))?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());

        self.send(self.http.get(url)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        read_payload(response).await
    }
}

/// Turns a response into its JSON payload, or a [`Error::Remote`] for non-2xx statuses.
async fn read_payload(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::Remote { status, body });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "test-api-key";

    fn client(server: &MockServer) -> DisstatClient {
        DisstatClient::with_base_url(API_KEY, &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn post_stats_sends_snapshot_with_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot/1234"))
            .and(header("Authorization", API_KEY))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({
                "guild_count": 5,
                "user_count": 250,
                "shard_count": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server)
            .post_stats(1234, &StatsSnapshot::new(5, 250, 1))
            .await
            .unwrap();

        assert_eq!(payload, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn post_command_sends_record() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot/1234/command"))
            .and(body_json(json!({
                "command": "ping",
                "invoker_id": 42,
                "guild_id": 7
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server)
            .post_command(1234, &CommandRecord::new("ping", 42, Some(7)))
            .await
            .unwrap();

        assert_eq!(payload, Value::Null);
    }

    #[tokio::test]
    async fn post_command_rejects_empty_name_without_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server)
            .post_command(1234, &CommandRecord::new("", 42, None))
            .await;

        assert!(matches!(result, Err(Error::EmptyCommandName)));
    }

    #[tokio::test]
    async fn post_custom_graph_data_wraps_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot/1234/custom"))
            .and(body_json(json!({
                "customData": { "type": "Songs Played", "value1": 3 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "saved": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let data = CustomGraphData::new("Songs Played").value1(3i64);
        let payload = client(&server)
            .post_custom_graph_data(1234, &data)
            .await
            .unwrap();

        assert_eq!(payload, json!({ "saved": 1 }));
    }

    #[tokio::test]
    async fn get_bot_sends_query_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bot/1234"))
            .and(query_param("returnStats", "true"))
            .and(query_param("dataPoints", "10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "1234", "guildCount": 5 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let query = BotQuery {
            data_points: Some(10),
            ..BotQuery::with_stats()
        };
        let payload = client(&server).get_bot(1234, &query).await.unwrap();

        assert_eq!(payload["guildCount"], 5);
    }

    #[tokio::test]
    async fn non_success_status_is_remote_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot/1234"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let error = client(&server)
            .post_stats(1234, &StatsSnapshot::new(1, 1, 1))
            .await
            .unwrap_err();

        match &error {
            Error::Remote { status, body } => {
                assert_eq!(*status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
        assert!(error.is_auth_failure());
    }

    #[tokio::test]
    async fn rate_limit_is_not_auth_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let error = client(&server)
            .post_stats(1234, &StatsSnapshot::new(1, 1, 1))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Remote { status, .. } if status == StatusCode::TOO_MANY_REQUESTS));
        assert!(!error.is_auth_failure());
    }

    #[tokio::test]
    async fn non_json_body_is_kept_as_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let payload = client(&server)
            .post_stats(1234, &StatsSnapshot::new(1, 1, 1))
            .await
            .unwrap();

        assert_eq!(payload, json!("OK"));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        // Nothing listens on port 1
        let client = DisstatClient::with_base_url(API_KEY, "http://127.0.0.1:1").unwrap();

        let result = client.post_stats(1234, &StatsSnapshot::new(1, 1, 1)).await;

        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[test]
    fn default_base_url() {
        let client = DisstatClient::new(API_KEY).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = DisstatClient::with_base_url(API_KEY, "https://example.com/v1/").unwrap();
        assert_eq!(client.bot_url(9), "https://example.com/v1/bot/9");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            DisstatClient::with_base_url(API_KEY, "not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn invalid_api_key_is_rejected() {
        assert!(matches!(
            DisstatClient::with_base_url("bad\nkey", DEFAULT_BASE_URL),
            Err(Error::InvalidApiKey)
        ));
    }
}
