// src/utils/http.rs

//! HTTP transport for the stateful exam-search form.
//!
//! The crawler only ever needs two operations: GET the search page and POST
//! a form submission back to it. Both return the response body as text; the
//! caller parses it. A configured list of user-agent strings is rotated
//! round-robin across requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Client;
use reqwest::header::USER_AGENT;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Thin client wrapper owning the user-agent rotation.
pub struct HttpClient {
    client: Client,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
}

impl HttpClient {
    /// Create a configured asynchronous HTTP client.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            user_agents: config.user_agents.clone(),
            next_agent: AtomicUsize::new(0),
        })
    }

    fn user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed);
        Some(self.user_agents[index % self.user_agents.len()].as_str())
    }

    /// GET a page and return the body text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(agent) = self.user_agent() {
            request = request.header(USER_AGENT, agent);
        }
        Ok(request.send().await?.error_for_status()?.text().await?)
    }

    /// POST a form submission and return the body text.
    pub async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String> {
        let mut request = self.client.post(url).form(fields);
        if let Some(agent) = self.user_agent() {
            request = request.header(USER_AGENT, agent);
        }
        Ok(request.send().await?.error_for_status()?.text().await?)
    }
}
