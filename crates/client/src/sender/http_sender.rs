//! HTTP sender implementation.

use std::{
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use backon::{DefaultSleeper, Sleeper};
use reqwest::{header, StatusCode};
use url::Url;

use super::{ApiRequest, ApiResponse, ApiSender, Method, TransportStats};

/// Default timeout of a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const MAX_RATE_LIMIT_RETRIES: usize = 5;

/// HTTP sender implementation.
pub struct HttpApiSender {
    client: Arc<reqwest::Client>,
    base_url: Url,
    stats: RwLock<TransportStats>,
    sleeper: DefaultSleeper,
}

impl HttpApiSender {
    /// Create an HTTP sender with the default timeout.
    pub fn new(base_url: &str) -> crate::Result<Self> {
        Self::new_with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create an HTTP sender whose requests time out after `timeout`.
    pub fn new_with_timeout(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(crate::Error::custom)?;
        Self::new_with_client(base_url, client)
    }

    /// Create an HTTP sender.
    pub fn new_with_client(base_url: &str, client: reqwest::Client) -> crate::Result<Self> {
        Ok(Self {
            client: Arc::new(client),
            base_url: normalize_base_url(base_url)?,
            stats: Default::default(),
            sleeper: DefaultSleeper::default(),
        })
    }
}

/// Make sure relative paths are joined below the base path.
fn normalize_base_url(base_url: &str) -> crate::Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

struct StatsUpdater<'a> {
    stats: &'a RwLock<TransportStats>,
    request_start_time: Instant,
    rate_limited_time: Duration,
}

impl<'a> StatsUpdater<'a> {
    fn new(stats: &'a RwLock<TransportStats>) -> Self {
        Self {
            stats,
            request_start_time: Instant::now(),
            rate_limited_time: Duration::default(),
        }
    }

    fn add_rate_limited_time(&mut self, duration: Duration) {
        self.rate_limited_time += duration;
    }
}

impl Drop for StatsUpdater<'_> {
    fn drop(&mut self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.request_count += 1;
            stats.elapsed_time += Instant::now().duration_since(self.request_start_time);
            stats.rate_limited_time += self.rate_limited_time;
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Duration {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs < 120)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_millis(500))
}

impl ApiSender for HttpApiSender {
    async fn send(&self, request: ApiRequest) -> crate::Result<ApiResponse> {
        let mut stats_updater = StatsUpdater::new(&self.stats);

        let url = self
            .base_url
            .join(request.path.trim_start_matches('/'))?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut too_many_requests_retries = MAX_RATE_LIMIT_RETRIES;
        loop {
            let mut builder = self.client.request(method.clone(), url.clone());
            if let Some(credential) = &request.credential {
                builder = builder.header(
                    header::COOKIE,
                    format!("{}={credential}", crate::ACCESS_TOKEN_COOKIE),
                );
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            tracing::trace!(%url, ?method, "sending request");
            let response = builder.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && too_many_requests_retries > 0 {
                let duration = retry_after(&response);
                too_many_requests_retries -= 1;
                tracing::debug!(
                    %url,
                    retries_left = too_many_requests_retries,
                    ?duration,
                    "too many requests, pausing"
                );
                self.sleeper.sleep(duration).await;
                stats_updater.add_rate_limited_time(duration);
                continue;
            }

            let set_cookie = response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(str::to_owned)
                .collect();
            let body = response.text().await?;

            return Ok(ApiResponse {
                status: status.as_u16(),
                body,
                set_cookie,
            });
        }
    }

    fn transport_stats(&self) -> TransportStats {
        self.stats
            .read()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() -> crate::Result<()> {
        let url = normalize_base_url("https://api.example.com/v1")?;
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
        assert_eq!(
            url.join("competitions/current")?.as_str(),
            "https://api.example.com/v1/competitions/current"
        );

        let url = normalize_base_url("https://api.example.com")?;
        assert_eq!(url.as_str(), "https://api.example.com/");
        Ok(())
    }

    #[test]
    fn sender_keeps_base_url() -> crate::Result<()> {
        let sender = HttpApiSender::new("http://localhost:8080/api")?;
        assert_eq!(sender.base_url().as_str(), "http://localhost:8080/api/");
        assert_eq!(sender.transport_stats().request_count, 0);
        Ok(())
    }
}
