//! HAL+JSON REST facade for the remote Address Manager server (C3).
//!
//! `BamClient` is the sole network boundary the rest of the pipeline talks
//! to: resolver, planner, and handlers all go through its capability
//! methods rather than building requests themselves.

pub mod auth;
pub mod config;
pub mod containment;
pub mod filter;
pub mod identity;
pub mod pagination;
pub mod safety;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use bam_errors::{BamError, BamResult};
use bam_model::ObjectType;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::time::sleep;
use tracing::warn;

use auth::AuthGate;
use config::ClientConfig;
use filter::Filter;
use pagination::{parse_page, PageLimits, PaginationGuard};

const MAX_TRANSIENT_RETRIES: u32 = 3;
const MAX_RATE_LIMIT_RETRIES: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

pub struct BamClient {
    http: reqwest::Client,
    config: ClientConfig,
    auth: Arc<AuthGate>,
}

impl BamClient {
    pub fn new(config: ClientConfig) -> BamResult<Self> {
        let http = transport::build_http_client(
            config.max_keepalive,
            config.request_timeout,
            config.verify_ssl,
        )?;
        Ok(Self {
            http,
            config,
            auth: Arc::new(AuthGate::new()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            path.trim_start_matches('/')
        )
    }

    /// Sends one logical request, applying the full retry policy: up to
    /// `MAX_TRANSIENT_RETRIES` exponential-backoff retries on transient
    /// network failures, up to `MAX_RATE_LIMIT_RETRIES` `Retry-After`
    /// waits on 429, and at most one forced re-authentication on 401.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
    ) -> BamResult<reqwest::Response> {
        let url = match query {
            Some(query) if !query.is_empty() => format!("{}?{query}", self.endpoint(path)),
            _ => self.endpoint(path),
        };

        let mut transient_attempts = 0u32;
        let mut rate_limit_attempts = 0u32;
        let mut reauthenticated = false;

        loop {
            let creds = self.auth.ensure(&self.http, &self.config).await?;

            let mut builder = self
                .http
                .request(method.clone(), &url)
                .header("Authorization", format!("Basic {}", creds.basic_cred.expose()))
                .header("X-BAM-Session-Token", creds.token.expose());
            if let Some(body) = body {
                builder = builder.json(body);
            }
            let request = builder.build().map_err(|err| BamError::Fatal {
                row_id: String::new(),
                message: format!("failed to build request: {err}"),
            })?;

            let response = transport::send(&self.http, request, self.config.request_timeout).await;

            let response = match response {
                Ok(response) => response,
                Err(_) if transient_attempts < MAX_TRANSIENT_RETRIES => {
                    transient_attempts += 1;
                    let delay = bam_util::math::exponential_backoff(BACKOFF_BASE, transient_attempts - 1, BACKOFF_CAP);
                    warn!(attempt = transient_attempts, ?delay, "retrying after transient network error");
                    sleep(delay).await;
                    continue;
                }
                Err(err) => {
                    return Err(BamError::TransientNetwork {
                        attempts: transient_attempts + 1,
                        message: err.to_string(),
                    })
                }
            };

            match response.status() {
                StatusCode::UNAUTHORIZED => {
                    if reauthenticated {
                        return Err(BamError::AuthExpired {
                            message: "two consecutive 401 responses; credentials are invalid".to_string(),
                        });
                    }
                    reauthenticated = true;
                    self.auth.force_reauthenticate(&self.http, &self.config).await?;
                    continue;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if rate_limit_attempts >= MAX_RATE_LIMIT_RETRIES {
                        return Err(BamError::RateLimited {
                            attempts: rate_limit_attempts,
                            retry_after: DEFAULT_RETRY_AFTER,
                        });
                    }
                    rate_limit_attempts += 1;
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|value| value.to_str().ok())
                        .and_then(|value| value.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(DEFAULT_RETRY_AFTER);
                    warn!(attempt = rate_limit_attempts, ?retry_after, "rate limited, waiting before retry");
                    sleep(retry_after).await;
                    continue;
                }
                _ => return Ok(response),
            }
        }
    }

    /// `create(collection, payload) -> entity`.
    pub async fn create(&self, collection: &str, payload: &Value) -> BamResult<Value> {
        let response = self.request(Method::POST, collection, None, Some(payload)).await?;
        self.decode_entity_response(response, "create").await
    }

    /// `patch(collection, id, payload) -> entity`.
    pub async fn patch(&self, collection: &str, id: i64, payload: &Value) -> BamResult<Value> {
        let path = format!("{collection}/{id}");
        let response = self.request(Method::PATCH, &path, None, Some(payload)).await?;
        self.decode_entity_response(response, "update").await
    }

    /// `delete(collection, id, dangerous)`. Callers must pass `object_type`
    /// so the safety gate can refuse a protected-kind delete up front.
    pub async fn delete(&self, row_id: &str, collection: &str, id: i64, object_type: ObjectType) -> BamResult<()> {
        safety::guard_dangerous_delete(row_id, object_type, self.config.allow_dangerous_operations)?;
        let path = format!("{collection}/{id}");
        let response = self.request(Method::DELETE, &path, None, None).await?;
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(BamError::UpstreamFailure {
            row_id: row_id.to_string(),
            predecessor_row_id: String::new(),
        })
    }

    /// `get-by-id(collection, id)`.
    pub async fn get_by_id(&self, collection: &str, id: i64) -> BamResult<Option<Value>> {
        let path = format!("{collection}/{id}");
        let response = self.request(Method::GET, &path, None, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.decode_entity_response(response, "get-by-id").await.map(Some)
    }

    /// `paginated list(endpoint, filter, fields, orderBy, limit)`, following
    /// `_links.next` until exhausted, capped, or a self-reference is
    /// detected.
    pub async fn list(
        &self,
        collection: &str,
        filters: &[Filter],
        limits: PageLimits,
    ) -> BamResult<Vec<Value>> {
        let mut items = Vec::new();
        let mut guard = PaginationGuard::new();
        let mut pages = 0usize;
        let query = if filters.is_empty() {
            String::new()
        } else {
            format!("filter={}", filter::build_filter_string(filters))
        };

        guard.visit(collection, &query)?;
        let mut next_path = Some((collection.to_string(), query));

        while let Some((path, query)) = next_path {
            let response = self.request(Method::GET, &path, Some(&query), None).await?;
            let body: Value = response.json().await.map_err(|err| BamError::Fatal {
                row_id: String::new(),
                message: format!("malformed list response from {path}: {err}"),
            })?;
            let page = parse_page(&body, collection);
            items.extend(page.items);
            pages += 1;

            if pagination::should_stop(items.len(), pages, &limits) {
                break;
            }

            next_path = match page.next {
                Some(href) => {
                    let (next_path, next_query) = split_href(&href);
                    guard.visit(&next_path, &next_query)?;
                    Some((next_path, next_query))
                }
                None => None,
            };
        }

        Ok(items)
    }

    /// `get_zone_by_fqdn(view, fqdn)`: absolute-name match, then name
    /// match, then a reversed label-walk via `sub_zones`.
    pub async fn get_zone_by_fqdn(&self, view_id: i64, fqdn: &str) -> BamResult<Option<Value>> {
        let by_absolute = self
            .list(
                "zones",
                &[Filter::eq("absoluteName", filter::FilterValue::Str(fqdn.to_string()))],
                PageLimits { max_items: Some(1), max_pages: Some(1) },
            )
            .await?;
        if let Some(zone) = by_absolute.into_iter().next() {
            return Ok(Some(zone));
        }

        let labels = identity::reversed_labels(fqdn);
        let Some((tld, rest)) = labels.split_first() else {
            return Ok(None);
        };

        let mut current = self
            .list(
                "zones",
                &[
                    Filter::eq("name", filter::FilterValue::Str((*tld).to_string())),
                    Filter::eq("viewId", filter::FilterValue::Number(view_id)),
                ],
                PageLimits { max_items: Some(1), max_pages: Some(1) },
            )
            .await?
            .into_iter()
            .next();

        for label in rest {
            let Some(parent) = current else { return Ok(None) };
            let Some(parent_id) = parent.get("id").and_then(Value::as_i64) else {
                return Ok(None);
            };
            let sub_zones = self
                .list(
                    &format!("zones/{parent_id}/sub_zones"),
                    &[Filter::eq("name", filter::FilterValue::Str((*label).to_string()))],
                    PageLimits { max_items: Some(1), max_pages: Some(1) },
                )
                .await?;
            current = sub_zones.into_iter().next();
        }

        Ok(current)
    }

    /// `find-containing(block/network, address-or-cidr)`: the longest
    /// prefix among candidates returned by `range:contains(addr)`.
    pub async fn find_containing(
        &self,
        collection: &str,
        address: std::net::IpAddr,
    ) -> BamResult<Option<i64>> {
        let candidates_raw = self
            .list(
                collection,
                &[Filter::op(
                    "range",
                    filter::FilterOp::Contains,
                    filter::FilterValue::Str(address.to_string()),
                )],
                PageLimits::default(),
            )
            .await?;

        let candidates: Vec<containment::CidrCandidate> = candidates_raw
            .iter()
            .filter_map(|entity| {
                let resource_id = entity.get("id")?.as_i64()?;
                let cidr = entity.get("range").or_else(|| entity.get("cidr"))?.as_str()?.to_string();
                Some(containment::CidrCandidate { resource_id, cidr })
            })
            .collect();

        Ok(containment::longest_prefix_match(&candidates, address))
    }

    async fn decode_entity_response(&self, response: reqwest::Response, action: &str) -> BamResult<Value> {
        if !response.status().is_success() {
            if response.status() == StatusCode::CONFLICT {
                return Err(BamError::Conflict {
                    row_id: String::new(),
                    endpoint: response.url().path().to_string(),
                });
            }
            return Err(BamError::Fatal {
                row_id: String::new(),
                message: format!("{action} failed with status {}", response.status()),
            });
        }
        response.json().await.map_err(|err| BamError::Fatal {
            row_id: String::new(),
            message: format!("malformed {action} response: {err}"),
        })
    }
}

fn split_href(href: &str) -> (String, String) {
    match href.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (href.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_href_separates_path_and_query() {
        assert_eq!(
            split_href("/networks?start=10&count=100"),
            ("/networks".to_string(), "start=10&count=100".to_string())
        );
        assert_eq!(split_href("/networks"), ("/networks".to_string(), String::new()));
    }
}
