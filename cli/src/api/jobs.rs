//! # Jobs API
//!
//! Public job listings. These endpoints work with or without a session.
//!
//! [`ApiClient::job_summary`] shows the fan-out/fan-in pattern for combined
//! views: the total and every per-category count are requested concurrently
//! and combined once all of them have succeeded.

use std::collections::BTreeMap;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::api::client::{ApiClient, ApiError, RequestConfig};
use crate::api::lenient::null_as_default;
use crate::api::pagination::{ListBody, PageRequest};
use crate::session::EntityId;

/// A job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier
    pub id: EntityId,
    /// Job title
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Category slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Location label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Remaining server fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Filters for listing jobs
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    /// Only jobs in this category
    pub category: Option<String>,
    /// Free-text search
    pub search: Option<String>,
    /// Page to fetch; the server default applies when unset
    pub page: Option<PageRequest>,
}

impl JobQuery {
    fn to_request(&self) -> RequestConfig {
        let request = RequestConfig::get("/jobs")
            .param_opt("category", self.category.as_deref())
            .param_opt("search", self.search.as_deref());
        match self.page {
            Some(page) => page.apply(request),
            None => request,
        }
    }
}

/// Job counts for a combined overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    /// Number of jobs across all categories
    pub total: u64,
    /// Number of jobs per requested category
    pub by_category: BTreeMap<String, u64>,
}

impl JobSummary {
    /// Jobs not covered by any requested category.
    pub fn other(&self) -> u64 {
        let counted: u64 = self.by_category.values().sum();
        self.total.saturating_sub(counted)
    }
}

#[derive(Debug, Deserialize)]
struct CountBody {
    #[serde(alias = "total")]
    count: u64,
}

impl ApiClient {
    /// List jobs matching a query.
    pub async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, ApiError> {
        let body: ListBody<Job> = self.request(query.to_request()).await?;
        Ok(body.into_items())
    }

    /// Fetch a single job.
    pub async fn job(&self, id: &EntityId) -> Result<Job, ApiError> {
        self.get(&format!("/jobs/{}", id)).await
    }

    /// Count jobs, optionally within one category.
    pub async fn job_count(&self, category: Option<&str>) -> Result<u64, ApiError> {
        let body: CountBody = self
            .request(RequestConfig::get("/jobs/count").param_opt("category", category))
            .await?;
        Ok(body.count)
    }

    /// Total and per-category counts, fetched concurrently.
    ///
    /// Fails as a whole if any single count fails.
    pub async fn job_summary(&self, categories: &[String]) -> Result<JobSummary, ApiError> {
        let total = self.job_count(None);
        let per_category = try_join_all(categories.iter().map(|category| async move {
            let count = self.job_count(Some(category.as_str())).await?;
            Ok::<_, ApiError>((category.clone(), count))
        }));

        let (total, counts) = futures_util::try_join!(total, per_category)?;

        Ok(JobSummary {
            total,
            by_category: counts.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{MockServer, reply, respond_with};
    use crate::session::SessionContext;
    use axum::http::StatusCode;

    #[test]
    fn test_job_query_params() {
        let query = JobQuery {
            category: Some("design".to_string()),
            search: None,
            page: Some(PageRequest::new(2, 10)),
        };
        let request = query.to_request();
        assert_eq!(request.path, "/jobs");
        assert_eq!(
            request.params,
            vec![
                ("category".to_string(), "design".to_string()),
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_job_summary_other() {
        let summary = JobSummary {
            total: 10,
            by_category: BTreeMap::from([("a".to_string(), 3), ("b".to_string(), 4)]),
        };
        assert_eq!(summary.other(), 3);
    }

    #[tokio::test]
    async fn test_public_listing_without_token() {
        let server = MockServer::start(reply(
            StatusCode::OK,
            r#"[{"id":1,"title":"Barista","remote":false},{"id":"j-2","title":"Baker"}]"#,
        ))
        .await;
        let client = ApiClient::new(server.url(), SessionContext::in_memory());

        let jobs = client.list_jobs(&JobQuery::default()).await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Barista");
        assert_eq!(jobs[0].extra.get("remote"), Some(&serde_json::json!(false)));
        assert_eq!(jobs[1].id, EntityId::Text("j-2".to_string()));
        assert_eq!(server.requests()[0].authorization, None);
    }

    #[tokio::test]
    async fn test_listing_tolerates_null_title() {
        let server = MockServer::start(reply(
            StatusCode::OK,
            r#"[{"id":1,"title":null,"category":null},{"id":2,"title":"Baker"}]"#,
        ))
        .await;
        let client = ApiClient::new(server.url(), SessionContext::in_memory());

        let jobs = client.list_jobs(&JobQuery::default()).await.unwrap();

        assert_eq!(jobs[0].title, "");
        assert_eq!(jobs[0].category, None);
        assert_eq!(jobs[1].title, "Baker");
    }

    #[tokio::test]
    async fn test_job_summary_fans_out() {
        let server = MockServer::start(respond_with(|req| {
            let count = match req.query.as_deref() {
                None => 12,
                Some("category=design") => 5,
                Some("category=kitchen") => 4,
                Some(_) => 0,
            };
            (StatusCode::OK, format!(r#"{{"count":{}}}"#, count))
        }))
        .await;
        let client = ApiClient::new(server.url(), SessionContext::in_memory());

        let summary = client
            .job_summary(&["design".to_string(), "kitchen".to_string()])
            .await
            .unwrap();

        assert_eq!(summary.total, 12);
        assert_eq!(summary.by_category["design"], 5);
        assert_eq!(summary.by_category["kitchen"], 4);
        assert_eq!(summary.other(), 3);
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_job_summary_fails_if_any_count_fails() {
        let server = MockServer::start(respond_with(|req| match req.query.as_deref() {
            Some("category=broken") => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            _ => (StatusCode::OK, r#"{"total":1}"#.to_string()),
        }))
        .await;
        let client = ApiClient::new(server.url(), SessionContext::in_memory());

        let err = client
            .job_summary(&["ok".to_string(), "broken".to_string()])
            .await
            .unwrap_err();

        assert!(err.is_server_error());
    }
}
