//! site_* tool implementations.
//!
//! These drive the page the way a visitor would: open a document, click a
//! link, step through history, and inspect what the page currently shows.

use pjax_client::ClickEvent;
use pjax_client::nav::{NavigationOutcome, PageSnapshot, RebindReport};
use pjax_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::session::{FullLoad, Session, WorkerSummary};

/// Parameters for the site_open tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SiteOpenParams {
    /// Path or absolute URL to load. Defaults to the configured start path.
    #[serde(default)]
    pub url: Option<String>,
}

/// Parameters for the site_click tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SiteClickParams {
    /// Click the first anchor whose href attribute equals this value.
    #[serde(default)]
    pub href: Option<String>,

    /// Click the element with this id instead.
    #[serde(default)]
    pub id: Option<String>,
}

/// Parameters for the site_history tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteHistoryParams {
    /// Either "back" or "forward".
    pub direction: String,
}

#[derive(Debug, Serialize)]
struct OpenOutput {
    report: RebindReport,
    state: PageSnapshot,
}

#[derive(Debug, Serialize)]
struct ClickOutput {
    /// Whether the navigator took the click.
    intercepted: bool,
    default_prevented: bool,
    outcome: Option<NavigationOutcome>,
    full_load: Option<FullLoad>,
    state: PageSnapshot,
}

#[derive(Debug, Serialize)]
struct HistoryOutput {
    moved: bool,
    outcome: Option<NavigationOutcome>,
    full_load: Option<FullLoad>,
    state: PageSnapshot,
}

#[derive(Debug, Serialize)]
struct StateOutput {
    page: PageSnapshot,
    worker: WorkerSummary,
}

/// Implementation of the site_open tool.
pub async fn open_impl(session: &Session, params: SiteOpenParams) -> Result<CallToolResult, McpError> {
    let url = match params.url.as_deref() {
        Some(input) => session.resolve(input)?,
        None => session.start_url()?,
    };

    let report = session.navigator().open(url).await?;
    let state = session.navigator().snapshot().await;
    json_result(&OpenOutput { report, state })
}

/// Implementation of the site_click tool.
pub async fn click_impl(session: &Session, params: SiteClickParams) -> Result<CallToolResult, McpError> {
    let target = {
        let page = session.navigator().page().await;
        let view = page.document.view();
        match (params.href.as_deref(), params.id.as_deref()) {
            (Some(href), _) => view
                .find_link(href)
                .ok_or_else(|| Error::InvalidInput(format!("no link with href {href:?}")))?,
            (None, Some(id)) => view
                .find_by_id(id)
                .ok_or_else(|| Error::InvalidInput(format!("no element with id {id:?}")))?,
            (None, None) => return Err(Error::InvalidInput("either href or id is required".into()).into()),
        }
    };

    let mut event = ClickEvent::new(target);
    let outcome = session.navigator().intercept_click(&mut event).await;
    let full_load = match &outcome {
        Some(outcome) => session.settle(outcome).await,
        None => None,
    };

    json_result(&ClickOutput {
        intercepted: outcome.is_some(),
        default_prevented: event.default_prevented(),
        outcome,
        full_load,
        state: session.navigator().snapshot().await,
    })
}

/// Implementation of the site_history tool.
pub async fn history_impl(session: &Session, params: SiteHistoryParams) -> Result<CallToolResult, McpError> {
    let outcome = match params.direction.as_str() {
        "back" => session.navigator().back().await,
        "forward" => session.navigator().forward().await,
        other => {
            return Err(Error::InvalidInput(format!("direction must be \"back\" or \"forward\", got {other:?}")).into());
        }
    };
    let full_load = match &outcome {
        Some(outcome) => session.settle(outcome).await,
        None => None,
    };

    json_result(&HistoryOutput {
        moved: outcome.is_some(),
        outcome,
        full_load,
        state: session.navigator().snapshot().await,
    })
}

/// Implementation of the site_state tool.
pub async fn state_impl(session: &Session) -> Result<CallToolResult, McpError> {
    let page = session.navigator().snapshot().await;
    let worker = session.worker_summary().await?;
    json_result(&StateOutput { page, worker })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{self, json};

    async fn opened() -> (Session, std::sync::Arc<testing::SiteFetcher>) {
        let (session, fetcher) = testing::session_with_fetcher().await;
        open_impl(&session, SiteOpenParams::default()).await.unwrap();
        (session, fetcher)
    }

    fn click(href: &str) -> SiteClickParams {
        SiteClickParams { href: Some(href.into()), id: None }
    }

    #[tokio::test]
    async fn test_open_defaults_to_start_path() {
        let session = testing::session().await;
        let result = open_impl(&session, SiteOpenParams::default()).await.unwrap();
        let output = json(&result);

        assert_eq!(output["state"]["location"], "https://yunoxia.one/");
        assert_eq!(output["report"]["observed"], 1);
        assert_eq!(output["state"]["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_page() {
        let session = testing::session().await;
        let params = SiteOpenParams { url: Some("/missing.html".into()) };
        assert!(open_impl(&session, params).await.is_err());
    }

    #[tokio::test]
    async fn test_click_swaps_content() {
        let (session, _) = opened().await;
        let output = json(&click_impl(&session, click("about.html")).await.unwrap());

        assert_eq!(output["intercepted"], true);
        assert_eq!(output["default_prevented"], true);
        assert_eq!(output["outcome"]["outcome"], "swapped");
        assert!(output["full_load"].is_null());
        assert_eq!(output["state"]["location"], "https://yunoxia.one/about.html");
        assert!(output["state"]["content"].as_str().unwrap().contains("About"));
        assert_eq!(output["state"]["history"].as_array().unwrap().len(), 2);
        assert_eq!(output["state"]["tilt_bound"], 1);
    }

    #[tokio::test]
    async fn test_click_external_left_to_host() {
        let (session, _) = opened().await;
        let output = json(&click_impl(&session, click("https://example.com/")).await.unwrap());

        assert_eq!(output["intercepted"], false);
        assert_eq!(output["default_prevented"], false);
        assert!(output["outcome"].is_null());
        assert_eq!(output["state"]["location"], "https://yunoxia.one/");
    }

    #[tokio::test]
    async fn test_click_failure_falls_back_to_full_load() {
        let (session, fetcher) = opened().await;
        fetcher.set_route("/works.html", 500, "");

        let output = json(&click_impl(&session, click("works.html")).await.unwrap());
        assert_eq!(output["outcome"]["outcome"], "full_reload");
        assert_eq!(output["full_load"]["url"], "https://yunoxia.one/works.html");
        assert_eq!(output["full_load"]["loaded"], false);
        assert!(output["state"]["pending_location"].is_null());
    }

    #[tokio::test]
    async fn test_click_requires_target() {
        let (session, _) = opened().await;
        assert!(click_impl(&session, SiteClickParams::default()).await.is_err());
        assert!(click_impl(&session, click("nowhere.html")).await.is_err());

        let by_id = SiteClickParams { href: None, id: Some("theme-toggle".into()) };
        let output = json(&click_impl(&session, by_id).await.unwrap());
        assert_eq!(output["intercepted"], false);
    }

    #[tokio::test]
    async fn test_history_back_and_forward() {
        let (session, _) = opened().await;
        click_impl(&session, click("about.html")).await.unwrap();

        let back = json(&history_impl(&session, SiteHistoryParams { direction: "back".into() }).await.unwrap());
        assert_eq!(back["moved"], true);
        assert_eq!(back["outcome"]["outcome"], "swapped");
        assert_eq!(back["state"]["location"], "https://yunoxia.one/");
        assert_eq!(back["state"]["history_index"], 0);
        assert_eq!(back["state"]["history"].as_array().unwrap().len(), 2);

        let forward = json(&history_impl(&session, SiteHistoryParams { direction: "forward".into() }).await.unwrap());
        assert_eq!(forward["state"]["location"], "https://yunoxia.one/about.html");

        let again = json(&history_impl(&session, SiteHistoryParams { direction: "forward".into() }).await.unwrap());
        assert_eq!(again["moved"], false);
    }

    #[tokio::test]
    async fn test_history_rejects_unknown_direction() {
        let (session, _) = opened().await;
        let params = SiteHistoryParams { direction: "sideways".into() };
        assert!(history_impl(&session, params).await.is_err());
    }

    #[tokio::test]
    async fn test_state_includes_worker() {
        let (session, _) = opened().await;
        let output = json(&state_impl(&session).await.unwrap());

        assert_eq!(output["page"]["location"], "https://yunoxia.one/");
        assert_eq!(output["worker"]["controller"], "yunoxia-v1.0.0");
        assert!(output["worker"]["waiting"].is_null());
    }

    #[tokio::test]
    async fn test_offline_navigation_served_from_cache() {
        let (session, fetcher) = opened().await;
        fetcher.set_offline(true);

        let output = json(&click_impl(&session, click("about.html")).await.unwrap());
        assert_eq!(output["outcome"]["outcome"], "swapped");
        assert!(output["state"]["content"].as_str().unwrap().contains("About"));
    }
}
