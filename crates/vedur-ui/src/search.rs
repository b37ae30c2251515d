//! Search orchestration: location lookup, forecast fetch, and rendering of
//! the outcome.
//!
//! Every search gets a generation number. Only the outcome of the most recent
//! search is rendered; earlier ones that finish late are dropped.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use vedur_weather::{ForecastClient, ForecastPoint, Location, LocationProvider, WeatherError};

use crate::element::Element;
use crate::render::{render_error, render_loading, render_results};

/// What a location button asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    Location(Location),
    MyLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failure,
}

/// Finished search, tagged with the generation it was started under.
#[derive(Debug)]
pub struct SearchOutcome {
    pub generation: u64,
    pub result: Result<(Location, Vec<ForecastPoint>), WeatherError>,
}

pub struct SearchController<P> {
    client: ForecastClient,
    locator: Arc<P>,
    generation: u64,
    phase: SearchPhase,
}

impl<P: LocationProvider + 'static> SearchController<P> {
    pub fn new(client: ForecastClient, locator: P) -> Self {
        Self {
            client,
            locator: Arc::new(locator),
            generation: 0,
            phase: SearchPhase::Idle,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Generation of the most recently started search.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a search: show the loading state and hand out a new generation.
    pub fn begin(&mut self, root: &mut Element) -> u64 {
        self.generation += 1;
        self.phase = SearchPhase::Loading;
        render_loading(root);
        self.generation
    }

    /// Render a finished search unless a newer one has started since.
    ///
    /// Returns whether the outcome was rendered.
    pub fn complete(&mut self, root: &mut Element, outcome: SearchOutcome) -> bool {
        if outcome.generation != self.generation {
            tracing::debug!(
                "Discarding stale search result (generation {}, latest {})",
                outcome.generation,
                self.generation
            );
            return false;
        }

        match outcome.result {
            Ok((location, points)) => {
                tracing::info!("Rendering {} forecast rows for {}", points.len(), location.title);
                render_results(root, &location, &points);
                self.phase = SearchPhase::Success;
            }
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                render_error(root, e.user_message());
                self.phase = SearchPhase::Failure;
            }
        }
        true
    }

    /// Run one search to completion.
    pub async fn search(&mut self, root: &mut Element, request: SearchRequest) -> SearchPhase {
        let generation = self.begin(root);
        let result = resolve(self.client.clone(), self.locator.clone(), request).await;
        self.complete(root, SearchOutcome { generation, result });
        self.phase
    }

    /// Start every queued request concurrently and render outcomes as they
    /// finish. Returns how many searches were started.
    pub async fn run_pending(
        &mut self,
        root: &mut Element,
        requests: &mut UnboundedReceiver<SearchRequest>,
    ) -> usize {
        let mut tasks = JoinSet::new();

        while let Ok(request) = requests.try_recv() {
            let generation = self.begin(root);
            let client = self.client.clone();
            let locator = self.locator.clone();
            tasks.spawn(async move {
                SearchOutcome {
                    generation,
                    result: resolve(client, locator, request).await,
                }
            });
        }

        let started = tasks.len();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    self.complete(root, outcome);
                }
                Err(e) => tracing::error!("Search task failed: {}", e),
            }
        }
        started
    }
}

async fn resolve<P: LocationProvider>(
    client: ForecastClient,
    locator: Arc<P>,
    request: SearchRequest,
) -> Result<(Location, Vec<ForecastPoint>), WeatherError> {
    let location = match request {
        SearchRequest::Location(location) => location,
        SearchRequest::MyLocation => locator.current_location().await?,
    };
    let points = client
        .fetch_forecast(location.latitude, location.longitude)
        .await?;
    Ok((location, points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{build, Attributes};
    use crate::render::{location_button_mut, render_page};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use vedur_weather::{ConfiguredLocation, ForecastOptions, ValidationError};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload(first_hour: &str) -> serde_json::Value {
        serde_json::json!({
            "hourly": {
                "time": [format!("2024-01-01T{}", first_hour), "2024-01-01T10:00"],
                "temperature_2m": [2.5, 3.0],
                "precipitation": [0.0, 0.6]
            }
        })
    }

    fn controller(
        server: &MockServer,
        here: Option<(f64, f64)>,
    ) -> SearchController<ConfiguredLocation> {
        let client = ForecastClient::new(
            &server.uri(),
            ForecastOptions {
                delay: Duration::ZERO,
                timeout: Some(Duration::from_secs(5)),
            },
        )
        .unwrap();
        SearchController::new(client, ConfiguredLocation::new(here))
    }

    fn page(locations: &[Location]) -> (Element, mpsc::UnboundedReceiver<SearchRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut body = build("body", Attributes::new(), vec![]);
        render_page(&mut body, locations, &tx);
        (body, rx)
    }

    fn results_text(root: &Element) -> String {
        root.find_by_class("results__content").unwrap().text_content()
    }

    #[tokio::test]
    async fn test_search_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload("09:00")))
            .mount(&server)
            .await;

        let mut controller = controller(&server, None);
        let (mut body, _rx) = page(&[]);
        assert_eq!(controller.phase(), SearchPhase::Idle);

        let tokyo = Location::new("Tokyo", 35.6764, 139.65);
        let phase = controller
            .search(&mut body, SearchRequest::Location(tokyo))
            .await;

        assert_eq!(phase, SearchPhase::Success);
        let content = body.find_by_class("results__content").unwrap();
        assert_eq!(content.find_by_class("location__title").unwrap().text_content(), "Tokyo");
        let rows = content.find_by_class("forecast__body").unwrap();
        assert_eq!(rows.children().len(), 2);
        assert!(results_text(&body).contains("09:00"));
    }

    #[tokio::test]
    async fn test_search_failure_renders_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let mut controller = controller(&server, None);
        let (mut body, _rx) = page(&[]);

        let phase = controller
            .search(&mut body, SearchRequest::Location(Location::new("X", 1.0, 2.0)))
            .await;

        assert_eq!(phase, SearchPhase::Failure);
        let error = body.find_by_class("error").unwrap();
        assert_eq!(
            error.text_content(),
            WeatherError::from(ValidationError::Data).user_message()
        );
    }

    #[tokio::test]
    async fn test_my_location_without_position() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload("09:00")))
            .expect(0)
            .mount(&server)
            .await;

        let mut controller = controller(&server, None);
        let (mut body, _rx) = page(&[]);

        let phase = controller.search(&mut body, SearchRequest::MyLocation).await;

        assert_eq!(phase, SearchPhase::Failure);
        assert_eq!(results_text(&body), "could not retrieve location");
    }

    #[tokio::test]
    async fn test_my_location_with_position() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "64.1"))
            .and(query_param("longitude", "-21.9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload("09:00")))
            .expect(1)
            .mount(&server)
            .await;

        let mut controller = controller(&server, Some((64.1, -21.9)));
        let (mut body, _rx) = page(&[]);

        let phase = controller.search(&mut body, SearchRequest::MyLocation).await;

        assert_eq!(phase, SearchPhase::Success);
        assert_eq!(
            body.find_by_class("location__title").unwrap().text_content(),
            "My location"
        );
    }

    #[tokio::test]
    async fn test_click_runs_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "65.6835"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload("07:00")))
            .expect(1)
            .mount(&server)
            .await;

        let mut controller = controller(&server, None);
        let (mut body, mut rx) = page(&[
            Location::new("Reykjavík", 64.1355, -21.8954),
            Location::new("Akureyri", 65.6835, -18.0878),
        ]);

        location_button_mut(&mut body, "Akureyri").unwrap().dispatch("click");
        let started = controller.run_pending(&mut body, &mut rx).await;

        assert_eq!(started, 1);
        assert_eq!(controller.phase(), SearchPhase::Success);
        assert!(results_text(&body).starts_with("Akureyri"));
        assert!(results_text(&body).contains("07:00"));
    }

    #[tokio::test]
    async fn test_late_result_of_older_search_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "64.1355"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(payload("01:00"))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("latitude", "35.6764"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload("05:00")))
            .mount(&server)
            .await;

        let mut controller = controller(&server, None);
        let (mut body, mut rx) = page(&[
            Location::new("Reykjavík", 64.1355, -21.8954),
            Location::new("Tokyo", 35.6764, 139.65),
        ]);

        location_button_mut(&mut body, "Reykjavík").unwrap().dispatch("click");
        location_button_mut(&mut body, "Tokyo").unwrap().dispatch("click");
        let started = controller.run_pending(&mut body, &mut rx).await;

        assert_eq!(started, 2);
        assert_eq!(controller.generation(), 2);
        assert_eq!(controller.phase(), SearchPhase::Success);
        assert!(results_text(&body).starts_with("Tokyo"));
        assert!(results_text(&body).contains("05:00"));
        assert!(!results_text(&body).contains("01:00"));
    }

    #[tokio::test]
    async fn test_complete_ignores_stale_generation() {
        let server = MockServer::start().await;
        let mut controller = controller(&server, None);
        let (mut body, _rx) = page(&[]);

        let first = controller.begin(&mut body);
        let second = controller.begin(&mut body);
        assert!(second > first);

        let stale = SearchOutcome {
            generation: first,
            result: Ok((Location::new("Old", 0.0, 0.0), Vec::new())),
        };
        assert!(!controller.complete(&mut body, stale));
        assert_eq!(controller.phase(), SearchPhase::Loading);
        assert_eq!(results_text(&body), "Searching...");
    }
}
