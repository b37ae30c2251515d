//! Page layout and the loading/result/error views.
//!
//! Every function takes the root it renders into; nothing reaches for a
//! global document.

use maud::{html, Markup, DOCTYPE};
use tokio::sync::mpsc::UnboundedSender;
use vedur_weather::{ForecastPoint, Location};

use crate::element::{build, clear_children, Attributes, Element, Node};
use crate::search::SearchRequest;

pub const MY_LOCATION_BUTTON: &str = "My location (requires permission)";

/// Build the static page into `container`.
///
/// Each location button sends a [`SearchRequest`] on `requests` when clicked.
pub fn render_page(
    container: &mut Element,
    locations: &[Location],
    requests: &UnboundedSender<SearchRequest>,
) {
    let header = build(
        "header",
        Attributes::new(),
        vec![build("h1", Attributes::new(), vec!["☀️ Veðrið 🌨".into()]).into()],
    );

    let intro = build(
        "p",
        Attributes::new().class("intro"),
        vec!["Choose a place to see the temperature and precipitation forecast.".into()],
    );

    let mut buttons = vec![location_button(
        MY_LOCATION_BUTTON,
        requests,
        SearchRequest::MyLocation,
    )];
    buttons.extend(locations.iter().map(|location| {
        location_button(
            &location.title,
            requests,
            SearchRequest::Location(location.clone()),
        )
    }));

    let locations_section = build(
        "section",
        Attributes::new().class("locations"),
        vec![
            build(
                "h2",
                Attributes::new().class("locations__heading"),
                vec!["Locations".into()],
            )
            .into(),
            build(
                "ul",
                Attributes::new().class("locations__list"),
                buttons.into_iter().map(Into::into).collect(),
            )
            .into(),
        ],
    );

    let results_section = build(
        "section",
        Attributes::new().class("results hidden"),
        vec![
            build(
                "h2",
                Attributes::new().class("results__heading"),
                vec!["Results".into()],
            )
            .into(),
            build("div", Attributes::new().class("results__content"), vec![]).into(),
        ],
    );

    container.append_child(build(
        "main",
        Attributes::new().class("weather"),
        vec![
            header.into(),
            intro.into(),
            locations_section.into(),
            results_section.into(),
        ],
    ));
}

fn location_button(
    title: &str,
    requests: &UnboundedSender<SearchRequest>,
    request: SearchRequest,
) -> Element {
    let tx = requests.clone();
    build(
        "li",
        Attributes::new().class("locations__location"),
        vec![build(
            "button",
            Attributes::new()
                .class("locations__button")
                .on("click", move || {
                    if tx.send(request.clone()).is_err() {
                        tracing::warn!("Search request dropped: no one is listening");
                    }
                }),
            vec![title.into()],
        )
        .into()],
    )
}

/// Find the button for a location by its label.
pub fn location_button_mut<'a>(root: &'a mut Element, title: &str) -> Option<&'a mut Element> {
    root.find_mut(&|el| el.has_class("locations__button") && el.text_content() == title)
}

/// Replace the results content with `element` and unhide the results.
///
/// Returns false, after logging, when the page has no results container.
fn render_into_results_content(root: &mut Element, element: Element) -> bool {
    let Some(results) = root.find_by_class_mut("results") else {
        tracing::error!("results element not found");
        return false;
    };

    results.remove_class("hidden");

    let Some(content) = results.find_by_class_mut("results__content") else {
        tracing::error!("results content element not found");
        return false;
    };

    clear_children(content);
    content.append_child(element);
    true
}

pub fn render_loading(root: &mut Element) -> bool {
    render_into_results_content(root, build("p", Attributes::new(), vec!["Searching...".into()]))
}

pub fn render_error(root: &mut Element, message: &str) -> bool {
    render_into_results_content(
        root,
        build("p", Attributes::new().class("error"), vec![message.into()]),
    )
}

/// Location header plus one table row per forecast point.
pub fn render_results(root: &mut Element, location: &Location, points: &[ForecastPoint]) -> bool {
    let location_element = build(
        "div",
        Attributes::new().class("location"),
        vec![
            build(
                "h3",
                Attributes::new().class("location__title"),
                vec![location.title.as_str().into()],
            )
            .into(),
            build(
                "p",
                Attributes::new().class("location__description"),
                vec![format!(
                    "Forecast for the day at latitude {} and longitude {}.",
                    location.latitude, location.longitude
                )
                .into()],
            )
            .into(),
        ],
    );

    let rows: Vec<Node> = points
        .iter()
        .map(|point| {
            build(
                "tr",
                Attributes::new().class("forecast__row"),
                vec![
                    build("td", Attributes::new(), vec![point.time.as_str().into()]).into(),
                    build("td", Attributes::new(), vec![point.temperature.to_string().into()])
                        .into(),
                    build("td", Attributes::new(), vec![point.precipitation.to_string().into()])
                        .into(),
                ],
            )
            .into()
        })
        .collect();

    let table = build(
        "table",
        Attributes::new().class("forecast"),
        vec![
            build(
                "thead",
                Attributes::new().class("forecast__header"),
                vec![build(
                    "tr",
                    Attributes::new(),
                    vec![
                        build("th", Attributes::new(), vec!["Hour".into()]).into(),
                        build("th", Attributes::new(), vec!["Temperature (°C)".into()]).into(),
                        build("th", Attributes::new(), vec!["Precipitation (mm)".into()]).into(),
                    ],
                )
                .into()],
            )
            .into(),
            build("tbody", Attributes::new().class("forecast__body"), rows).into(),
        ],
    );

    render_into_results_content(
        root,
        build(
            "div",
            Attributes::new().class("results"),
            vec![location_element.into(), table.into()],
        ),
    )
}

/// Wrap a rendered body in a complete HTML document.
pub fn render_document(body: &Element) -> Markup {
    html! {
        (DOCTYPE)
        html lang="is" {
            head {
                meta charset="utf-8";
                title { "Veðrið" }
            }
            (body)
        }
    }
}
