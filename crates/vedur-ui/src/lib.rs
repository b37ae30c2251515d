//! UI layer for Veður
//!
//! An owned element tree built declaratively, the page rendered into it, and
//! the search controller that moves it between loading, result and error states.

pub mod element;
pub mod render;
pub mod search;

pub use element::{build, clear_children, AttrValue, Attributes, Element, EventHandler, Node};
pub use render::{
    location_button_mut, render_document, render_error, render_loading, render_page,
    render_results, MY_LOCATION_BUTTON,
};
pub use search::{SearchController, SearchOutcome, SearchPhase, SearchRequest};
