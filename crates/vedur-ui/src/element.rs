//! Declarative element tree.
//!
//! [`build`] turns a tag, an attribute map and a list of children into an
//! [`Element`] in one expression. The attribute map follows a small protocol:
//!
//! - `class` sets the class list (a string is split on whitespace)
//! - a [`AttrValue::Handler`] binds an event listener for the event named by
//!   its key, e.g. `click`; it never becomes an attribute
//! - everything else is a plain attribute
//!
//! Children are owned by their parent and dropped when it is cleared.

use std::fmt;

use maud::Render;

/// Callback bound to an event on an element. Lives as long as the element.
pub type EventHandler = Box<dyn FnMut() + Send>;

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// Value side of an attribute map entry.
pub enum AttrValue {
    Text(String),
    ClassList(Vec<String>),
    Handler(EventHandler),
}

impl AttrValue {
    pub fn handler(f: impl FnMut() + Send + 'static) -> Self {
        Self::Handler(Box::new(f))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        Self::ClassList(value)
    }
}

impl From<&[&str]> for AttrValue {
    fn from(value: &[&str]) -> Self {
        Self::ClassList(value.iter().map(|s| s.to_string()).collect())
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::ClassList(c) => f.debug_tuple("ClassList").field(c).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// Ordered attribute map passed to [`build`].
#[derive(Debug, Default)]
pub struct Attributes(Vec<(String, AttrValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn class(self, value: impl Into<AttrValue>) -> Self {
        self.attr("class", value)
    }

    pub fn on(
        mut self,
        event: impl Into<String>,
        handler: impl FnMut() + Send + 'static,
    ) -> Self {
        self.0.push((event.into(), AttrValue::handler(handler)));
        self
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A child of an element.
#[derive(Debug)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    fn text_into(&self, out: &mut String) {
        match self {
            Node::Element(el) => {
                for child in &el.children {
                    child.text_into(out);
                }
            }
            Node::Text(t) => out.push_str(t),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

pub struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<Node>,
}

/// Build an element from a tag, an attribute map and children.
///
/// Tag names and attribute keys are not validated.
pub fn build(tag: &str, attributes: Attributes, children: Vec<Node>) -> Element {
    let mut el = Element {
        tag: tag.to_string(),
        classes: Vec::new(),
        attributes: Vec::new(),
        listeners: Vec::new(),
        children,
    };

    for (name, value) in attributes.0 {
        match value {
            AttrValue::Handler(handler) => el.listeners.push((name, handler)),
            AttrValue::Text(text) if name == "class" => {
                el.classes = text.split_whitespace().map(str::to_string).collect();
            }
            AttrValue::ClassList(list) if name == "class" => el.classes = list,
            AttrValue::Text(text) => el.set_attribute(&name, text),
            AttrValue::ClassList(list) => el.set_attribute(&name, list.join(" ")),
        }
    }

    el
}

/// Remove every child of `node`.
pub fn clear_children(node: &mut Element) {
    node.clear_children();
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        if name == "class" {
            return None;
        }
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace a plain attribute.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn append_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.text_into(&mut out);
        }
        out
    }

    /// Number of listeners bound for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.iter().filter(|(name, _)| name == event).count()
    }

    /// Invoke every listener bound for `event` once. Returns how many ran.
    pub fn dispatch(&mut self, event: &str) -> usize {
        let mut invoked = 0;
        for (name, handler) in &mut self.listeners {
            if name == event {
                handler();
                invoked += 1;
            }
        }
        invoked
    }

    /// Depth-first search including `self`.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|el| el.find(pred))
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        for child in &mut self.children {
            if let Node::Element(el) = child {
                if let Some(found) = el.find_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        self.find(&|el| el.has_class(class))
    }

    pub fn find_by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.has_class(class))
    }

    /// Serialize as HTML. Listeners are not serialized.
    pub fn to_html(&self) -> String {
        self.render().into_string()
    }
}

impl Render for Element {
    fn render_to(&self, buffer: &mut String) {
        buffer.push('<');
        buffer.push_str(&self.tag);
        if !self.classes.is_empty() {
            buffer.push_str(" class=\"");
            self.classes.join(" ").render_to(buffer);
            buffer.push('"');
        }
        for (name, value) in &self.attributes {
            buffer.push(' ');
            buffer.push_str(name);
            buffer.push_str("=\"");
            value.render_to(buffer);
            buffer.push('"');
        }
        buffer.push('>');

        // Void elements have no close tag
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }

        for child in &self.children {
            child.render_to(buffer);
        }

        buffer.push_str("</");
        buffer.push_str(&self.tag);
        buffer.push('>');
    }
}

impl Render for Node {
    fn render_to(&self, buffer: &mut String) {
        match self {
            Node::Element(el) => el.render_to(buffer),
            Node::Text(text) => text.render_to(buffer),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: Vec<&str> = self.listeners.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("classes", &self.classes)
            .field("attributes", &self.attributes)
            .field("listeners", &listeners)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_build_div_with_class_and_text() {
        let div = build("div", Attributes::new().class("a"), vec!["text".into()]);

        assert_eq!(div.tag(), "div");
        assert_eq!(div.classes(), ["a"]);
        assert_eq!(div.children().len(), 1);
        assert!(matches!(&div.children()[0], Node::Text(t) if t == "text"));
    }

    #[test]
    fn test_clear_parent_removes_child() {
        let child = build("div", Attributes::new().class("a"), vec!["text".into()]);
        let mut parent = build("section", Attributes::new(), vec![child.into()]);
        assert_eq!(parent.children().len(), 1);

        clear_children(&mut parent);
        assert!(parent.children().is_empty());

        // Idempotent
        clear_children(&mut parent);
        assert!(parent.children().is_empty());
    }

    #[test]
    fn test_click_handler_runs_once_per_activation() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = clicks.clone();
        let mut button = build(
            "button",
            Attributes::new().on("click", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            vec!["Go".into()],
        );

        assert_eq!(clicks.load(Ordering::SeqCst), 0);
        assert_eq!(button.dispatch("click"), 1);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        button.dispatch("click");
        assert_eq!(clicks.load(Ordering::SeqCst), 2);

        assert_eq!(button.dispatch("keydown"), 0);
        assert_eq!(clicks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_handler_is_not_an_attribute() {
        let button = build("button", Attributes::new().on("click", || {}), vec![]);
        assert_eq!(button.attribute("click"), None);
        assert_eq!(button.listener_count("click"), 1);
        assert_eq!(button.to_html(), "<button></button>");
    }

    #[test]
    fn test_class_string_is_split() {
        let el = build("p", Attributes::new().class("  location   location__title "), vec![]);
        assert_eq!(el.classes(), ["location", "location__title"]);
    }

    #[test]
    fn test_class_list_value() {
        let el = build(
            "section",
            Attributes::new().class(vec!["results".to_string(), "hidden".to_string()]),
            vec![],
        );
        assert!(el.has_class("results"));
        assert!(el.has_class("hidden"));
    }

    #[test]
    fn test_plain_attributes() {
        let el = build(
            "a",
            Attributes::new()
                .attr("href", "/spa")
                .attr("rel", &["noopener", "noreferrer"][..])
                .attr("href", "/forecast"),
            vec![],
        );
        assert_eq!(el.attribute("href"), Some("/forecast"));
        assert_eq!(el.attribute("rel"), Some("noopener noreferrer"));
        assert_eq!(el.attribute("class"), None);
    }

    #[test]
    fn test_attributes_from_iterator() {
        let attrs: Attributes = [
            ("class", AttrValue::from("forecast__row")),
            ("id", "row-1".into()),
        ]
        .into_iter()
        .collect();
        let row = build("tr", attrs, vec![]);
        assert!(row.has_class("forecast__row"));
        assert_eq!(row.attribute("id"), Some("row-1"));
    }

    #[test]
    fn test_children_keep_order() {
        let list = build(
            "ul",
            Attributes::new(),
            vec![
                build("li", Attributes::new(), vec!["one".into()]).into(),
                "between".into(),
                build("li", Attributes::new(), vec!["two".into()]).into(),
            ],
        );
        assert_eq!(list.children().len(), 3);
        assert_eq!(list.text_content(), "onebetweentwo");
    }

    #[test]
    fn test_class_helpers() {
        let mut el = build("section", Attributes::new().class("results hidden"), vec![]);
        el.remove_class("hidden");
        assert!(!el.has_class("hidden"));
        el.add_class("results");
        assert_eq!(el.classes(), ["results"]);
    }

    #[test]
    fn test_find_by_class_is_depth_first() {
        let mut tree = build(
            "main",
            Attributes::new(),
            vec![
                build(
                    "section",
                    Attributes::new().class("results"),
                    vec![build("div", Attributes::new().class("results__content"), vec![]).into()],
                )
                .into(),
                build("div", Attributes::new().class("results"), vec![]).into(),
            ],
        );

        assert_eq!(tree.find_by_class("results").map(Element::tag), Some("section"));
        let content = tree.find_by_class_mut("results__content").unwrap();
        content.append_child("x");
        assert_eq!(tree.text_content(), "x");
        assert!(tree.find_by_class("missing").is_none());
    }

    #[test]
    fn test_to_html_escapes() {
        let el = build(
            "p",
            Attributes::new().class("error").attr("title", "a \"b\" & c"),
            vec!["1 < 2 & 3 > 2".into(), build("br", Attributes::new(), vec![]).into()],
        );
        assert_eq!(
            el.to_html(),
            "<p class=\"error\" title=\"a &quot;b&quot; &amp; c\">1 &lt; 2 &amp; 3 &gt; 2<br></p>"
        );
    }

    #[test]
    fn test_element_renders_inside_markup() {
        let cell = build(
            "td",
            Attributes::new().attr("data-unit", "<mm>"),
            vec!["<script>".into()],
        );
        let markup = maud::html! { tr { (cell) } };
        assert_eq!(
            markup.into_string(),
            "<tr><td data-unit=\"&lt;mm&gt;\">&lt;script&gt;</td></tr>"
        );
    }
}
