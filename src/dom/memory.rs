//! In-memory document.
//!
//! [`MemoryDocument`] is a small element tree that implements [`Document`]
//! well enough to drive every engine headlessly. Elements are created
//! through [`MemoryDocument::append`]; markup written by swaps is stored as
//! opaque fragments, rendered verbatim and never parsed into elements.
//!
//! # Example
//!
//! ```ignore
//! use sxkit::dom::{Document, MemoryDocument};
//!
//! let doc = MemoryDocument::new();
//! let list = doc.append(doc.body(), "ul", &[("id", "list")]);
//! doc.append_markup(list, "<li>a</li>");
//!
//! assert_eq!(doc.query("#list"), Some(list));
//! assert_eq!(doc.inner_html(list), "<li>a</li>");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::identifiers::NodeId;

use super::selector::Selector;
use super::{Document, ElementKind, InputType, InsertPosition, Layout, StyleProperty};

// ============================================================================
// Constants
// ============================================================================

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: &[&str] = &["input", "br", "hr", "img", "meta", "link"];

static DATE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static MONTH_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}$").expect("valid regex"));
static WEEK_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-W\d{2}$").expect("valid regex"));
static TIME_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}:\d{2}(:\d{2}(\.\d{1,3})?)?$").expect("valid regex")
});

// ============================================================================
// Types
// ============================================================================

/// A child slot of an element.
#[derive(Debug, Clone)]
enum Child {
    Element(NodeId),
    Markup(String),
}

/// Per-element state.
#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<Child>,
    value: String,
    checked: bool,
    selected: bool,
    styles: FxHashMap<StyleProperty, String>,
    layout: Layout,
}

impl NodeData {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn kind(&self) -> ElementKind {
        ElementKind::classify(
            &self.tag,
            self.attribute("type"),
            self.attribute("multiple").is_some(),
        )
    }
}

/// The element tree.
#[derive(Debug)]
struct Tree {
    nodes: FxHashMap<NodeId, NodeData>,
    body: NodeId,
    next_id: u64,
    layout_flushes: u64,
}

// ============================================================================
// MemoryDocument
// ============================================================================

/// An in-memory [`Document`].
///
/// Thread-safe; all state sits behind one `RwLock`.
#[derive(Debug)]
pub struct MemoryDocument {
    tree: RwLock<Tree>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryDocument - Construction
// ============================================================================

impl MemoryDocument {
    /// Creates a document holding an empty `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let body = NodeId::new(1);
        let mut nodes = FxHashMap::default();
        nodes.insert(body, new_node("body", &[], None));
        Self {
            tree: RwLock::new(Tree {
                nodes,
                body,
                next_id: 2,
                layout_flushes: 0,
            }),
        }
    }

    /// Returns the `<body>` node.
    #[inline]
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.tree.read().body
    }

    /// Appends a new element under `parent` and returns its handle.
    ///
    /// Initial state comes from the attributes: `value`, `checked`,
    /// `selected`. Checkboxes and radios without a `value` use `on`.
    pub fn append(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut tree = self.tree.write();
        let id = NodeId::new(tree.next_id);
        tree.next_id += 1;

        tree.nodes.insert(id, new_node(tag, attributes, Some(parent)));
        if let Some(parent) = tree.nodes.get_mut(&parent) {
            parent.children.push(Child::Element(id));
        }
        id
    }

    /// Appends an opaque markup fragment under `parent`.
    pub fn append_markup(&self, parent: NodeId, html: &str) {
        if let Some(node) = self.tree.write().nodes.get_mut(&parent) {
            node.children.push(Child::Markup(html.to_string()));
        }
    }

    /// Sets the layout metrics reported for `node`.
    pub fn set_layout(&self, node: NodeId, layout: Layout) {
        if let Some(data) = self.tree.write().nodes.get_mut(&node) {
            data.layout = layout;
        }
    }
}

fn new_node(tag: &str, attributes: &[(&str, &str)], parent: Option<NodeId>) -> NodeData {
    let tag = tag.to_ascii_lowercase();
    let attributes: Vec<(String, String)> = attributes
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), (*v).to_string()))
        .collect();
    let has = |name: &str| attributes.iter().any(|(k, _)| k == name);
    let checked = has("checked");
    let selected = has("selected");
    let value = attributes
        .iter()
        .find(|(k, _)| k == "value")
        .map(|(_, v)| v.clone());

    let mut data = NodeData {
        tag,
        attributes,
        parent,
        children: Vec::new(),
        value: String::new(),
        checked,
        selected,
        styles: FxHashMap::default(),
        layout: Layout::default(),
    };

    let checkable = matches!(
        data.kind(),
        ElementKind::Input(InputType::Checkbox | InputType::Radio)
    );
    data.value = match value {
        Some(v) => v,
        None if checkable => "on".to_string(),
        None => String::new(),
    };
    data
}

// ============================================================================
// MemoryDocument - Inspection
// ============================================================================

impl MemoryDocument {
    /// Returns an attribute of `node`.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree
            .read()
            .nodes
            .get(&node)
            .and_then(|data| data.attribute(name).map(str::to_string))
    }

    /// Renders the content of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let tree = self.tree.read();
        let mut out = String::new();
        if let Some(data) = tree.nodes.get(&node) {
            for child in &data.children {
                tree.render_child(child, &mut out);
            }
        }
        out
    }

    /// Renders `node` including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let tree = self.tree.read();
        let mut out = String::new();
        tree.render(node, &mut out);
        out
    }

    /// Number of layout flushes forced through [`Document::layout`].
    #[must_use]
    pub fn layout_flushes(&self) -> u64 {
        self.tree.read().layout_flushes
    }
}

// ============================================================================
// Tree - Internals
// ============================================================================

impl Tree {
    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.nodes.get(&id).and_then(|data| data.parent);
        }
        false
    }

    /// Collects `root` and its element descendants in tree order.
    fn descendants(&self, root: NodeId, include_root: bool, out: &mut Vec<NodeId>) {
        if include_root {
            out.push(root);
        }
        if let Some(data) = self.nodes.get(&root) {
            for child in &data.children {
                if let Child::Element(id) = child {
                    self.descendants(*id, true, out);
                }
            }
        }
    }

    fn matching(&self, selector: &Selector) -> Vec<NodeId> {
        let mut all = Vec::new();
        self.descendants(self.body, true, &mut all);
        all.into_iter()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|data| selector.matches(&data.tag, |name| data.attribute(name)))
            })
            .collect()
    }

    fn kind(&self, node: NodeId) -> Option<ElementKind> {
        self.nodes.get(&node).map(NodeData::kind)
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        let mut all = Vec::new();
        self.descendants(select, false, &mut all);
        all.into_iter()
            .filter(|id| self.kind(*id) == Some(ElementKind::Option))
            .collect()
    }

    fn select_value(&self, select: NodeId) -> String {
        self.options(select)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .find(|option| option.selected)
            .map(|option| option.value.clone())
            .unwrap_or_default()
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = None;
        }
    }

    fn render(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(&node) else {
            return;
        };
        out.push('<');
        out.push_str(&data.tag);
        for (key, value) in &data.attributes {
            out.push_str(&format!(" {key}=\"{value}\""));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&data.tag.as_str()) {
            return;
        }
        for child in &data.children {
            self.render_child(child, out);
        }
        out.push_str(&format!("</{}>", data.tag));
    }

    fn render_child(&self, child: &Child, out: &mut String) {
        match child {
            Child::Element(id) => self.render(*id, out),
            Child::Markup(html) => out.push_str(html),
        }
    }
}

/// Applies the value sanitization a browser performs for typed inputs.
fn sanitize(input_type: &InputType, value: &str) -> String {
    let valid = match input_type {
        InputType::Number | InputType::Range => {
            value.is_empty() || value.parse::<f64>().is_ok_and(f64::is_finite)
        }
        InputType::Date => DATE_VALUE.is_match(value),
        InputType::Month => MONTH_VALUE.is_match(value),
        InputType::Week => WEEK_VALUE.is_match(value),
        InputType::Time => TIME_VALUE.is_match(value),
        _ => true,
    };
    if valid {
        value.to_string()
    } else {
        String::new()
    }
}

// ============================================================================
// Document Implementation
// ============================================================================

impl Document for MemoryDocument {
    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        match Selector::parse(selector) {
            Ok(parsed) => self.tree.read().matching(&parsed),
            Err(e) => {
                debug!(selector, error = %e, "Selector not supported by memory document");
                Vec::new()
            }
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        self.tree.read().is_attached(node)
    }

    fn kind(&self, node: NodeId) -> Option<ElementKind> {
        self.tree.read().kind(node)
    }

    fn form_entries(&self, form: NodeId) -> Vec<(String, String)> {
        let tree = self.tree.read();
        let mut controls = Vec::new();
        tree.descendants(form, false, &mut controls);

        let mut entries = Vec::new();
        for id in controls {
            let Some(data) = tree.nodes.get(&id) else {
                continue;
            };
            let name = match data.attribute("name") {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            if data.attribute("disabled").is_some() {
                continue;
            }

            match data.kind() {
                ElementKind::Input(input_type) if input_type.is_excluded_from_entries() => {}
                ElementKind::Input(InputType::Checkbox | InputType::Radio) => {
                    if data.checked {
                        entries.push((name, data.value.clone()));
                    }
                }
                ElementKind::Input(_) | ElementKind::TextArea => {
                    entries.push((name, data.value.clone()));
                }
                ElementKind::Select { .. } => {
                    for option in tree.options(id) {
                        if let Some(option) = tree.nodes.get(&option)
                            && option.selected
                        {
                            entries.push((name.clone(), option.value.clone()));
                        }
                    }
                }
                _ => {}
            }
        }
        entries
    }

    fn named_fields(&self, form: NodeId, name: &str) -> Vec<NodeId> {
        let tree = self.tree.read();
        let mut all = Vec::new();
        tree.descendants(form, false, &mut all);
        all.into_iter()
            .filter(|id| {
                tree.nodes
                    .get(id)
                    .is_some_and(|data| data.attribute("name") == Some(name))
            })
            .collect()
    }

    fn value(&self, node: NodeId) -> String {
        let tree = self.tree.read();
        match tree.kind(node) {
            Some(ElementKind::Select { .. }) => tree.select_value(node),
            Some(_) => tree.nodes[&node].value.clone(),
            None => String::new(),
        }
    }

    fn set_value(&self, node: NodeId, value: &str) {
        let mut tree = self.tree.write();
        match tree.kind(node) {
            Some(ElementKind::Select { .. }) => {
                let mut matched = false;
                for option in tree.options(node) {
                    if let Some(data) = tree.nodes.get_mut(&option) {
                        data.selected = !matched && data.value == value;
                        matched |= data.selected;
                    }
                }
            }
            Some(ElementKind::Input(input_type)) => {
                let sanitized = sanitize(&input_type, value);
                if let Some(data) = tree.nodes.get_mut(&node) {
                    data.value = sanitized;
                }
            }
            Some(_) => {
                if let Some(data) = tree.nodes.get_mut(&node) {
                    data.value = value.to_string();
                }
            }
            None => {}
        }
    }

    fn checked(&self, node: NodeId) -> bool {
        self.tree
            .read()
            .nodes
            .get(&node)
            .is_some_and(|data| data.checked)
    }

    fn set_checked(&self, node: NodeId, checked: bool) {
        if let Some(data) = self.tree.write().nodes.get_mut(&node) {
            data.checked = checked;
        }
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.tree.read().options(select)
    }

    fn selected(&self, option: NodeId) -> bool {
        self.tree
            .read()
            .nodes
            .get(&option)
            .is_some_and(|data| data.selected)
    }

    fn set_selected(&self, option: NodeId, selected: bool) {
        if let Some(data) = self.tree.write().nodes.get_mut(&option) {
            data.selected = selected;
        }
    }

    fn style(&self, node: NodeId, property: StyleProperty) -> String {
        self.tree
            .read()
            .nodes
            .get(&node)
            .and_then(|data| data.styles.get(&property).cloned())
            .unwrap_or_default()
    }

    fn set_style(&self, node: NodeId, property: StyleProperty, value: &str) {
        if let Some(data) = self.tree.write().nodes.get_mut(&node) {
            if value.is_empty() {
                data.styles.remove(&property);
            } else {
                data.styles.insert(property, value.to_string());
            }
        }
    }

    fn layout(&self, node: NodeId) -> Layout {
        let mut tree = self.tree.write();
        tree.layout_flushes += 1;
        tree.nodes
            .get(&node)
            .map(|data| data.layout)
            .unwrap_or_default()
    }

    fn set_inner_html(&self, node: NodeId, html: &str) {
        let mut tree = self.tree.write();
        let Some(data) = tree.nodes.get_mut(&node) else {
            return;
        };
        let old = std::mem::take(&mut data.children);
        if !html.is_empty() {
            data.children.push(Child::Markup(html.to_string()));
        }
        for child in old {
            if let Child::Element(id) = child {
                tree.detach(id);
            }
        }
    }

    fn set_outer_html(&self, node: NodeId, html: &str) {
        let mut tree = self.tree.write();
        let Some(parent) = tree.nodes.get(&node).and_then(|data| data.parent) else {
            debug!(node = %node, "Outer replacement of a detached node ignored");
            return;
        };
        if let Some(parent) = tree.nodes.get_mut(&parent)
            && let Some(index) = parent
                .children
                .iter()
                .position(|child| matches!(child, Child::Element(id) if *id == node))
        {
            if html.is_empty() {
                parent.children.remove(index);
            } else {
                parent.children[index] = Child::Markup(html.to_string());
            }
        }
        tree.detach(node);
    }

    fn insert_html(&self, node: NodeId, position: InsertPosition, html: &str) {
        if let Some(data) = self.tree.write().nodes.get_mut(&node) {
            let fragment = Child::Markup(html.to_string());
            match position {
                InsertPosition::AfterBegin => data.children.insert(0, fragment),
                InsertPosition::BeforeEnd => data.children.push(fragment),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_by_id_and_name() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.body(), "form", &[("id", "f")]);
        let input = doc.append(form, "input", &[("name", "email")]);

        assert_eq!(doc.query("#f"), Some(form));
        assert_eq!(doc.query(r#"input[name="email"]"#), Some(input));
        assert_eq!(doc.query("#missing"), None);
        assert_eq!(doc.query("form input"), None);
    }

    #[test]
    fn test_form_entries() {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.body(), "form", &[]);
        doc.append(form, "input", &[("name", "a"), ("value", "1")]);
        doc.append(form, "input", &[("name", "box"), ("type", "checkbox"), ("checked", "")]);
        doc.append(form, "input", &[("name", "off"), ("type", "checkbox")]);
        doc.append(form, "input", &[("name", "go"), ("type", "submit"), ("value", "Go")]);
        doc.append(form, "input", &[("name", "dis"), ("disabled", ""), ("value", "x")]);
        let select = doc.append(form, "select", &[("name", "s"), ("multiple", "")]);
        doc.append(select, "option", &[("value", "p"), ("selected", "")]);
        doc.append(select, "option", &[("value", "q")]);
        doc.append(select, "option", &[("value", "r"), ("selected", "")]);

        assert_eq!(
            doc.form_entries(form),
            vec![
                ("a".to_string(), "1".to_string()),
                ("box".to_string(), "on".to_string()),
                ("s".to_string(), "p".to_string()),
                ("s".to_string(), "r".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_set_value() {
        let doc = MemoryDocument::new();
        let select = doc.append(doc.body(), "select", &[]);
        let a = doc.append(select, "option", &[("value", "a"), ("selected", "")]);
        let b = doc.append(select, "option", &[("value", "b")]);

        doc.set_value(select, "b");
        assert!(!doc.selected(a));
        assert!(doc.selected(b));
        assert_eq!(doc.value(select), "b");

        doc.set_value(select, "zzz");
        assert_eq!(doc.value(select), "");
    }

    #[test]
    fn test_sanitizes_typed_inputs() {
        let doc = MemoryDocument::new();
        let date = doc.append(doc.body(), "input", &[("type", "date")]);
        let number = doc.append(doc.body(), "input", &[("type", "number")]);

        doc.set_value(date, "2024-02-30");
        assert_eq!(doc.value(date), "2024-02-30");
        doc.set_value(date, "yesterday");
        assert_eq!(doc.value(date), "");

        doc.set_value(number, "12.5");
        assert_eq!(doc.value(number), "12.5");
        doc.set_value(number, "abc");
        assert_eq!(doc.value(number), "");
    }

    #[test]
    fn test_insert_html_keeps_children() {
        let doc = MemoryDocument::new();
        let list = doc.append(doc.body(), "ul", &[("id", "list")]);
        let first = doc.append(list, "li", &[]);

        doc.insert_html(list, InsertPosition::BeforeEnd, "<li>x</li>");
        doc.insert_html(list, InsertPosition::AfterBegin, "<li>0</li>");

        assert_eq!(doc.inner_html(list), "<li>0</li><li></li><li>x</li>");
        assert!(doc.contains(first));
    }

    #[test]
    fn test_inner_html_detaches_children() {
        let doc = MemoryDocument::new();
        let div = doc.append(doc.body(), "div", &[]);
        let span = doc.append(div, "span", &[("id", "s")]);

        doc.set_inner_html(div, "<p>new</p>");

        assert!(!doc.contains(span));
        assert_eq!(doc.query("#s"), None);
        assert_eq!(doc.inner_html(div), "<p>new</p>");
    }

    #[test]
    fn test_outer_html_replaces_node() {
        let doc = MemoryDocument::new();
        let div = doc.append(doc.body(), "div", &[("id", "d")]);

        doc.set_outer_html(div, "<section>s</section>");

        assert!(!doc.contains(div));
        assert_eq!(doc.inner_html(doc.body()), "<section>s</section>");
    }

    #[test]
    fn test_style_roundtrip_and_layout_flush() {
        let doc = MemoryDocument::new();
        let div = doc.append(doc.body(), "div", &[]);
        doc.set_layout(
            div,
            Layout {
                scroll_height: 40,
                ..Layout::default()
            },
        );

        doc.set_style(div, StyleProperty::Opacity, "0.5");
        assert_eq!(doc.style(div, StyleProperty::Opacity), "0.5");
        doc.set_style(div, StyleProperty::Opacity, "");
        assert_eq!(doc.style(div, StyleProperty::Opacity), "");

        assert_eq!(doc.layout(div).scroll_height, 40);
        assert_eq!(doc.layout_flushes(), 1);
    }

    #[test]
    fn test_render_attributes() {
        let doc = MemoryDocument::new();
        let input = doc.append(doc.body(), "input", &[("name", "n"), ("value", "v")]);
        assert_eq!(doc.outer_html(input), r#"<input name="n" value="v">"#);
    }
}
