//! Arena-backed DOM tree for the memory driver.
//!
//! Nodes are never deallocated. Removing or replacing a node detaches its
//! subtree, so element references to it go stale exactly like they do in
//! a browser after a re-render.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::locator::By;

use super::css;

// ============================================================================
// Types
// ============================================================================

/// Index of a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Handler invoked when a node is clicked.
pub type ClickHandler = Arc<dyn Fn(&mut ClickContext<'_>) + Send + Sync>;

/// DOM mutation applied once its due time has passed.
pub(crate) struct Deferred {
    pub(crate) due: Instant,
    pub(crate) apply: Box<dyn FnOnce(&mut Dom) + Send>,
}

// ============================================================================
// Node
// ============================================================================

/// An element description, built with `with_*` methods and attached with
/// [`Dom::append`].
#[derive(Clone)]
pub struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    value: String,
    displayed: bool,
    enabled: bool,
    selected: bool,
    obscured: bool,
    on_click: Option<ClickHandler>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("tag", &self.tag)
            .field("id", &self.id)
            .field("classes", &self.classes)
            .field("text", &self.text)
            .field("displayed", &self.displayed)
            .field("enabled", &self.enabled)
            .field("selected", &self.selected)
            .field("obscured", &self.obscured)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Creates a visible, enabled element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            text: String::new(),
            value: String::new(),
            displayed: true,
            enabled: true,
            selected: false,
            obscured: false,
            on_click: None,
        }
    }

    /// Sets the `id` attribute.
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds one or more whitespace-separated classes.
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes
            .extend(class.split_whitespace().map(str::to_string));
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Sets the node's own text.
    #[inline]
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the form value.
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Marks the node as not rendered.
    #[inline]
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Marks the node as disabled.
    #[inline]
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Marks a checkbox, radio button or option as selected.
    #[inline]
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Marks the node as covered by another element.
    #[inline]
    #[must_use]
    pub fn obscured(mut self) -> Self {
        self.obscured = true;
        self
    }

    /// Sets the click handler.
    #[must_use]
    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ClickContext<'_>) + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Returns the lowercase tag name.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the node's own text.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the form value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` if the node has the class.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Returns the `id` attribute.
    #[inline]
    #[must_use]
    pub fn dom_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns an attribute, including synthesized `id` and `class`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            "class" => None,
            _ => self
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
        }
    }

    /// Returns `true` unless the node is disabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` if the checkbox, radio button or option is selected.
    #[inline]
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Returns `true` if another element covers the node.
    #[inline]
    #[must_use]
    pub fn is_obscured(&self) -> bool {
        self.obscured
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    /// Replaces the node's own text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Replaces the form value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Shows or hides the node.
    pub fn set_displayed(&mut self, displayed: bool) {
        self.displayed = displayed;
    }

    /// Enables or disables the node.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Selects or deselects the node.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Covers or uncovers the node.
    pub fn set_obscured(&mut self, obscured: bool) {
        self.obscured = obscured;
    }

    /// Sets or overwrites an attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "id" => self.id = Some(value),
            "class" => self.classes = value.split_whitespace().map(str::to_string).collect(),
            _ => match self.attrs.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => self.attrs.push((name, value)),
            },
        }
    }
}

// ============================================================================
// Dom
// ============================================================================

struct Slot {
    node: Node,
    element_id: ElementId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
    clicks: usize,
}

/// In-memory document.
///
/// The root is an `html` element. Query results are in document order.
pub struct Dom {
    slots: Vec<Slot>,
    by_element: FxHashMap<ElementId, NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl Dom {
    /// Creates a document with only the root element.
    #[must_use]
    pub fn new() -> Self {
        let mut dom = Self {
            slots: Vec::new(),
            by_element: FxHashMap::default(),
        };
        dom.insert(Node::new("html"), None);
        dom
    }

    /// Returns the root element.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.insert(node, Some(parent));
        self.slots[parent.0].children.push(id);
        id
    }

    /// Detaches `id` and its subtree from the document.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.slots[id.0].parent {
            self.slots[parent.0].children.retain(|c| *c != id);
        }
        self.detach(id);
    }

    /// Swaps `old` for a new node in the same position.
    ///
    /// The old subtree goes stale; the new node gets a fresh element ID.
    pub fn replace(&mut self, old: NodeId, node: Node) -> NodeId {
        let parent = self.slots[old.0].parent;
        let id = self.insert(node, parent);
        if let Some(parent) = parent {
            let children = &mut self.slots[parent.0].children;
            match children.iter().position(|c| *c == old) {
                Some(pos) => children[pos] = id,
                None => children.push(id),
            }
        }
        self.detach(old);
        id
    }

    /// Returns the node description.
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.slots[id.0].node
    }

    /// Returns the node description for mutation.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots[id.0].node
    }

    /// Shorthand for `node_mut(id).set_text(text)`.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.node_mut(id).set_text(text);
    }

    /// Returns the element reference handed out for `id`.
    #[inline]
    #[must_use]
    pub fn element_id(&self, id: NodeId) -> &ElementId {
        &self.slots[id.0].element_id
    }

    /// Resolves an element reference, attached or not.
    #[must_use]
    pub fn lookup(&self, element: &ElementId) -> Option<NodeId> {
        self.by_element.get(element).copied()
    }

    /// Returns `true` if the node is still in the document.
    #[inline]
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.slots[id.0].attached
    }

    /// Returns the parent element.
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    /// Returns the child elements.
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    /// Returns how many clicks (native or scripted) reached the node.
    #[inline]
    #[must_use]
    pub fn clicks(&self, id: NodeId) -> usize {
        self.slots[id.0].clicks
    }

    /// Returns `true` if the node and all its ancestors are rendered.
    #[must_use]
    pub fn is_displayed(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if !self.slots[node.0].node.displayed {
                return false;
            }
            current = self.slots[node.0].parent;
        }
        true
    }

    /// Returns rendered text: own text, then children, one line each.
    ///
    /// Hidden subtrees contribute nothing.
    #[must_use]
    pub fn visible_text(&self, id: NodeId) -> String {
        if !self.is_displayed(id) {
            return String::new();
        }
        let mut lines = Vec::new();
        self.collect_text(id, true, &mut lines);
        lines.join("\n")
    }

    /// Returns all text in the subtree, hidden or not.
    #[must_use]
    pub fn string_value(&self, id: NodeId) -> String {
        let mut lines = Vec::new();
        self.collect_text(id, false, &mut lines);
        lines.join(" ")
    }

    /// Returns descendants of `id` in document order, excluding `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.slots[id.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.slots[node.0].children.iter().rev().copied());
        }
        out
    }

    /// Finds attached elements matching `by`, in document order.
    ///
    /// With `scope` set, only descendants of `scope` are candidates.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSelector`] for XPath or malformed CSS.
    pub fn find(&self, scope: Option<NodeId>, by: &By) -> Result<Vec<NodeId>> {
        let candidates = match scope {
            Some(scope) => self.descendants(scope),
            None => {
                let mut all = vec![self.root()];
                all.extend(self.descendants(self.root()));
                all
            }
        };

        let matched = match by {
            By::Css(selector) => {
                let list = css::parse(selector)
                    .map_err(|message| Error::invalid_selector(by.to_string(), message))?;
                candidates
                    .into_iter()
                    .filter(|n| list.matches(self, *n))
                    .collect()
            }
            By::XPath(_) => {
                return Err(Error::invalid_selector(
                    by.to_string(),
                    "XPath is not supported by the memory driver",
                ));
            }
            By::Id(v) => self.filter(candidates, |n| n.id.as_deref() == Some(v.as_str())),
            By::Name(v) => self.filter(candidates, |n| n.attribute("name").as_deref() == Some(v.as_str())),
            By::Class(v) => self.filter(candidates, |n| n.has_class(v)),
            By::Tag(v) => self.filter(candidates, |n| n.tag.eq_ignore_ascii_case(v)),
            By::Text(v) => {
                let wanted = normalize_space(v);
                candidates
                    .into_iter()
                    .filter(|n| normalize_space(&self.string_value(*n)) == wanted)
                    .collect()
            }
            By::PartialText(v) => self.filter(candidates, |n| n.text.contains(v.as_str())),
            By::LinkText(v) => candidates
                .into_iter()
                .filter(|n| self.node(*n).tag == "a" && self.visible_text(*n).trim() == v.trim())
                .collect(),
            By::PartialLinkText(v) => candidates
                .into_iter()
                .filter(|n| self.node(*n).tag == "a" && self.visible_text(*n).contains(v.as_str()))
                .collect(),
        };
        Ok(matched)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn insert(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.slots.len());
        let element_id = ElementId::generate();
        self.by_element.insert(element_id.clone(), id);
        self.slots.push(Slot {
            node,
            element_id,
            parent,
            children: Vec::new(),
            attached: true,
            clicks: 0,
        });
        id
    }

    fn detach(&mut self, id: NodeId) {
        self.slots[id.0].attached = false;
        for child in self.descendants(id) {
            self.slots[child.0].attached = false;
        }
    }

    fn filter(&self, candidates: Vec<NodeId>, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        candidates
            .into_iter()
            .filter(|n| pred(&self.slots[n.0].node))
            .collect()
    }

    fn collect_text(&self, id: NodeId, visible_only: bool, out: &mut Vec<String>) {
        let slot = &self.slots[id.0];
        if visible_only && !slot.node.displayed {
            return;
        }
        let own = slot.node.text.trim();
        if !own.is_empty() {
            out.push(own.to_string());
        }
        for child in &slot.children {
            self.collect_text(*child, visible_only, out);
        }
    }

    pub(crate) fn record_click(&mut self, id: NodeId) -> Option<ClickHandler> {
        let slot = &mut self.slots[id.0];
        slot.clicks += 1;
        slot.node.on_click.clone()
    }
}

// ============================================================================
// ClickContext
// ============================================================================

/// What a click handler can see and change.
pub struct ClickContext<'a> {
    pub(crate) dom: &'a mut Dom,
    pub(crate) node: NodeId,
    pub(crate) now: Instant,
    pub(crate) deferred: &'a mut Vec<Deferred>,
    pub(crate) url: &'a mut String,
}

impl ClickContext<'_> {
    /// Returns the clicked node.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the document.
    #[inline]
    #[must_use]
    pub fn dom(&self) -> &Dom {
        &*self.dom
    }

    /// Returns the document for immediate mutation.
    #[inline]
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut *self.dom
    }

    /// Changes the reported URL, as a link or form submit would.
    pub fn navigate(&mut self, url: impl Into<String>) {
        *self.url = url.into();
    }

    /// Schedules a mutation `delay` after the click.
    pub fn after<F>(&mut self, delay: Duration, apply: F)
    where
        F: FnOnce(&mut Dom) + Send + 'static,
    {
        self.deferred.push(Deferred {
            due: self.now + delay,
            apply: Box::new(apply),
        });
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> (Dom, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        let cart = dom.append(root, Node::new("div").with_class("float-cart"));
        let item = dom.append(cart, Node::new("div").with_class("shelf-item"));
        dom.append(item, Node::new("p").with_class("title").with_text("iPhone 12"));
        dom.append(item, Node::new("p").with_text("Quantity: 1"));
        (dom, cart, item)
    }

    #[test]
    fn test_visible_text_joins_lines() {
        let (dom, _, item) = cart();
        assert_eq!(dom.visible_text(item), "iPhone 12\nQuantity: 1");
    }

    #[test]
    fn test_hidden_subtree_has_no_text() {
        let (mut dom, cart, item) = cart();
        dom.node_mut(cart).set_displayed(false);
        assert!(!dom.is_displayed(item));
        assert_eq!(dom.visible_text(item), "");
        assert!(dom.string_value(item).contains("iPhone"));
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let (mut dom, cart, item) = cart();
        let title = dom.children(item)[0];
        dom.remove(item);
        assert!(!dom.is_attached(item));
        assert!(!dom.is_attached(title));
        assert!(dom.children(cart).is_empty());
        assert!(dom.find(None, &By::css(".title")).unwrap().is_empty());
    }

    #[test]
    fn test_replace_keeps_position_and_new_reference() {
        let (mut dom, cart, item) = cart();
        let old_ref = dom.element_id(item).clone();
        let new = dom.replace(item, Node::new("div").with_class("shelf-item"));
        assert_eq!(dom.children(cart), &[new]);
        assert_ne!(dom.element_id(new), &old_ref);
        assert_eq!(dom.lookup(&old_ref), Some(item));
        assert!(!dom.is_attached(item));
    }

    #[test]
    fn test_find_scoped_excludes_scope() {
        let (dom, cart, _) = cart();
        let found = dom.find(Some(cart), &By::css("div")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(!found.contains(&cart));
    }

    #[test]
    fn test_find_text_strategies() {
        let (dom, _, _) = cart();
        let exact = dom.find(None, &By::text("  iPhone   12 ")).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(dom.node(exact[0]).tag(), "p");

        let partial = dom.find(None, &By::partial_text("Quantity")).unwrap();
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn test_xpath_is_invalid_selector() {
        let (dom, _, _) = cart();
        let err = dom.find(None, &By::xpath("//div")).unwrap_err();
        assert!(matches!(err, Error::InvalidSelector { .. }));
    }

    #[test]
    fn test_set_attr_updates_class_and_id() {
        let mut node = Node::new("BUTTON").with_attr("class", "a b").with_attr("id", "go");
        assert_eq!(node.tag(), "button");
        assert!(node.has_class("b"));
        assert_eq!(node.dom_id(), Some("go"));
        node.set_attr("data-qty", "2");
        node.set_attr("data-qty", "3");
        assert_eq!(node.attribute("data-qty").as_deref(), Some("3"));
    }
}
