//! In-memory document
//!
//! An arena-backed element tree with enough layout information to drive
//! scroll tracking without a browser. Each element has a `top` relative to
//! its parent's content origin and a `height`; scrollable elements carry a
//! content height and a scroll offset. Mutations made through this type
//! notify registered subtree observers, and [`Document::dispatch`] invokes
//! registered listeners.

use std::collections::BTreeMap;
use std::fmt;

use crate::dom::{Dom, Scroller};
use crate::event::{
    EventCallback, EventKind, EventTarget, ListenerId, MutationCallback, MutationKind,
    ObserveOptions, ObserverId,
};
use crate::{DomError, Result};

/// Element handle in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    hidden: bool,
    positioned: bool,
    top: f64,
    height: f64,
    scroll_height: f64,
    scroll_top: f64,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            text: String::new(),
            hidden: false,
            positioned: false,
            top: 0.0,
            height: 0.0,
            scroll_height: 0.0,
            scroll_top: 0.0,
        }
    }
}

struct Listener {
    id: ListenerId,
    target: EventTarget<NodeId>,
    kind: EventKind,
    callback: EventCallback,
}

struct Observer {
    id: ObserverId,
    node: NodeId,
    options: ObserveOptions,
    callback: MutationCallback,
}

/// In-memory element tree implementing [`Dom`]
pub struct Document {
    nodes: Vec<NodeData>,
    html: NodeId,
    body: NodeId,
    window_scroll_y: f64,
    window_inner_height: f64,
    listeners: Vec<Listener>,
    observers: Vec<Observer>,
    next_handle: u64,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("window_scroll_y", &self.window_scroll_y)
            .field("window_inner_height", &self.window_inner_height)
            .field("listeners", &self.listeners.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing `<html><body></body></html>`
    pub fn new() -> Self {
        let mut html = NodeData::new("html");
        html.children.push(NodeId(1));
        let mut body = NodeData::new("body");
        body.parent = Some(NodeId(0));
        Self {
            nodes: vec![html, body],
            html: NodeId(0),
            body: NodeId(1),
            window_scroll_y: 0.0,
            window_inner_height: 0.0,
            listeners: Vec::new(),
            observers: Vec::new(),
            next_handle: 1,
        }
    }

    /// The `<body>` element
    pub fn body_node(&self) -> NodeId {
        self.body
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let node = self.create_element(tag);
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Append `child` to `parent`, detaching it from any previous parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(DomError::UnknownNode(format!("{} cannot contain {}", parent, child)));
        }
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|c| *c != child);
            self.notify(old_parent, &MutationKind::ChildList);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.notify(parent, &MutationKind::ChildList);
        Ok(())
    }

    /// Detach `child` from its parent
    pub fn remove(&mut self, child: NodeId) -> Result<()> {
        self.check(child)?;
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != child);
            self.notify(parent, &MutationKind::ChildList);
        }
        Ok(())
    }

    /// Set an attribute (`class` is routed to the class list)
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.check(node)?;
        if name == "class" {
            self.nodes[node.0].classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            self.nodes[node.0].attributes.insert(name.to_string(), value.to_string());
        }
        self.notify(node, &MutationKind::Attribute(name.to_string()));
        Ok(())
    }

    /// Remove an attribute
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.check(node)?;
        if self.nodes[node.0].attributes.remove(name).is_some() {
            self.notify(node, &MutationKind::Attribute(name.to_string()));
        }
        Ok(())
    }

    /// Replace text content
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.check(node)?;
        self.nodes[node.0].text = text.to_string();
        self.notify(node, &MutationKind::CharacterData);
        Ok(())
    }

    /// Text content
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.text.as_str())
    }

    /// Set layout: top relative to the parent's content origin, and height
    pub fn set_layout(&mut self, node: NodeId, top: f64, height: f64) -> Result<()> {
        self.check(node)?;
        let data = &mut self.nodes[node.0];
        data.top = top;
        data.height = height;
        self.notify(node, &MutationKind::Attribute("style".to_string()));
        Ok(())
    }

    /// Make `node` a scroll container with the given content height
    pub fn set_scroll_height(&mut self, node: NodeId, height: f64) -> Result<()> {
        self.check(node)?;
        self.nodes[node.0].scroll_height = height;
        Ok(())
    }

    /// Mark `node` as positioned, making it an offset parent
    pub fn set_positioned(&mut self, node: NodeId, positioned: bool) -> Result<()> {
        self.check(node)?;
        self.nodes[node.0].positioned = positioned;
        Ok(())
    }

    /// Hide or show an element (`display: none`)
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) -> Result<()> {
        self.check(node)?;
        self.nodes[node.0].hidden = hidden;
        self.notify(node, &MutationKind::Attribute("style".to_string()));
        Ok(())
    }

    /// Set the window's inner height without dispatching an event
    pub fn set_window_height(&mut self, height: f64) {
        self.window_inner_height = height;
    }

    /// Scroll a container, clamped to its scrollable range, and dispatch `scroll`
    pub fn scroll_to(&mut self, scroller: Scroller<NodeId>, y: f64) -> Result<()> {
        let max = (self.scroller_height(scroller) - self.scroller_viewport(scroller)).max(0.0);
        let y = y.clamp(0.0, max);
        match scroller {
            Scroller::Window => self.window_scroll_y = y,
            Scroller::Element(node) => {
                self.check(node)?;
                self.nodes[node.0].scroll_top = y;
            }
        }
        self.dispatch(scroller.event_target(), EventKind::Scroll);
        Ok(())
    }

    /// Resize the window and dispatch `resize`
    pub fn resize_window(&mut self, height: f64) {
        self.window_inner_height = height;
        self.dispatch(EventTarget::Window, EventKind::Resize);
    }

    /// Invoke every listener registered for `kind` on `target`
    pub fn dispatch(&self, target: EventTarget<NodeId>, kind: EventKind) {
        tracing::trace!(?target, %kind, "dispatching event");
        for listener in &self.listeners {
            if listener.target == target && listener.kind == kind {
                (listener.callback)(kind);
            }
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Elements carrying a class, in document order
    pub fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        let selector = crate::Selector::any_class(&[class]);
        self.query_all(self.html, &selector)
    }

    fn check(&self, node: NodeId) -> Result<()> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(DomError::UnknownNode(node.to_string()))
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes[node.0].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent.0].parent;
        }
        false
    }

    fn is_attached(&self, node: NodeId) -> bool {
        node == self.html || self.is_ancestor(self.html, node)
    }

    fn notify(&self, node: NodeId, kind: &MutationKind) {
        for observer in &self.observers {
            let in_scope = observer.node == node
                || (observer.options.subtree && self.is_ancestor(observer.node, node));
            if in_scope && observer.options.accepts(kind) {
                (observer.callback)(kind);
            }
        }
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn offset_parent(&self, node: NodeId) -> NodeId {
        let mut current = self.nodes[node.0].parent;
        while let Some(parent) = current {
            if parent == self.body || self.nodes[parent.0].positioned {
                return parent;
            }
            current = self.nodes[parent.0].parent;
        }
        self.body
    }
}

impl Dom for Document {
    type Node = NodeId;

    fn document_element(&self) -> NodeId {
        self.html
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.get(node.0).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.nodes.get(node.0).map(|n| n.tag.clone()).unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let data = self.nodes.get(node.0)?;
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attributes.get(name).cloned()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes.get(node.0).is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let Some(data) = self.nodes.get_mut(node.0) else {
            return;
        };
        if !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
            self.notify(node, &MutationKind::Attribute("class".to_string()));
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(data) = self.nodes.get_mut(node.0) else {
            return;
        };
        let before = data.classes.len();
        data.classes.retain(|c| c != class);
        if data.classes.len() != before {
            self.notify(node, &MutationKind::Attribute("class".to_string()));
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        if node.0 >= self.nodes.len() || !self.is_attached(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if self.nodes[n.0].hidden {
                return false;
            }
            current = self.nodes[n.0].parent;
        }
        self.nodes[node.0].height > 0.0
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        let Some(data) = self.nodes.get(node.0) else {
            return 0.0;
        };
        let mut top = data.top;
        let mut current = data.parent;
        while let Some(parent) = current {
            let parent_data = &self.nodes[parent.0];
            top += parent_data.top - parent_data.scroll_top;
            current = parent_data.parent;
        }
        top
    }

    fn position_top(&self, node: NodeId) -> f64 {
        if node.0 >= self.nodes.len() {
            return 0.0;
        }
        let parent = self.offset_parent(node);
        self.offset_top(node) - self.offset_top(parent)
    }

    fn bounding_height(&self, node: NodeId) -> f64 {
        self.nodes.get(node.0).map_or(0.0, |n| n.height)
    }

    fn scroll_top(&self, node: NodeId) -> f64 {
        self.nodes.get(node.0).map_or(0.0, |n| n.scroll_top)
    }

    fn scroll_height(&self, node: NodeId) -> f64 {
        self.nodes.get(node.0).map_or(0.0, |n| n.scroll_height)
    }

    fn window_scroll_y(&self) -> f64 {
        self.window_scroll_y
    }

    fn window_inner_height(&self) -> f64 {
        self.window_inner_height
    }

    fn add_listener(
        &mut self,
        target: EventTarget<NodeId>,
        kind: EventKind,
        callback: EventCallback,
    ) -> ListenerId {
        let id = ListenerId(self.next_handle());
        self.listeners.push(Listener { id, target, kind, callback });
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|l| l.id != id);
    }

    fn observe(
        &mut self,
        node: NodeId,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> ObserverId {
        let id = ObserverId(self.next_handle());
        self.observers.push(Observer { id, node, options, callback });
        id
    }

    fn disconnect(&mut self, id: ObserverId) {
        self.observers.retain(|o| o.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Selector;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, MutationCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: MutationCallback = Arc::new(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_query_all_document_order() {
        let mut doc = Document::new();
        let nav = doc.append_element(doc.body_node(), "nav").unwrap();
        let a = doc.append_element(nav, "a").unwrap();
        let b = doc.append_element(nav, "a").unwrap();
        let inner = doc.append_element(a, "span").unwrap();
        doc.set_attribute(a, "class", "nav-link").unwrap();
        doc.set_attribute(b, "class", "nav-link").unwrap();
        doc.set_attribute(inner, "class", "nav-link").unwrap();

        let found = doc.query_all(nav, &Selector::parse(".nav-link").unwrap());
        assert_eq!(found, vec![a, inner, b]);
    }

    #[test]
    fn test_closest_excludes_self() {
        let mut doc = Document::new();
        let outer = doc.append_element(doc.body_node(), "ul").unwrap();
        let inner = doc.append_element(outer, "ul").unwrap();
        doc.set_attribute(outer, "class", "nav").unwrap();
        doc.set_attribute(inner, "class", "nav").unwrap();

        let nav = Selector::parse(".nav").unwrap();
        assert_eq!(doc.closest(inner, &nav), Some(outer));
        assert_eq!(doc.closest(outer, &nav), None);
    }

    #[test]
    fn test_previous_element_sibling() {
        let mut doc = Document::new();
        let first = doc.append_element(doc.body_node(), "a").unwrap();
        let second = doc.append_element(doc.body_node(), "ul").unwrap();
        assert_eq!(doc.previous_element_sibling(second), Some(first));
        assert_eq!(doc.previous_element_sibling(first), None);
    }

    #[test]
    fn test_geometry_with_scrolled_container() {
        let mut doc = Document::new();
        let scroller = doc.append_element(doc.body_node(), "div").unwrap();
        doc.set_layout(scroller, 100.0, 400.0).unwrap();
        doc.set_scroll_height(scroller, 2000.0).unwrap();
        doc.set_positioned(scroller, true).unwrap();
        let section = doc.append_element(scroller, "section").unwrap();
        doc.set_layout(section, 700.0, 300.0).unwrap();

        assert_eq!(doc.offset_top(section), 800.0);
        assert_eq!(doc.position_top(section), 700.0);

        doc.scroll_to(Scroller::Element(scroller), 250.0).unwrap();
        assert_eq!(doc.offset_top(section), 550.0);
        assert_eq!(doc.position_top(section), 450.0);
    }

    #[test]
    fn test_scroll_to_clamps() {
        let mut doc = Document::new();
        let scroller = doc.append_element(doc.body_node(), "div").unwrap();
        doc.set_layout(scroller, 0.0, 400.0).unwrap();
        doc.set_scroll_height(scroller, 1000.0).unwrap();
        doc.scroll_to(Scroller::Element(scroller), 5000.0).unwrap();
        assert_eq!(doc.scroll_top(scroller), 600.0);
    }

    #[test]
    fn test_visibility() {
        let mut doc = Document::new();
        let wrapper = doc.append_element(doc.body_node(), "div").unwrap();
        let section = doc.append_element(wrapper, "section").unwrap();
        doc.set_layout(section, 0.0, 100.0).unwrap();
        assert!(doc.is_visible(section));

        doc.set_hidden(wrapper, true).unwrap();
        assert!(!doc.is_visible(section));

        let detached = doc.create_element("section");
        doc.set_layout(detached, 0.0, 100.0).unwrap();
        assert!(!doc.is_visible(detached));
    }

    #[test]
    fn test_observer_respects_filter_and_subtree() {
        let mut doc = Document::new();
        let nav = doc.append_element(doc.body_node(), "nav").unwrap();
        let link = doc.append_element(nav, "a").unwrap();
        let (count, callback) = counter();
        let options = ObserveOptions {
            subtree: true,
            child_list: true,
            attributes: true,
            attribute_filter: Some(vec!["href".to_string()]),
            ..ObserveOptions::default()
        };
        let id = doc.observe(nav, options, callback);

        doc.set_attribute(link, "href", "#a").unwrap();
        doc.add_class(link, "active");
        doc.append_element(nav, "a").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        doc.disconnect(id);
        doc.set_attribute(link, "href", "#b").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_listener_dispatch_and_removal() {
        let mut doc = Document::new();
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let id = doc.add_listener(
            EventTarget::Window,
            EventKind::Resize,
            Arc::new(move |_| {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        );

        doc.resize_window(600.0);
        doc.dispatch(EventTarget::Window, EventKind::Scroll);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        doc.remove_listener(id);
        doc.resize_window(700.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_window_height_fallback() {
        let mut doc = Document::new();
        let body = doc.body_node();
        doc.set_scroll_height(body, 3000.0).unwrap();
        assert_eq!(doc.scroller_height(Scroller::Window), 3000.0);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let mut doc = Document::new();
        let outer = doc.append_element(doc.body_node(), "div").unwrap();
        let inner = doc.append_element(outer, "div").unwrap();
        assert!(doc.append_child(inner, outer).is_err());
    }
}
