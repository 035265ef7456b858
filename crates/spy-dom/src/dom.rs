//! The document interface consumed by the scrollspy engine
//!
//! Implementors supply element primitives (tree navigation, attributes,
//! classes, geometry, scroll metrics) plus listener and observer
//! registration. Queries built on top of those primitives are provided.

use std::fmt::Debug;
use std::hash::Hash;

use crate::event::{
    EventCallback, EventKind, EventTarget, ListenerId, MutationCallback, ObserveOptions,
    ObserverId,
};
use crate::selector::{Compound, Selector};

/// A resolved scroll container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scroller<N> {
    /// The document scrolls in the top-level window
    Window,
    /// A scrollable element
    Element(N),
}

impl<N: Copy> Scroller<N> {
    /// Whether this is the window
    pub fn is_window(&self) -> bool {
        matches!(self, Scroller::Window)
    }

    /// The element, if this is not the window
    pub fn element(&self) -> Option<N> {
        match self {
            Scroller::Window => None,
            Scroller::Element(node) => Some(*node),
        }
    }

    /// The event target scroll events arrive on
    pub fn event_target(&self) -> EventTarget<N> {
        match self {
            Scroller::Window => EventTarget::Window,
            Scroller::Element(node) => EventTarget::Element(*node),
        }
    }
}

/// Document access required by scroll tracking
pub trait Dom {
    /// Element handle
    type Node: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// The document element (`<html>`)
    fn document_element(&self) -> Self::Node;

    /// The `<body>` element, if present
    fn body(&self) -> Option<Self::Node>;

    /// Parent element
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Child elements in document order
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Upper-case tag name
    fn tag_name(&self, node: Self::Node) -> String;

    /// Attribute value
    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Whether the element carries a class
    fn has_class(&self, node: Self::Node, class: &str) -> bool;

    /// Add a class (no-op when already present)
    fn add_class(&mut self, node: Self::Node, class: &str);

    /// Remove a class (no-op when absent)
    fn remove_class(&mut self, node: Self::Node, class: &str);

    /// Whether the element is attached and rendered with a non-empty box
    fn is_visible(&self, node: Self::Node) -> bool;

    /// Top edge relative to the document
    fn offset_top(&self, node: Self::Node) -> f64;

    /// Top edge relative to the element's offset parent
    fn position_top(&self, node: Self::Node) -> f64;

    /// Rendered (bounding box) height
    fn bounding_height(&self, node: Self::Node) -> f64;

    /// Scroll offset of an element
    fn scroll_top(&self, node: Self::Node) -> f64;

    /// Content height of an element (0 when unknown)
    fn scroll_height(&self, node: Self::Node) -> f64;

    /// Vertical scroll offset of the window
    fn window_scroll_y(&self) -> f64;

    /// Inner height of the window
    fn window_inner_height(&self) -> f64;

    /// Register an event listener
    fn add_listener(
        &mut self,
        target: EventTarget<Self::Node>,
        kind: EventKind,
        callback: EventCallback,
    ) -> ListenerId;

    /// Remove an event listener (unknown ids are ignored)
    fn remove_listener(&mut self, id: ListenerId);

    /// Observe changes in a subtree
    fn observe(
        &mut self,
        node: Self::Node,
        options: ObserveOptions,
        callback: MutationCallback,
    ) -> ObserverId;

    /// Stop an observer (unknown ids are ignored)
    fn disconnect(&mut self, id: ObserverId);

    /// Whether the element matches a selector
    fn matches(&self, node: Self::Node, selector: &Selector) -> bool {
        selector.alternatives().iter().any(|compound| self.matches_compound(node, compound))
    }

    /// Whether the element matches a single compound selector
    fn matches_compound(&self, node: Self::Node, compound: &Compound) -> bool {
        if let Some(tag) = &compound.tag {
            if !self.tag_name(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if self.attribute(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        compound.classes.iter().all(|class| self.has_class(node, class))
            && compound
                .attributes
                .iter()
                .all(|attr| attr.test(self.attribute(node, &attr.name).as_deref()))
    }

    /// All descendants of `root` matching `selector`, in document order
    fn query_all(&self, root: Self::Node, selector: &Selector) -> Vec<Self::Node> {
        let mut found = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.matches(node, selector) {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    /// First descendant of `root` matching `selector`
    fn query(&self, root: Self::Node, selector: &Selector) -> Option<Self::Node> {
        let mut stack: Vec<Self::Node> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.matches(node, selector) {
                return Some(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        None
    }

    /// Nearest ancestor (excluding `node` itself) matching `selector`
    fn closest(&self, node: Self::Node, selector: &Selector) -> Option<Self::Node> {
        let mut current = self.parent(node);
        while let Some(candidate) = current {
            if self.matches(candidate, selector) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// The element immediately before `node` among its siblings
    fn previous_element_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|sibling| *sibling == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Look up a selector across the whole document
    fn select(&self, selector: &Selector) -> Option<Self::Node> {
        let root = self.document_element();
        if self.matches(root, selector) {
            return Some(root);
        }
        self.query(root, selector)
    }

    /// Scroll offset of a scroll container
    fn scroller_top(&self, scroller: Scroller<Self::Node>) -> f64 {
        match scroller {
            Scroller::Window => self.window_scroll_y(),
            Scroller::Element(node) => self.scroll_top(node),
        }
    }

    /// Content height of a scroll container
    ///
    /// Falls back to the larger of the body and document element heights when
    /// the container reports none (always the case for the window).
    fn scroller_height(&self, scroller: Scroller<Self::Node>) -> f64 {
        let own = match scroller {
            Scroller::Window => 0.0,
            Scroller::Element(node) => self.scroll_height(node),
        };
        if own > 0.0 {
            return own;
        }
        let body = self.body().map_or(0.0, |body| self.scroll_height(body));
        body.max(self.scroll_height(self.document_element()))
    }

    /// Visible height of a scroll container
    fn scroller_viewport(&self, scroller: Scroller<Self::Node>) -> f64 {
        match scroller {
            Scroller::Window => self.window_inner_height(),
            Scroller::Element(node) => self.bounding_height(node),
        }
    }
}
