//! Active marker application
//!
//! The reducer owns the `active` class on navigation elements under the spy
//! root. Applying a target always clears the previous marks first, so at
//! most one target is shown as active.

use serde::Serialize;

use spy_dom::{AttributeMatch, Dom, Selector};

use crate::resolver::{link_selector, CLASS_DROPDOWN_ITEM, CLASS_LIST_GROUP_ITEM, CLASS_NAV_LINK};

/// Class applied to active elements
pub const CLASS_ACTIVE: &str = "active";

/// Emitted when a target becomes active and at least one link was marked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation<N> {
    /// Activated target id, including the leading `#`
    pub target: String,
    /// Links pointing at the target
    pub links: Vec<N>,
}

/// Applies and clears active markers
#[derive(Debug, Clone)]
pub struct ActivationReducer<N> {
    links: Selector,
    clearable: Selector,
    nav_list_group: Selector,
    nav_links: Selector,
    nav_items: Selector,
    nav_or_list_items: Selector,
    dropdown: Selector,
    dropdown_toggle: Selector,
    marked: Vec<N>,
}

impl<N: Copy + Eq> Default for ActivationReducer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq> ActivationReducer<N> {
    /// Create a reducer with no marks
    pub fn new() -> Self {
        Self {
            links: link_selector(),
            clearable: link_selector().or(Selector::any_class(&["nav-item"])),
            nav_list_group: Selector::any_class(&["nav", "list-group"]),
            nav_links: Selector::any_class(&[CLASS_NAV_LINK]),
            nav_items: Selector::any_class(&["nav-item"]),
            nav_or_list_items: Selector::any_class(&[CLASS_NAV_LINK, CLASS_LIST_GROUP_ITEM]),
            dropdown: Selector::any_class(&["dropdown", "dropup"]),
            dropdown_toggle: Selector::any_class(&["dropdown-toggle"]),
            marked: Vec::new(),
        }
    }

    /// Elements currently marked by this reducer
    pub fn marked(&self) -> &[N] {
        &self.marked
    }

    /// Remove the active marker from every element this reducer owns
    ///
    /// Covers all links and nav items under `root`, plus anything marked
    /// earlier outside of it. Returns the number of elements cleared.
    pub fn clear<D: Dom<Node = N>>(&mut self, dom: &mut D, root: N) -> usize {
        let mut owned: Vec<N> = dom
            .query_all(root, &self.clearable)
            .into_iter()
            .filter(|el| dom.has_class(*el, CLASS_ACTIVE))
            .collect();
        for el in self.marked.drain(..) {
            if !owned.contains(&el) && dom.has_class(el, CLASS_ACTIVE) {
                owned.push(el);
            }
        }
        for el in &owned {
            dom.remove_class(*el, CLASS_ACTIVE);
        }
        owned.len()
    }

    /// Clear previous marks, then mark everything that points at `target`
    pub fn activate<D: Dom<Node = N>>(&mut self, dom: &mut D, root: N, target: &str) -> Activation<N> {
        self.clear(dom, root);

        let selector = self.links.clone().with_attribute(AttributeMatch::suffix("href", target));
        let links = dom.query_all(root, &selector);

        for &link in &links {
            if dom.has_class(link, CLASS_DROPDOWN_ITEM) {
                if let Some(dropdown) = dom.closest(link, &self.dropdown) {
                    let toggle = dom.query(dropdown, &self.dropdown_toggle);
                    self.set_active(dom, toggle);
                }
                self.set_active(dom, Some(link));
                continue;
            }

            self.set_active(dom, Some(link));
            if let Some(parent) = dom.parent(link) {
                if dom.matches(parent, &self.nav_items) {
                    self.set_active(dom, Some(parent));
                }
            }

            // A parent section's link is the previous sibling of any nav or
            // list group ancestor
            let mut el = Some(link);
            while let Some(current) = el {
                el = dom.closest(current, &self.nav_list_group);
                let sibling = el.and_then(|group| dom.previous_element_sibling(group));
                let Some(sibling) = sibling else {
                    continue;
                };
                if dom.matches(sibling, &self.nav_or_list_items) {
                    self.set_active(dom, Some(sibling));
                }
                if dom.matches(sibling, &self.nav_items) {
                    let nested = dom.query(sibling, &self.nav_links);
                    self.set_active(dom, nested);
                    self.set_active(dom, Some(sibling));
                }
            }
        }

        tracing::debug!(target = %target, links = links.len(), "activated scroll target");
        Activation { target: target.to_string(), links }
    }

    fn set_active<D: Dom<Node = N>>(&mut self, dom: &mut D, el: Option<N>) {
        let Some(el) = el else {
            return;
        };
        dom.add_class(el, CLASS_ACTIVE);
        if !self.marked.contains(&el) {
            self.marked.push(el);
        }
    }
}
