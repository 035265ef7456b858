//! Target resolution
//!
//! Scans the navigation root for link-like elements, resolves each fragment
//! reference to a visible element inside the scroll container and builds an
//! ascending, deduplicated offset table.

use serde::Serialize;
use std::collections::HashSet;

use spy_dom::{Dom, Scroller, Selector};

use crate::config::OffsetMethod;

/// Class of navigation links
pub const CLASS_NAV_LINK: &str = "nav-link";
/// Class of list group items
pub const CLASS_LIST_GROUP_ITEM: &str = "list-group-item";
/// Class of dropdown items
pub const CLASS_DROPDOWN_ITEM: &str = "dropdown-item";

/// Classes that make an element a tracked link
pub const LINK_CLASSES: [&str; 3] = [CLASS_NAV_LINK, CLASS_LIST_GROUP_ITEM, CLASS_DROPDOWN_ITEM];

/// Selector for tracked links
pub fn link_selector() -> Selector {
    Selector::any_class(&LINK_CLASSES)
}

/// A link's resolved target and its vertical offset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkTarget {
    /// Target id including the leading `#`
    pub id: String,
    /// Offset in the scroll container's coordinate space
    pub offset: f64,
}

/// Result of a resolver pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// Targets in ascending offset order, unique by id
    pub targets: Vec<LinkTarget>,
    /// Scroll container content height at resolution time
    pub scroll_height: f64,
}

/// Extract the same-document fragment (`#id`) from an href
///
/// The fragment is everything after the last `#`; hrefs without one, or
/// ending in a bare `#`, yield `None`.
pub fn fragment_id(href: &str) -> Option<String> {
    let (_, fragment) = href.rsplit_once('#')?;
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return None;
    }
    Some(format!("#{}", fragment))
}

/// Resolve `Auto` against the container kind
pub fn effective_method<N: Copy>(method: OffsetMethod, scroller: Scroller<N>) -> OffsetMethod {
    match method {
        OffsetMethod::Auto if scroller.is_window() => OffsetMethod::Offset,
        OffsetMethod::Auto => OffsetMethod::Position,
        other => other,
    }
}

/// Build the offset table for the links under `root`
pub fn resolve<D: Dom>(
    dom: &D,
    root: D::Node,
    scroller: Scroller<D::Node>,
    method: OffsetMethod,
) -> Resolution {
    let method = effective_method(method, scroller);
    let offset_base = match method {
        OffsetMethod::Position => dom.scroller_top(scroller),
        _ => 0.0,
    };

    let mut candidates: Vec<LinkTarget> = dom
        .query_all(root, &link_selector())
        .into_iter()
        .filter_map(|link| dom.attribute(link, "href"))
        .filter_map(|href| fragment_id(&href))
        .filter_map(|id| {
            let selector = Selector::id(&id[1..]);
            let target = match scroller {
                Scroller::Window => dom.select(&selector),
                Scroller::Element(container) => dom.query(container, &selector),
            }?;
            if !dom.is_visible(target) {
                tracing::trace!(%id, "skipping hidden target");
                return None;
            }
            let top = match method {
                OffsetMethod::Position => dom.position_top(target),
                _ => dom.offset_top(target),
            };
            let top = if top.is_finite() { top.trunc() } else { 0.0 };
            Some(LinkTarget { id, offset: top + offset_base })
        })
        .collect();

    candidates.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    let mut seen = HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.id.clone()));

    Resolution { targets: candidates, scroll_height: dom.scroller_height(scroller) }
}
