//! Scrollspy Integration Tests
//!
//! End-to-end tests driving spies through document events.

use parking_lot::Mutex;
use scrollspy::engine::reducer::CLASS_ACTIVE;
use scrollspy::{
    ActivationBus, Document, Dom, NodeId, OffsetMethod, ScrollSpy, Scroller, SpyConfig, SpyError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Layout {
    dom: Arc<Mutex<Document>>,
    nav: NodeId,
    scroller: NodeId,
    links: Vec<NodeId>,
}

/// Navigation plus a positioned scroll container with one section per top
fn layout(tops: &[f64], viewport: f64, content: f64) -> Layout {
    let mut doc = Document::new();
    let body = doc.body_node();
    let nav = doc.append_element(body, "nav").unwrap();
    doc.set_attribute(nav, "class", "nav").unwrap();
    let scroller = doc.append_element(body, "div").unwrap();
    doc.set_attribute(scroller, "id", "content").unwrap();
    doc.set_positioned(scroller, true).unwrap();
    doc.set_layout(scroller, 0.0, viewport).unwrap();
    doc.set_scroll_height(scroller, content).unwrap();

    let mut links = Vec::new();
    for (i, top) in tops.iter().enumerate() {
        let link = doc.append_element(nav, "a").unwrap();
        doc.set_attribute(link, "class", "nav-link").unwrap();
        doc.set_attribute(link, "href", &format!("#s{}", i)).unwrap();
        links.push(link);
        let section = doc.append_element(scroller, "section").unwrap();
        doc.set_attribute(section, "id", &format!("s{}", i)).unwrap();
        doc.set_layout(section, *top, 200.0).unwrap();
    }
    Layout { dom: Arc::new(Mutex::new(doc)), nav, scroller, links }
}

async fn settle(spy: &ScrollSpy<Document>) {
    spy.flush().await.unwrap();
    time::advance(Duration::from_millis(100)).await;
    spy.flush().await.unwrap();
}

async fn scroll_to(spy: &ScrollSpy<Document>, scroller: Scroller<NodeId>, y: f64) -> Option<String> {
    spy.dom().lock().scroll_to(scroller, y).unwrap();
    spy.active_target().await.unwrap()
}

fn active_links(layout: &Layout) -> Vec<NodeId> {
    layout.dom.lock().elements_with_class(CLASS_ACTIVE)
}

/// Test the three-section walk through an element scroll container
#[tokio::test(start_paused = true)]
async fn test_element_scroller_scenario() {
    init_tracing();
    let page = layout(&[0.0, 500.0, 1200.0], 800.0, 2000.0);
    let config = SpyConfig::default().with_selector("#content");
    let spy = ScrollSpy::new(Arc::clone(&page.dom), page.nav, config, None);
    settle(&spy).await;

    let state = spy.state().await.unwrap();
    assert_eq!(state.offsets, vec![0.0, 500.0, 1200.0]);
    assert_eq!(state.active_target.as_deref(), Some("#s0"));

    let container = Scroller::Element(page.scroller);
    assert_eq!(scroll_to(&spy, container, 510.0).await.as_deref(), Some("#s1"));
    assert_eq!(scroll_to(&spy, container, 1180.0).await.as_deref(), Some("#s1"));
    assert_eq!(scroll_to(&spy, container, 1200.0).await.as_deref(), Some("#s2"));
    assert_eq!(active_links(&page), vec![page.links[2]]);

    assert_eq!(scroll_to(&spy, container, 0.0).await.as_deref(), Some("#s0"));
    assert_eq!(active_links(&page), vec![page.links[0]]);
}

/// Test window scrolling with a dropdown inside the navigation
#[tokio::test(start_paused = true)]
async fn test_window_scroller_with_dropdown() {
    init_tracing();
    let mut doc = Document::new();
    let body = doc.body_node();
    doc.set_window_height(1000.0);
    doc.set_scroll_height(body, 3000.0).unwrap();

    let nav = doc.append_element(body, "ul").unwrap();
    doc.set_attribute(nav, "class", "nav").unwrap();
    let first = doc.append_element(nav, "a").unwrap();
    doc.set_attribute(first, "class", "nav-link").unwrap();
    doc.set_attribute(first, "href", "#intro").unwrap();
    let dropdown = doc.append_element(nav, "li").unwrap();
    doc.set_attribute(dropdown, "class", "nav-item dropdown").unwrap();
    let toggle = doc.append_element(dropdown, "a").unwrap();
    doc.set_attribute(toggle, "class", "nav-link dropdown-toggle").unwrap();
    doc.set_attribute(toggle, "href", "#").unwrap();
    let menu = doc.append_element(dropdown, "div").unwrap();
    doc.set_attribute(menu, "class", "dropdown-menu").unwrap();
    let item = doc.append_element(menu, "a").unwrap();
    doc.set_attribute(item, "class", "dropdown-item").unwrap();
    doc.set_attribute(item, "href", "/page#details").unwrap();

    for (id, top) in [("intro", 0.0), ("details", 1000.0)] {
        let section = doc.append_element(body, "section").unwrap();
        doc.set_attribute(section, "id", id).unwrap();
        doc.set_layout(section, top, 900.0).unwrap();
    }
    let dom = Arc::new(Mutex::new(doc));

    let bus = ActivationBus::new();
    let mut activations = bus.subscribe();
    let spy = ScrollSpy::new(Arc::clone(&dom), nav, SpyConfig::default(), Some(bus));
    settle(&spy).await;

    assert_eq!(activations.recv().await.unwrap().target, "#intro");
    assert_eq!(spy.state().await.unwrap().targets, vec!["#intro", "#details"]);

    scroll_to(&spy, Scroller::Window, 1200.0).await;
    let activation = activations.recv().await.unwrap();
    assert_eq!(activation.target, "#details");
    assert_eq!(activation.links, vec![item]);

    let doc = dom.lock();
    assert!(doc.has_class(item, CLASS_ACTIVE));
    assert!(doc.has_class(toggle, CLASS_ACTIVE));
    assert!(!doc.has_class(first, CLASS_ACTIVE));
}

/// Test that scrolling back above the first section clears the marks
#[tokio::test(start_paused = true)]
async fn test_above_first_target_clears() {
    let page = layout(&[100.0, 600.0, 1100.0], 500.0, 2000.0);
    let config = SpyConfig::default().with_selector("#content");
    let spy = ScrollSpy::new(Arc::clone(&page.dom), page.nav, config, None);
    settle(&spy).await;
    assert_eq!(spy.active_target().await.unwrap(), None);

    let container = Scroller::Element(page.scroller);
    assert_eq!(scroll_to(&spy, container, 150.0).await.as_deref(), Some("#s0"));
    assert_eq!(scroll_to(&spy, container, 20.0).await, None);
    assert!(active_links(&page).is_empty());
}

/// Test that growing content is picked up on the next scroll
#[tokio::test(start_paused = true)]
async fn test_content_growth_rebuilds_offsets() {
    let page = layout(&[0.0, 500.0, 1200.0], 800.0, 2000.0);
    let config = SpyConfig::default().with_selector("#content");
    let spy = ScrollSpy::new(Arc::clone(&page.dom), page.nav, config, None);
    settle(&spy).await;
    let before = spy.stats().await.unwrap();

    {
        let mut doc = page.dom.lock();
        doc.set_scroll_height(page.scroller, 3000.0).unwrap();
    }
    scroll_to(&spy, Scroller::Element(page.scroller), 510.0).await;

    let after = spy.stats().await.unwrap();
    assert_eq!(after.refreshes, before.refreshes + 1);
    assert_eq!(spy.state().await.unwrap().scroll_height, 3000.0);
}

/// Test that hidden sections are not tracked
#[tokio::test(start_paused = true)]
async fn test_hidden_sections_skipped() {
    let page = layout(&[0.0, 500.0, 1200.0], 800.0, 2000.0);
    {
        let mut doc = page.dom.lock();
        let hidden = doc
            .query(page.scroller, &"#s1".parse().unwrap())
            .unwrap();
        doc.set_hidden(hidden, true).unwrap();
    }
    let config = SpyConfig::default().with_selector("#content");
    let spy = ScrollSpy::new(Arc::clone(&page.dom), page.nav, config, None);
    settle(&spy).await;

    assert_eq!(spy.state().await.unwrap().targets, vec!["#s0", "#s2"]);
}

/// Test configuration from an options object and a directive binding
#[tokio::test(start_paused = true)]
async fn test_config_sources() {
    let page = layout(&[0.0, 500.0, 1200.0], 800.0, 2000.0);

    let options = json!({ "element": "#content", "offset": "30", "method": "offset" });
    let config: SpyConfig<NodeId> = SpyConfig::from_options(&options);
    assert_eq!(config.offset, 30.0);
    assert_eq!(config.method, OffsetMethod::Offset);

    let spy = ScrollSpy::new(Arc::clone(&page.dom), page.nav, config, None);
    settle(&spy).await;
    // 480 + 30 reaches the second section
    assert_eq!(
        scroll_to(&spy, Scroller::Element(page.scroller), 480.0).await.as_deref(),
        Some("#s1")
    );

    let binding: SpyConfig<NodeId> = SpyConfig::from_binding(Some("content"), &["50"], None);
    spy.update_config(binding, None).unwrap();
    settle(&spy).await;
    // 1160 + 50 passes the third section before the bottom is reached
    assert_eq!(
        scroll_to(&spy, Scroller::Element(page.scroller), 1160.0).await.as_deref(),
        Some("#s2")
    );
}

/// Test that several spies share one bus and one document
#[tokio::test(start_paused = true)]
async fn test_spies_share_bus() {
    let page = layout(&[0.0, 500.0, 1200.0], 800.0, 2000.0);
    let other_nav = {
        let mut doc = page.dom.lock();
        let body = doc.body_node();
        let nav = doc.append_element(body, "nav").unwrap();
        let link = doc.append_element(nav, "a").unwrap();
        doc.set_attribute(link, "class", "list-group-item").unwrap();
        doc.set_attribute(link, "href", "#s1").unwrap();
        nav
    };

    let bus = ActivationBus::new();
    let mut rx = bus.subscribe();
    let config = SpyConfig::default().with_selector("#content");
    let first = ScrollSpy::new(Arc::clone(&page.dom), page.nav, config.clone(), Some(bus.clone()));
    let second = ScrollSpy::new(Arc::clone(&page.dom), other_nav, config, Some(bus));
    settle(&first).await;
    settle(&second).await;
    // Only the first spy links to #s0
    assert_eq!(rx.recv().await.unwrap().target, "#s0");

    page.dom.lock().scroll_to(Scroller::Element(page.scroller), 510.0).unwrap();
    first.flush().await.unwrap();
    second.flush().await.unwrap();

    let activations = [rx.recv().await.unwrap(), rx.recv().await.unwrap()];
    assert!(activations.iter().all(|a| a.target == "#s1"));
    assert!(page.dom.lock().has_class(page.links[1], CLASS_ACTIVE));
}

/// Test that disposal leaves no registrations behind
#[tokio::test(start_paused = true)]
async fn test_dispose_cleans_up() {
    let page = layout(&[0.0, 500.0, 1200.0], 800.0, 2000.0);
    let mut spies: Vec<_> = (0..3)
        .map(|_| {
            let config = SpyConfig::default().with_selector("#content");
            ScrollSpy::new(Arc::clone(&page.dom), page.nav, config, None)
        })
        .collect();
    for spy in &spies {
        settle(spy).await;
    }
    assert_eq!(page.dom.lock().listener_count(), 15);

    for spy in &mut spies {
        spy.dispose();
        assert_eq!(spy.refresh(), Err(SpyError::Disposed));
    }
    assert_eq!(page.dom.lock().listener_count(), 0);
    assert_eq!(page.dom.lock().observer_count(), 0);

    // Events after disposal reach nobody
    page.dom.lock().resize_window(400.0);
    time::advance(Duration::from_millis(200)).await;
}
