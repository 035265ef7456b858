//! Scrollspy handle and event loop
//!
//! A [`ScrollSpy`] spawns one task per instance. The task registers scroll,
//! resize, orientation and transition listeners plus two subtree observers
//! (navigation links and scroll content) and reacts to what they report.
//! Dropping or disposing the handle unregisters everything synchronously and
//! aborts the task, cancelling any pending throttle timer with it.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use spy_core::{SpyConfig, SpyEngine, SpyStats, TrackerState};
use spy_dom::{
    Dom, EventCallback, EventKind, EventTarget, ListenerId, MutationCallback, MutationKind,
    ObserveOptions, ObserverId, Scroller,
};

use crate::bus::ActivationBus;
use crate::event::SpyEvent;
use crate::{Result, SpyError};

/// Document shared between the host and its spies
pub type SharedDom<D> = Arc<Mutex<D>>;

/// Window events every spy listens for
const WINDOW_EVENTS: [EventKind; 4] = [
    EventKind::Scroll,
    EventKind::Resize,
    EventKind::OrientationChange,
    EventKind::TransitionEnd,
];

/// Point-in-time view of a spy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpySnapshot {
    /// Offset table and active target
    pub state: TrackerState,
    /// Work counters
    pub stats: SpyStats,
    /// Whether listeners are registered
    pub listening: bool,
    /// Whether a throttled refresh is waiting to run
    pub refresh_pending: bool,
}

enum Command<N> {
    Event(SpyEvent),
    Start,
    Stop,
    UpdateConfig { config: SpyConfig<N>, bus: Option<ActivationBus<N>> },
    Flush(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<SpySnapshot>),
}

#[derive(Debug, Default)]
struct Registrations {
    listeners: Vec<ListenerId>,
    targets_observer: Option<ObserverId>,
    scroller_observer: Option<ObserverId>,
    disposed: bool,
}

impl Registrations {
    fn release<D: Dom>(&mut self, dom: &mut D) {
        for id in self.listeners.drain(..) {
            dom.remove_listener(id);
        }
        if let Some(id) = self.targets_observer.take() {
            dom.disconnect(id);
        }
        if let Some(id) = self.scroller_observer.take() {
            dom.disconnect(id);
        }
    }
}

/// Handle to a running scrollspy
///
/// # Example
///
/// ```no_run
/// use parking_lot::Mutex;
/// use spy_core::SpyConfig;
/// use spy_dom::Document;
/// use spy_runtime::{ActivationBus, ScrollSpy};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let mut doc = Document::new();
///     let nav = doc.append_element(doc.body_node(), "nav").unwrap();
///     let dom = Arc::new(Mutex::new(doc));
///
///     let bus = ActivationBus::new();
///     let mut activations = bus.subscribe();
///     let spy = ScrollSpy::new(dom, nav, SpyConfig::default(), Some(bus));
///
///     while let Ok(activation) = activations.recv().await {
///         println!("now reading {}", activation.target);
///     }
///     drop(spy);
/// }
/// ```
pub struct ScrollSpy<D: Dom> {
    dom: SharedDom<D>,
    commands: mpsc::UnboundedSender<Command<D::Node>>,
    registrations: Arc<Mutex<Registrations>>,
    task: Option<JoinHandle<()>>,
}

impl<D> ScrollSpy<D>
where
    D: Dom + Send + 'static,
{
    /// Spawn a spy for the links under `root` and start listening
    ///
    /// With a bus attached, listener registration waits one scheduler tick so
    /// the host can finish rendering first. Must be called from within a
    /// tokio runtime.
    pub fn new(
        dom: SharedDom<D>,
        root: D::Node,
        config: SpyConfig<D::Node>,
        bus: Option<ActivationBus<D::Node>>,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let registrations = Arc::new(Mutex::new(Registrations::default()));

        let task = SpyTask {
            dom: Arc::clone(&dom),
            engine: SpyEngine::new(root, config),
            bus,
            commands: receiver,
            sender: commands.clone(),
            registrations: Arc::clone(&registrations),
            refresh_at: None,
            listening: false,
        };
        let handle = tokio::spawn(task.run());

        let spy = Self { dom, commands, registrations, task: Some(handle) };
        let _ = spy.send(Command::Start);
        spy
    }

    /// Register listeners and observers, then schedule a refresh
    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    /// Unregister listeners and observers and drop any pending refresh
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Replace the configuration and re-bind against its scroll container
    ///
    /// Existing listeners are always torn down first. A new bus replaces the
    /// current one; `None` keeps it.
    pub fn update_config(
        &self,
        config: SpyConfig<D::Node>,
        bus: Option<ActivationBus<D::Node>>,
    ) -> Result<()> {
        self.send(Command::UpdateConfig { config, bus })
    }

    /// Feed an event to the spy as if a listener had reported it
    pub fn handle_event(&self, event: SpyEvent) -> Result<()> {
        self.send(Command::Event(event))
    }

    /// Schedule a throttled refresh
    pub fn refresh(&self) -> Result<()> {
        self.handle_event(SpyEvent::Refresh)
    }

    /// Wait until every previously sent command has been handled
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush(tx))?;
        rx.await.map_err(|_| SpyError::TaskStopped)
    }

    /// Current state of the spy
    pub async fn snapshot(&self) -> Result<SpySnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| SpyError::TaskStopped)
    }

    /// Offset table and active target
    pub async fn state(&self) -> Result<TrackerState> {
        Ok(self.snapshot().await?.state)
    }

    /// Work counters
    pub async fn stats(&self) -> Result<SpyStats> {
        Ok(self.snapshot().await?.stats)
    }

    /// Currently active target
    pub async fn active_target(&self) -> Result<Option<String>> {
        Ok(self.snapshot().await?.state.active_target)
    }
}

impl<D: Dom> ScrollSpy<D> {
    /// The shared document
    pub fn dom(&self) -> &SharedDom<D> {
        &self.dom
    }

    /// Whether [`ScrollSpy::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.task.is_none()
    }

    /// Unregister everything and stop the task
    ///
    /// Runs synchronously: once it returns no listener, observer or throttle
    /// timer of this spy can fire. Further calls are no-ops.
    pub fn dispose(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.registrations.lock().disposed = true;
        task.abort();

        let mut dom = self.dom.lock();
        self.registrations.lock().release(&mut *dom);
        tracing::debug!("scrollspy disposed");
    }

    fn send(&self, command: Command<D::Node>) -> Result<()> {
        if self.task.is_none() {
            return Err(SpyError::Disposed);
        }
        self.commands.send(command).map_err(|_| SpyError::TaskStopped)
    }
}

impl<D: Dom> Drop for ScrollSpy<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct SpyTask<D: Dom> {
    dom: SharedDom<D>,
    engine: SpyEngine<D::Node>,
    bus: Option<ActivationBus<D::Node>>,
    commands: mpsc::UnboundedReceiver<Command<D::Node>>,
    sender: mpsc::UnboundedSender<Command<D::Node>>,
    registrations: Arc<Mutex<Registrations>>,
    refresh_at: Option<Instant>,
    listening: bool,
}

impl<D> SpyTask<D>
where
    D: Dom + Send + 'static,
{
    async fn run(mut self) {
        loop {
            let deadline = self.refresh_at;
            let timer = time::sleep_until(deadline.unwrap_or_else(Instant::now));

            tokio::select! {
                biased;

                () = timer, if deadline.is_some() => {
                    self.refresh_at = None;
                    self.refresh_and_process();
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    self.handle(command).await;
                }
            }
        }
    }

    async fn handle(&mut self, command: Command<D::Node>) {
        match command {
            Command::Event(event) => self.handle_event(event),
            Command::Start => self.start().await,
            Command::Stop => {
                self.unlisten();
                self.refresh_at = None;
            }
            Command::UpdateConfig { config, bus } => {
                self.unlisten();
                self.engine.set_config(config);
                if bus.is_some() {
                    self.bus = bus;
                }
                self.start().await;
            }
            Command::Flush(reply) => {
                let _ = reply.send(());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(SpySnapshot {
                    state: self.engine.state().clone(),
                    stats: self.engine.stats(),
                    listening: self.listening,
                    refresh_pending: self.refresh_at.is_some(),
                });
            }
        }
    }

    async fn start(&mut self) {
        if self.bus.is_some() {
            tokio::task::yield_now().await;
        }
        self.listen();
    }

    fn handle_event(&mut self, event: SpyEvent) {
        tracing::trace!(?event, "scrollspy event");
        if event.is_throttled() {
            self.schedule_refresh();
            return;
        }
        // Started before the scroll container existed: bind again
        if self.registrations.lock().scroller_observer.is_none() {
            self.listen();
        }
        self.process();
    }

    fn schedule_refresh(&mut self) {
        if self.refresh_at.is_none() {
            self.refresh_at = Some(Instant::now() + self.engine.config().throttle);
        }
    }

    fn listen(&mut self) {
        let dom = Arc::clone(&self.dom);
        let mut dom = dom.lock();
        let registrations = Arc::clone(&self.registrations);
        let mut registrations = registrations.lock();
        if registrations.disposed {
            return;
        }
        registrations.release(&mut *dom);

        let scroller = self.engine.scroller(&*dom);
        if let Some(Scroller::Element(node)) = scroller {
            let id = dom.add_listener(EventTarget::Element(node), EventKind::Scroll, self.event_callback());
            registrations.listeners.push(id);
        }
        for kind in WINDOW_EVENTS {
            let id = dom.add_listener(EventTarget::Window, kind, self.event_callback());
            registrations.listeners.push(id);
        }

        let root = self.engine.root();
        let targets = ObserveOptions {
            subtree: true,
            child_list: true,
            attributes: true,
            character_data: false,
            attribute_filter: Some(vec!["href".to_string()]),
        };
        registrations.targets_observer = Some(dom.observe(root, targets, self.mutation_callback()));

        // The body holds the navigation too, so its class changes include our own marks
        let (content, attributes) = match scroller {
            Some(Scroller::Element(node)) => (Some(node), &["id", "style", "class"][..]),
            Some(Scroller::Window) => (dom.body(), &["id", "style"][..]),
            None => (None, &[][..]),
        };
        if let Some(node) = content {
            let options = ObserveOptions {
                subtree: true,
                child_list: true,
                attributes: true,
                character_data: true,
                attribute_filter: Some(attributes.iter().map(|s| s.to_string()).collect()),
            };
            registrations.scroller_observer = Some(dom.observe(node, options, self.mutation_callback()));
        }

        drop(registrations);
        drop(dom);
        self.listening = true;
        tracing::debug!(?scroller, "scrollspy listening");
        self.schedule_refresh();
    }

    fn unlisten(&mut self) {
        let mut dom = self.dom.lock();
        self.registrations.lock().release(&mut *dom);
        self.listening = false;
    }

    fn refresh_and_process(&mut self) {
        {
            let mut dom = self.dom.lock();
            self.engine.refresh(&mut *dom);
        }
        self.process();
    }

    fn process(&mut self) {
        let activation = {
            let mut dom = self.dom.lock();
            self.engine.process(&mut *dom)
        };
        if let (Some(activation), Some(bus)) = (activation, &self.bus) {
            bus.emit(activation);
        }
    }

    fn event_callback(&self) -> EventCallback {
        let sender = self.sender.clone();
        Arc::new(move |kind: EventKind| {
            let _ = sender.send(Command::Event(kind.into()));
        })
    }

    fn mutation_callback(&self) -> MutationCallback {
        let sender = self.sender.clone();
        Arc::new(move |_: &MutationKind| {
            let _ = sender.send(Command::Event(SpyEvent::Mutation));
        })
    }
}
