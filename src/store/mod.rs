mod notify;
mod source;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, Either, LocalBoxFuture, Ready, Shared};
use thiserror::Error;
use tracing::{debug, warn};

use crate::snapshot::{Graph, SnapshotError, SnapshotKey, parse_document};

use notify::ChangeNotifier;
pub use notify::SubscriptionId;
pub use source::{DirectorySource, SnapshotSource, closest_architecture};

#[derive(Clone, Debug, Error)]
pub enum StoreError {
    #[error("failed to fetch snapshot {key}: {message}")]
    Fetch { key: SnapshotKey, message: String },
    #[error("snapshot {key} is malformed: {source}")]
    Malformed {
        key: SnapshotKey,
        #[source]
        source: SnapshotError,
    },
    #[error("no architecture selected")]
    NoSelection,
    /// A newer `select` was issued before this one settled.
    #[error("selection of {key} was superseded")]
    Superseded { key: SnapshotKey },
}

/// Read-only snapshot of the coordinator state handed to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub architecture: Option<String>,
    pub step: usize,
    pub has_previous_step: bool,
    /// True only once the next step is cached, so the host never offers a
    /// dead navigation target.
    pub has_next_step: bool,
    pub charge: f32,
}

type Flight = Shared<LocalBoxFuture<'static, Result<Rc<Graph>, StoreError>>>;
type Load = Either<Ready<Result<Rc<Graph>, StoreError>>, Flight>;

struct StoreState {
    cache: HashMap<SnapshotKey, Rc<Graph>>,
    in_flight: HashMap<SnapshotKey, Flight>,
    selection: Option<SnapshotKey>,
    generation: u64,
    charge: f32,
}

struct StoreShared {
    source: Box<dyn SnapshotSource>,
    state: RefCell<StoreState>,
    notifier: ChangeNotifier<ViewState>,
}

/// Owns the per-snapshot graph cache and coordinates fetches into it.
///
/// Cloning is cheap and every clone drives the same cache. Entries are
/// never evicted. At most one fetch per key is in flight: a second
/// `ensure` for a key that is still loading joins the existing fetch.
#[derive(Clone)]
pub struct SnapshotStore {
    shared: Rc<StoreShared>,
}

impl SnapshotStore {
    pub fn new(source: impl SnapshotSource + 'static, charge: f32) -> Self {
        Self {
            shared: Rc::new(StoreShared {
                source: Box::new(source),
                state: RefCell::new(StoreState {
                    cache: HashMap::new(),
                    in_flight: HashMap::new(),
                    selection: None,
                    generation: 0,
                    charge,
                }),
                notifier: ChangeNotifier::default(),
            }),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&ViewState) + 'static) -> SubscriptionId {
        self.shared.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(id)
    }

    pub fn is_cached(&self, key: &SnapshotKey) -> bool {
        self.shared.state.borrow().cache.contains_key(key)
    }

    pub fn pending_fetches(&self) -> usize {
        self.shared.state.borrow().in_flight.len()
    }

    /// Resolves once `key` is cached, then notifies subscribers once.
    ///
    /// A failed fetch leaves the key absent so a later call starts a fresh
    /// attempt; nothing is retried automatically.
    pub fn ensure(
        &self,
        key: SnapshotKey,
    ) -> LocalBoxFuture<'static, Result<Rc<Graph>, StoreError>> {
        let load = self.load(key);
        let store = self.clone();
        async move {
            let graph = load.await?;
            store.notify();
            Ok(graph)
        }
        .boxed_local()
    }

    /// Like `ensure` but silent, for callers that notify on their own.
    fn load(&self, key: SnapshotKey) -> Load {
        let mut state = self.shared.state.borrow_mut();

        if let Some(graph) = state.cache.get(&key) {
            return future::ready(Ok(Rc::clone(graph))).left_future();
        }

        if let Some(flight) = state.in_flight.get(&key) {
            debug!(%key, "joining in-flight snapshot fetch");
            return flight.clone().right_future();
        }

        let flight = Self::start_fetch(Rc::clone(&self.shared), key.clone());
        state.in_flight.insert(key, flight.clone());
        flight.right_future()
    }

    fn start_fetch(shared: Rc<StoreShared>, key: SnapshotKey) -> Flight {
        async move {
            debug!(%key, "fetching snapshot");
            let fetched = shared.source.fetch(&key).await;

            let result = match fetched {
                Ok(document) => {
                    debug!(
                        %key,
                        arch = document.arch.as_deref(),
                        version = document.version.as_deref(),
                        "decoding snapshot"
                    );
                    parse_document(&document.graph)
                        .map(Rc::new)
                        .map_err(|source| StoreError::Malformed {
                            key: key.clone(),
                            source,
                        })
                }
                Err(error) => Err(StoreError::Fetch {
                    key: key.clone(),
                    message: format!("{error:#}"),
                }),
            };

            let mut state = shared.state.borrow_mut();
            state.in_flight.remove(&key);
            if let Ok(graph) = &result {
                debug!(
                    %key,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "cached snapshot"
                );
                state.cache.insert(key, Rc::clone(graph));
            }
            result
        }
        .boxed_local()
        .shared()
    }

    /// Makes `(architecture, step)` the active snapshot.
    ///
    /// The selection only changes once the snapshot is cached, so a failed
    /// load keeps the previous graph on screen. The next step is prefetched
    /// before subscribers are told, and a prefetch failure is only logged.
    /// When a newer `select` is issued before this one settles, this one
    /// resolves to `StoreError::Superseded` whatever its fetch did, and the
    /// selection is left to the newer call.
    pub fn select(
        &self,
        architecture: impl Into<String>,
        step: usize,
    ) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let key = SnapshotKey::new(architecture, step);
        let generation = {
            let mut state = self.shared.state.borrow_mut();
            state.generation += 1;
            state.generation
        };
        let store = self.clone();

        async move {
            let loaded = store.load(key.clone()).await;
            store.check_current(&key, generation)?;
            loaded?;

            let next = key.next();
            if let Err(error) = store.load(next.clone()).await {
                warn!(key = %next, %error, "prefetch failed");
            }

            store.check_current(&key, generation)?;
            store.shared.state.borrow_mut().selection = Some(key);
            store.notify();
            Ok(())
        }
        .boxed_local()
    }

    fn check_current(&self, key: &SnapshotKey, generation: u64) -> Result<(), StoreError> {
        if self.shared.state.borrow().generation == generation {
            return Ok(());
        }
        debug!(%key, "selection superseded before it settled");
        Err(StoreError::Superseded { key: key.clone() })
    }

    pub fn step_previous(&self) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let selection = self.shared.state.borrow().selection.clone();
        match selection {
            None => future::ready(Err(StoreError::NoSelection)).boxed_local(),
            Some(current) => match current.previous() {
                Some(previous) => self.select(previous.architecture, previous.step),
                None => future::ready(Ok(())).boxed_local(),
            },
        }
    }

    pub fn step_next(&self) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let selection = self.shared.state.borrow().selection.clone();
        match selection {
            None => future::ready(Err(StoreError::NoSelection)).boxed_local(),
            Some(current) => {
                let next = current.next();
                self.select(next.architecture, next.step)
            }
        }
    }

    pub fn set_charge(&self, charge: f32) {
        self.shared.state.borrow_mut().charge = charge;
        self.notify();
    }

    pub fn charge(&self) -> f32 {
        self.shared.state.borrow().charge
    }

    /// Graph of the active selection; empty until one has loaded.
    pub fn current_graph(&self) -> Rc<Graph> {
        let state = self.shared.state.borrow();
        state
            .selection
            .as_ref()
            .and_then(|key| state.cache.get(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn view_state(&self) -> ViewState {
        let state = self.shared.state.borrow();
        let (architecture, step, has_next_step) = match &state.selection {
            Some(key) => (
                Some(key.architecture.clone()),
                key.step,
                self.is_cached(&key.next()),
            ),
            None => (None, 0, false),
        };

        ViewState {
            architecture,
            step,
            has_previous_step: step > 0,
            has_next_step,
            charge: state.charge,
        }
    }

    fn notify(&self) {
        let view_state = self.view_state();
        self.shared.notifier.publish(&view_state);
    }
}
