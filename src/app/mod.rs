use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use eframe::egui::{self, Context, Vec2};
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use tracing::{debug, error, info};

use crate::store::{SnapshotStore, StoreError, SubscriptionId};
use crate::view::GraphView;

mod canvas;
mod render_utils;
mod toolbar;

const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Charge magnitudes offered in the toolbar; the store keeps them negative.
const CHARGE_OPTIONS: [u16; 5] = [200, 400, 600, 800, 1000];

pub struct ViewerApp {
    store: SnapshotStore,
    pool: LocalPool,
    spawner: LocalSpawner,
    subscription: SubscriptionId,
    dataset_changed: Rc<Cell<bool>>,
    last_error: Rc<RefCell<Option<String>>>,
    architectures: Vec<String>,
    view: Option<GraphView>,
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        store: SnapshotStore,
        architectures: Vec<String>,
        architecture: String,
        step: usize,
    ) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let dataset_changed = Rc::new(Cell::new(false));

        let subscription = {
            let dataset_changed = Rc::clone(&dataset_changed);
            let ctx = cc.egui_ctx.clone();
            store.subscribe(move |state| {
                info!(
                    architecture = state.architecture.as_deref().unwrap_or_default(),
                    step = state.step,
                    charge = state.charge,
                    "view state changed"
                );
                dataset_changed.set(true);
                ctx.request_repaint();
            })
        };

        let app = Self {
            store,
            pool,
            spawner,
            subscription,
            dataset_changed,
            last_error: Rc::new(RefCell::new(None)),
            architectures,
            view: None,
        };
        app.spawn_action(app.store.select(&architecture, step));
        app
    }

    /// Runs a store action on the UI-thread pool and records how it ended.
    fn spawn_action(&self, action: LocalBoxFuture<'static, Result<(), StoreError>>) {
        let last_error = Rc::clone(&self.last_error);
        let task = async move {
            match action.await {
                Ok(()) => *last_error.borrow_mut() = None,
                // A newer action owns the status line.
                Err(StoreError::Superseded { key }) => debug!(%key, "snapshot action superseded"),
                Err(store_error) => {
                    error!(error = %store_error, "snapshot action failed");
                    *last_error.borrow_mut() = Some(store_error.to_string());
                }
            }
        };

        if let Err(spawn_error) = self.spawner.spawn_local(task) {
            error!(error = %spawn_error, "failed to schedule snapshot action");
        }
    }

    /// Points the view at whatever the store currently selects.
    fn sync_view(&mut self, viewport: Vec2) {
        let graph = self.store.current_graph();
        let charge = self.store.charge();

        match &mut self.view {
            Some(view) => {
                view.sync(graph, charge);
            }
            None if self.store.view_state().architecture.is_some() => {
                self.view = Some(GraphView::new(graph, viewport, charge));
            }
            None => {}
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.pool.run_until_stalled();
        if self.store.pending_fetches() > 0 {
            ctx.request_repaint_after(FETCH_POLL_INTERVAL);
        }

        egui::TopBottomPanel::top("toolbar")
            .resizable(false)
            .show(ctx, |ui| self.draw_toolbar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));
    }
}

impl Drop for ViewerApp {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}
