//! Observable holder of the live model tree.
//!
//! The controller owns one [`App`] for the lifetime of an editing session.
//! It loads the tree from the project store on start, hands it out for in
//! place mutation, and after every [`AppModelController::notify_value_changed`]
//! fans the new value out to observers and writes a snapshot back to the
//! store in the background.
//!
//! ```text
//! Uninitialized ──load──▶ Loading ──▶ Ready(Loaded)
//!                                 └─▶ Ready(Default)   (not found / unreadable)
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::model::App;
use crate::store::{Asset, ProjectRepository};

/// Asset path the model tree of a project is stored under.
pub const MODEL_ASSET_PATH: &str = "/app.json";

/// Where the value of a ready controller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Decoded from the stored asset.
    Loaded,
    /// Fresh empty tree; nothing usable was stored.
    Default,
}

/// Lifecycle of an [`AppModelController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Constructed, no load attempted.
    Uninitialized,
    /// Load in flight.
    Loading,
    /// A value is present and edits are persisted.
    Ready(LoadOrigin),
}

/// Handle returned by [`AppModelController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&App)>;
type SaveHandle = JoinHandle<Result<(), StoreError>>;

/// Owns the current model tree of one project and keeps the store in step.
pub struct AppModelController {
    repo: ProjectRepository,
    project_id: String,
    state: ControllerState,
    value: Option<App>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    last_save: Option<SaveHandle>,
    pending: Arc<AtomicUsize>,
}

impl AppModelController {
    /// Creates an uninitialized controller for `project_id`.
    pub fn new(repo: ProjectRepository, project_id: impl Into<String>) -> Self {
        Self {
            repo,
            project_id: project_id.into(),
            state: ControllerState::Uninitialized,
            value: None,
            observers: Vec::new(),
            next_observer: 0,
            last_save: None,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a controller and loads its value.
    pub async fn open(repo: ProjectRepository, project_id: impl Into<String>) -> Self {
        let mut controller = Self::new(repo, project_id);
        controller.load().await;
        controller
    }

    /// Loads the stored tree, falling back to an empty one.
    ///
    /// Always settles in [`ControllerState::Ready`]. Observers see the
    /// settled value; nothing is written back.
    pub async fn load(&mut self) {
        self.state = ControllerState::Loading;
        let (app, origin) = match self.repo.get_asset(&self.project_id, MODEL_ASSET_PATH).await {
            Ok(asset) => match App::from_object(&asset.payload) {
                Ok(app) => (app, LoadOrigin::Loaded),
                Err(err) => {
                    warn!(project = %self.project_id, error = %err, "stored model unreadable, starting empty");
                    (App::new(), LoadOrigin::Default)
                }
            },
            Err(err) if err.is_not_found() => {
                info!(project = %self.project_id, "no stored model, starting empty");
                (App::new(), LoadOrigin::Default)
            }
            Err(err) => {
                warn!(project = %self.project_id, error = %err, "model load failed, starting empty");
                (App::new(), LoadOrigin::Default)
            }
        };
        self.value = Some(app);
        self.state = ControllerState::Ready(origin);
        self.notify_observers();
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Project whose model this controller holds.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The current tree, once loaded.
    #[must_use]
    pub fn value(&self) -> Option<&App> {
        self.value.as_ref()
    }

    /// Mutable access to the current tree. Call
    /// [`AppModelController::notify_value_changed`] after editing.
    pub fn value_mut(&mut self) -> Option<&mut App> {
        self.value.as_mut()
    }

    /// Applies `edit` to the current tree and notifies. `None` before load.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut App) -> R) -> Option<R> {
        let result = edit(self.value.as_mut()?);
        self.notify_value_changed();
        Some(result)
    }

    /// Installs `app` as the current tree and notifies.
    pub fn replace_value(&mut self, app: App) {
        self.value = Some(app);
        self.notify_value_changed();
    }

    /// Registers `observer`. It is called right away if a value is present
    /// and then after every change, in registration order.
    pub fn subscribe(&mut self, mut observer: impl FnMut(&App) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        if let Some(app) = &self.value {
            observer(app);
        }
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Drops an observer; `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    /// Publishes the current tree: observers first, then a background save
    /// of a snapshot. Does nothing until the controller is ready.
    ///
    /// Outside a Tokio runtime the save is skipped and logged as an error.
    pub fn notify_value_changed(&mut self) {
        if !matches!(self.state, ControllerState::Ready(_)) {
            debug!(state = ?self.state, "change before load ignored");
            return;
        }
        let Some(app) = &self.value else {
            return;
        };
        let snapshot = Asset::new(self.project_id.clone(), MODEL_ASSET_PATH, app.to_object());
        self.notify_observers();

        let Ok(runtime) = Handle::try_current() else {
            error!(project = %self.project_id, "no async runtime, model not saved");
            return;
        };

        // Each save waits for the one before it so snapshots land in order.
        let previous = self.last_save.take();
        let repo = self.repo.clone();
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);
        self.last_save = Some(runtime.spawn(async move {
            let earlier = match previous {
                Some(save) => join_save(save).await,
                None => Ok(()),
            };
            let result = repo.put_asset(&snapshot).await;
            match &result {
                Ok(()) => debug!(project = %snapshot.id, "model saved"),
                Err(err) => error!(project = %snapshot.id, error = %err, "model save failed"),
            }
            pending.fetch_sub(1, Ordering::SeqCst);
            earlier.and(result)
        }));
    }

    /// Saves spawned and not yet completed.
    #[must_use]
    pub fn pending_saves(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Waits for every outstanding save.
    ///
    /// # Errors
    ///
    /// Returns the first save failure since the previous flush. Failures
    /// are already logged and the in-memory tree is kept either way.
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        match self.last_save.take() {
            Some(save) => join_save(save).await,
            None => Ok(()),
        }
    }

    fn notify_observers(&mut self) {
        if let Some(app) = &self.value {
            for (_, observer) in &mut self.observers {
                observer(app);
            }
        }
    }
}

async fn join_save(save: SaveHandle) -> Result<(), StoreError> {
    save.await
        .unwrap_or_else(|err| Err(StoreError::Transaction { operation: "save", source: Box::new(err) }))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::model::{ModulePath, Type};

    #[tokio::test]
    async fn missing_asset_starts_from_default() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        let controller = AppModelController::open(repo.clone(), "p1").await;

        assert_eq!(controller.state(), ControllerState::Ready(LoadOrigin::Default));
        assert!(controller.value().unwrap().classes().is_empty());
        assert_eq!(controller.pending_saves(), 0);
        assert!(repo.get_asset("p1", MODEL_ASSET_PATH).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn unreadable_asset_starts_from_default() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        repo.put_asset(&Asset::new("p1", MODEL_ASSET_PATH, json!({ "name": 5 }))).await.unwrap();

        let controller = AppModelController::open(repo, "p1").await;
        assert_eq!(controller.state(), ControllerState::Ready(LoadOrigin::Default));
    }

    #[tokio::test]
    async fn observers_fire_in_registration_order() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        let mut controller = AppModelController::open(repo, "p1").await;

        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        controller.subscribe(move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        controller.subscribe(move |_| second.borrow_mut().push("second"));
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        log.borrow_mut().clear();
        controller.notify_value_changed();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        controller.flush().await.unwrap();
    }

    #[tokio::test]
    async fn unsubscribed_observer_is_not_called() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        let mut controller = AppModelController::open(repo, "p1").await;

        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let id = controller.subscribe(move |_| *counter.borrow_mut() += 1);
        assert!(controller.unsubscribe(id));
        assert!(!controller.unsubscribe(id));

        controller.notify_value_changed();
        assert_eq!(*calls.borrow(), 1);
        controller.flush().await.unwrap();
    }

    #[tokio::test]
    async fn notify_before_load_is_ignored() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        let mut controller = AppModelController::new(repo, "p1");

        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        controller.subscribe(move |_| *counter.borrow_mut() += 1);
        controller.notify_value_changed();

        assert_eq!(controller.state(), ControllerState::Uninitialized);
        assert_eq!(*calls.borrow(), 0);
        assert!(controller.edit(|_| ()).is_none());
        assert_eq!(controller.pending_saves(), 0);
    }

    #[tokio::test]
    async fn edits_are_saved_and_reloaded() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        let mut controller = AppModelController::open(repo.clone(), "p1").await;

        let created = controller
            .edit(|app| app.create_class(&ModulePath::root(), "Foo"))
            .unwrap()
            .unwrap();
        assert_eq!(created, Type::new("Foo"));
        controller.flush().await.unwrap();

        let reopened = AppModelController::open(repo, "p1").await;
        assert_eq!(reopened.state(), ControllerState::Ready(LoadOrigin::Loaded));
        let app = reopened.value().unwrap();
        assert!(app.get_class("Foo").is_some());
        assert_eq!(app, controller.value().unwrap());
    }

    #[tokio::test]
    async fn replace_value_publishes_and_saves() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        let mut controller = AppModelController::open(repo.clone(), "p1").await;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        controller.subscribe(move |app| sink.borrow_mut().push(app.classes().len()));

        let mut app = App::new();
        app.create_class(&ModulePath::root(), "Foo").unwrap();
        controller.replace_value(app.clone());
        controller.flush().await.unwrap();

        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert_eq!(controller.value(), Some(&app));
        let stored = repo.get_asset("p1", MODEL_ASSET_PATH).await.unwrap();
        assert_eq!(App::from_object(&stored.payload).unwrap(), app);
    }

    #[tokio::test]
    async fn failed_save_keeps_tree_and_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.db");
        let repo = ProjectRepository::open(&path).await.unwrap();
        let mut controller = AppModelController::open(repo, "p1").await;

        let other = rusqlite::Connection::open(&path).unwrap();
        other.execute_batch("DROP TABLE asset").unwrap();
        drop(other);

        controller.edit(|app| app.create_class(&ModulePath::root(), "Foo")).unwrap().unwrap();
        let err = controller.flush().await.unwrap_err();
        assert!(matches!(err, StoreError::Transaction { operation: "put_asset", .. }), "{err}");

        assert!(controller.value().unwrap().get_class("Foo").is_some());
        assert_eq!(controller.pending_saves(), 0);
        controller.flush().await.unwrap();
    }

    #[test]
    fn notify_outside_runtime_skips_save() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let mut controller = runtime.block_on(async {
            let repo = ProjectRepository::open_in_memory().await.unwrap();
            AppModelController::open(repo, "p1").await
        });

        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        controller.subscribe(move |_| *counter.borrow_mut() += 1);
        controller.notify_value_changed();

        assert_eq!(*calls.borrow(), 2);
        assert_eq!(controller.pending_saves(), 0);
        assert!(runtime.block_on(controller.flush()).is_ok());
    }

    #[tokio::test]
    async fn later_edit_wins() {
        let repo = ProjectRepository::open_in_memory().await.unwrap();
        let mut controller = AppModelController::open(repo.clone(), "p1").await;

        controller.edit(|app| app.create_class(&ModulePath::root(), "A")).unwrap().unwrap();
        controller.edit(|app| app.create_class(&ModulePath::root(), "B")).unwrap().unwrap();
        controller.flush().await.unwrap();

        let stored = repo.get_asset("p1", MODEL_ASSET_PATH).await.unwrap();
        let app = App::from_object(&stored.payload).unwrap();
        assert!(app.get_class("A").is_some());
        assert!(app.get_class("B").is_some());
    }
}
