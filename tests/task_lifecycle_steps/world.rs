//! Shared world state for task lifecycle BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasklane::events::adapters::memory::InMemoryEventBus;
use tasklane::identity::{
    adapters::memory::InMemoryUserDirectory,
    domain::{Actor, UserId, UserProfile},
};
use tasklane::notification::{
    adapters::memory::InMemoryMessageSender, services::NotificationDispatcher,
};
use tasklane::store::adapters::memory::InMemoryKeyedStore;
use tasklane::task::{
    domain::Task,
    services::{TaskMutationEngine, TaskServiceError},
};

/// Engine type used by the BDD world.
pub type TestEngine =
    TaskMutationEngine<InMemoryKeyedStore, InMemoryEventBus, InMemoryUserDirectory, DefaultClock>;

/// Dispatcher type used by the BDD world.
pub type TestDispatcher =
    NotificationDispatcher<InMemoryKeyedStore, InMemoryUserDirectory, InMemoryMessageSender>;

/// Scenario world for task lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub store: Arc<InMemoryKeyedStore>,
    pub bus: Arc<InMemoryEventBus>,
    pub sender: Arc<InMemoryMessageSender>,
    pub engine: TestEngine,
    pub dispatcher: TestDispatcher,
    pub task: Option<Task>,
    pub last_error: Option<TaskServiceError>,
}

impl LifecycleWorld {
    /// Creates a world with an admin and two members in the directory.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryKeyedStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let sender = Arc::new(InMemoryMessageSender::new());
        let directory = Arc::new(InMemoryUserDirectory::with_users([
            UserProfile::new(user_id("admin"), "admin@example.com").with_admin_group("Admins"),
            UserProfile::new(user_id("u1"), "u1@example.com"),
            UserProfile::new(user_id("u2"), "u2@example.com"),
        ]));
        let engine = TaskMutationEngine::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            Arc::clone(&directory),
            Arc::new(DefaultClock),
        );
        let dispatcher =
            NotificationDispatcher::new(Arc::clone(&store), directory, Arc::clone(&sender));

        Self {
            store,
            bus,
            sender,
            engine,
            dispatcher,
            task: None,
            last_error: None,
        }
    }

    /// Returns the task created by a previous step.
    pub fn current_task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))
    }

    /// Records the outcome of a step that may legitimately fail.
    pub fn record<T>(&mut self, result: Result<T, TaskServiceError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Builds a user identifier from scenario text.
pub fn user_id(raw: &str) -> UserId {
    UserId::new(raw).expect("valid user id in scenario")
}

/// The administrator every scenario acts as.
pub fn admin() -> Actor {
    Actor::admin(user_id("admin"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
