//! In-memory wiring shared by the integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use secrecy::SecretString;
use tasklane::events::{adapters::memory::InMemoryEventBus, domain::EventEnvelope};
use tasklane::identity::{
    adapters::memory::InMemoryUserDirectory,
    domain::{AccountStatus, Actor, UserId, UserProfile},
};
use tasklane::indexer::{adapters::memory::InMemorySearchIndex, services::ChangeCaptureIndexer};
use tasklane::notification::{
    adapters::memory::InMemoryMessageSender, services::NotificationDispatcher,
};
use tasklane::pipeline::{ChangeCaptureWorker, EventFanOut};
use tasklane::store::adapters::memory::InMemoryKeyedStore;
use tasklane::task::services::{CommentService, TaskMutationEngine, TaskQueryService};
use tasklane::trigger::{domain::WebhookVerifier, services::ExternalTriggerAdapter};

pub type Engine =
    TaskMutationEngine<InMemoryKeyedStore, InMemoryEventBus, InMemoryUserDirectory, DefaultClock>;
pub type FanOut = EventFanOut<
    InMemoryKeyedStore,
    InMemorySearchIndex,
    InMemoryUserDirectory,
    InMemoryMessageSender,
>;
pub type Trigger = ExternalTriggerAdapter<
    InMemoryKeyedStore,
    InMemoryEventBus,
    InMemoryUserDirectory,
    DefaultClock,
>;
pub type Worker = ChangeCaptureWorker<InMemoryKeyedStore, InMemorySearchIndex, InMemoryKeyedStore>;

pub const WEBHOOK_SECRET: &str = "integration-secret";

/// Every service wired over in-memory adapters.
pub struct App {
    pub store: Arc<InMemoryKeyedStore>,
    pub bus: Arc<InMemoryEventBus>,
    pub directory: Arc<InMemoryUserDirectory>,
    pub index: Arc<InMemorySearchIndex>,
    pub sender: Arc<InMemoryMessageSender>,
    pub engine: Engine,
    pub queries: TaskQueryService<InMemoryKeyedStore>,
    pub comments: CommentService<InMemoryKeyedStore, InMemoryEventBus, DefaultClock>,
    pub fan_out: FanOut,
    pub trigger: Trigger,
}

impl App {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryKeyedStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let directory = Arc::new(InMemoryUserDirectory::with_users([
            UserProfile::new(user_id("admin"), "admin@example.com").with_admin_group("Admins"),
            UserProfile::new(user_id("u1"), "u1@example.com"),
            UserProfile::new(user_id("u2"), "u2@example.com"),
            UserProfile::new(user_id("gone"), "gone@example.com")
                .with_status(AccountStatus::Deactivated),
        ]));
        let index = Arc::new(InMemorySearchIndex::new());
        let sender = Arc::new(InMemoryMessageSender::new());
        let clock = Arc::new(DefaultClock);

        let engine = TaskMutationEngine::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            Arc::clone(&directory),
            Arc::clone(&clock),
        );
        let fan_out = EventFanOut::new(
            ChangeCaptureIndexer::new(Arc::clone(&index), Arc::clone(&store)),
            NotificationDispatcher::new(
                Arc::clone(&store),
                Arc::clone(&directory),
                Arc::clone(&sender),
            ),
        );
        let trigger = ExternalTriggerAdapter::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            Arc::clone(&directory),
            Arc::clone(&clock),
            verifier(),
        );
        Self {
            queries: TaskQueryService::new(Arc::clone(&store)),
            comments: CommentService::new(Arc::clone(&store), Arc::clone(&bus), clock),
            store,
            bus,
            directory,
            index,
            sender,
            engine,
            fan_out,
            trigger,
        }
    }

    /// Returns a change-feed worker over this app's store and index.
    pub fn change_capture(&self) -> Worker {
        ChangeCaptureWorker::new(
            Arc::clone(&self.store),
            ChangeCaptureIndexer::new(Arc::clone(&self.index), Arc::clone(&self.store)),
        )
    }

    /// Delivers every envelope published so far to the fan-out consumers.
    pub async fn drain_events(&self) -> Vec<EventEnvelope> {
        let published = self.bus.published();
        for envelope in &published {
            self.fan_out.deliver(envelope).await;
        }
        published
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[fixture]
pub fn app() -> App {
    App::default()
}

pub fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(SecretString::from(WEBHOOK_SECRET.to_owned()))
}

pub fn user_id(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

pub fn admin() -> Actor {
    Actor::admin(user_id("admin"))
}

pub fn member(id: &str) -> Actor {
    Actor::member(user_id(id))
}
