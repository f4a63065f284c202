pub mod indexer;
pub use indexer::{IndexerError, IndexerGateway, IndexerRegistry, UpdatedSeasons};

pub mod progress;
pub use progress::{Progress, ProgressIndicators, ProgressTracker};

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod search_templates;
pub use search_templates::{SearchTemplates, TemplateError};

pub mod show_actions;
pub use show_actions::ShowActions;

pub mod show_queue;
pub use show_queue::{
    ActionHandle, ActionKind, ActionQueue, ActionStatus, ShowActionExecutor, ShowQueue,
    ShowQueueError,
};

pub mod show_updater;
pub use show_updater::{
    DAILY_UPDATE_KEY, RunOutcome, ScheduledWork, ShowUpdater, Submission, UpdateReport,
    WorkOutcome,
};
