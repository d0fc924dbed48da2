mod dialog;
mod error;
mod fetch;
mod layout;
mod long_read;
mod record;
mod tabs;
mod task_log;

pub use dialog::{EditDialogController, LoadPhase};
pub use error::{DialogError, FetchError};
pub use fetch::RecordFetcher;
pub use layout::{DialogLayout, LayoutProbe, SidebarMode, StaticLayoutProbe};
pub use long_read::{LongReadGuard, LongReadToken};
pub use record::{DbRecord, RecordRef};
pub use tabs::{DialogTab, TabLoader, TabModule, TabRegistry};
pub use task_log::{
    LogLevel, TaskLogEntry, TaskLogPage, TaskLogSource, TaskLogTailer, TaskState,
};

pub use chrono;
