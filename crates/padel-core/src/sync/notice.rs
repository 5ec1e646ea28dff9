//! Transient user-facing notices.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::types::EntityName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message the presentation layer shows briefly, e.g. as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub entity: EntityName,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(entity: EntityName, message: impl Into<String>) -> Self {
        Self {
            entity,
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(entity: EntityName, message: impl Into<String>) -> Self {
        Self {
            entity,
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.entity, self.message)
    }
}

/// Receives notices for one list instance.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(entity = %notice.entity, "{}", notice.message),
            NoticeLevel::Error => error!(entity = %notice.entity, "{}", notice.message),
        }
    }
}

// A closed receiver means nobody is showing notices any more.
impl Notifier for mpsc::UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        let _ = self.send(notice);
    }
}
