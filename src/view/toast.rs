/// Transient notifications. Controllers push, renderers drain.
use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Element, el};

/// Toasts kept before the oldest is dropped.
pub const TOAST_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Danger,
}

impl ToastLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Toast {
    pub fn node(&self) -> Element {
        el("div")
            .class(&format!("toast toast-{}", self.level.as_str()))
            .attr("role", "status")
            .text(self.message.clone())
    }
}

/// Bounded queue of the most recent toasts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.items.push_back(Toast {
            level,
            message: message.into(),
            at: Utc::now(),
        });
        while self.items.len() > TOAST_LIMIT {
            self.items.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Warning, message);
    }

    pub fn danger(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Danger, message);
    }

    /// Remove and return every queued toast, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.items.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&Toast> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any queued toast has `level`.
    pub fn any(&self, level: ToastLevel) -> bool {
        self.items.iter().any(|t| t.level == level)
    }
}
