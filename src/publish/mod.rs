//! Publishing of long-form content.

mod telegraph;

pub use telegraph::TelegraphPublisher;

use crate::error::Result;
use crate::markdown::Node;
use async_trait::async_trait;

/// A page ready for publishing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub title: String,
    pub content: Vec<Node>,
}

impl Page {
    pub fn new(title: impl Into<String>, content: Vec<Node>) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }
}

/// Trait for a page publishing service.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a page, returning its public URL.
    async fn publish(&self, page: &Page) -> Result<String>;
}
