//! Static calendar provider
//!
//! Hands out one configured scheduling link. Stands in for a real
//! Calendly-style integration in single-process deployments and tests.

use async_trait::async_trait;

use leadflow_core::{CalendarProvider, CollaboratorError, Lead};

pub struct StaticCalendarProvider {
    link: String,
}

impl StaticCalendarProvider {
    pub fn new(link: impl Into<String>) -> Self {
        Self { link: link.into() }
    }
}

#[async_trait]
impl CalendarProvider for StaticCalendarProvider {
    async fn scheduling_link(&self, _lead: &Lead) -> Result<String, CollaboratorError> {
        Ok(self.link.clone())
    }
}
