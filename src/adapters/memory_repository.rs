//! In-memory opportunity repository.

use std::sync::Mutex;

use crate::domain::error::OppscanError;
use crate::domain::opportunity::Opportunity;
use crate::ports::repository::OpportunityRepository;

/// Keeps saved opportunities in process memory. Useful for tests and
/// for one-shot CLI runs that only print results.
#[derive(Default)]
pub struct InMemoryRepository {
    saved: Mutex<Vec<Opportunity>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<Opportunity> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl OpportunityRepository for InMemoryRepository {
    fn save_opportunity(&self, opportunity: &Opportunity) -> Result<(), OppscanError> {
        let mut saved = self.saved.lock().map_err(|_| OppscanError::Report {
            reason: "repository lock poisoned".into(),
        })?;
        saved.push(opportunity.clone());
        Ok(())
    }
}
