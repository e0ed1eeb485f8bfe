//! Persistence port for scan output.

use crate::domain::error::OppscanError;
use crate::domain::opportunity::Opportunity;

/// Sink for qualified opportunities. The core only calls this seam;
/// what lies behind it (database, file, nothing) is the caller's
/// business.
pub trait OpportunityRepository {
    fn save_opportunity(&self, opportunity: &Opportunity) -> Result<(), OppscanError>;
}
