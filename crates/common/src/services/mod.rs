//! Domain services
//!
//! Each service wraps a [`Repository`](crate::db::Repository) and applies the
//! viewer rules on top of it: mutations demand a signed-in viewer, list
//! queries degrade to an empty result when there is none, and ownership
//! failures are indistinguishable from missing rows.

mod categories;
mod challenges;
mod copies;
mod users;

pub use categories::CategoryService;
pub use challenges::{ChallengeService, SubmissionSummary, DEFAULT_CHALLENGES};
pub use copies::{CopyFilter, CopyService};
pub use users::{SignedIn, UserService};

use crate::db::models::User;
use crate::errors::{AppError, Result};

/// Resolve the viewer for a mutation, failing when nobody is signed in
pub fn require_user(viewer: Option<&User>) -> Result<&User> {
    viewer.ok_or_else(AppError::unauthenticated)
}
