//! Application services for team management and pull request review.

mod error;
mod pull_request;
mod team;
mod user;

pub use error::{ErrorKind, ErrorResponse, NotFoundTarget, ReviewError, ReviewResult};
pub use pull_request::{CreatePullRequestRequest, PullRequestService, Reassignment};
pub use team::{CreateTeamRequest, TeamMemberRequest, TeamService};
pub use user::UserService;
