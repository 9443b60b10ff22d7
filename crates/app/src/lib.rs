pub mod app;
pub mod error;
pub mod gate;
pub mod period;
pub mod services;

pub use app::{AppConfig, AppState};
pub use error::{ApiError, AppError, Result};
pub use gate::{AuthError, IdentityGate, OrgMemberProfile, ResolvedIdentity, TokenGate};
pub use period::Period;
