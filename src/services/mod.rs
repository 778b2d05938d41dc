pub mod credentials;
pub mod reset;

pub use credentials::{AuthOutcome, CredentialService};
pub use reset::{ResetSettings, ResetTokenService};
