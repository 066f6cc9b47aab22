//! Client-side layer of the Registrar dashboard: a blocking typed API client
//! plus the explicit form-flow state machine the entity forms run on.

pub mod api;
pub mod error;
pub mod form;

pub use api::ApiClient;
pub use error::ClientError;
pub use form::{FormBackend, FormFlow, FormState, SubmissionOutcome};
