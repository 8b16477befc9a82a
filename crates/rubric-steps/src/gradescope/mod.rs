//! Steps atados a la plataforma de entrega: metadata, atraso, velocidad,
//! mensaje del día y escritura del reporte.

mod lateness;
mod limit_velocity;
mod motd;
mod results;
mod submission_metadata;
mod types;

pub use lateness::{Lateness, LatenessConfig};
pub use limit_velocity::{LimitVelocity, LimitVelocityConfig};
pub use motd::{Motd, MotdConfig};
pub use results::{ResultsConfig, WriteResults};
pub use submission_metadata::{ReadSubMetadata, SubMetadataConfig};
pub use types::{
    Assignment, PreviousSubmission, SubmissionMetadata, User, UserAssignmentOverride,
    KEY_EXTRA_TOKENS, KEY_RESULTS, KEY_SUBMISSION_METADATA,
};
