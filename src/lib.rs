//! Records core: category-driven activity forms and dashboard analytics.
//!
//! Everything here is a synchronous pass over caller-owned snapshots.
//! Storage, id generation and rendering live outside the crate; "now" always
//! comes from an injected [`clock::Clock`].

pub mod analytics;
pub mod categories;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod describe;
pub mod error;
pub mod reconcile;
pub mod records;
pub mod status;
pub mod types;

pub use analytics::{compute_activity_stats, compute_note_stats, ActivityStats, NoteStats};
pub use categories::{CategoryDefinition, CategoryRegistry, SchemaRegistry};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_config, Config};
pub use dashboard::{build_dashboard, Dashboard};
pub use describe::{describe, describe_with_schema};
pub use error::RegistroError;
pub use reconcile::{reconcile, FormState};
pub use status::is_charging_status;
pub use types::{Activity, Note, NoteStatus};
