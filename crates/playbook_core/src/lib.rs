//! # playbook_core - Play Recording Engine for a 2-D Field
//!
//! Records a play as a baseline plus sparse per-step deltas, rebuilds any
//! step on demand through a snapshot cache, and interpolates between steps
//! for smooth playback.
//!
//! ## Features
//! - Magnetic grid snapping for dragged entities
//! - Delta-encoded timeline (only moved entities are stored per step)
//! - Cached reconstruction, linear interpolation between steps
//! - Idle / Recording / Playback session state machine
//! - Row-level import/export for formation and strategy tables
//!
//! ```rust
//! use playbook_core::{Session, Pos};
//!
//! let mut session = Session::default();
//! session.start_recording().unwrap();
//! session.drag_label("B1", 20.0, 10.0).unwrap();
//! session.commit_step().unwrap();
//! session.finish_recording().unwrap();
//!
//! let halfway = session.query_snapshot_at(0.5).unwrap();
//! let b1 = halfway.position_of(session.roster(), "B1").unwrap();
//! assert_eq!(b1, Pos::new(13.0, 6.5));
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod interchange;
pub mod roster;
pub mod session;
pub mod snapshot;
pub mod timeline;

pub use config::{DisplayConfig, EngineConfig, PlaybackConfig, RecordingConfig, SnapConfig};
pub use error::{CoreError, Result};
pub use field::{CoordinateTransform, Landmark, Pos, FIELD_LEN, FIELD_WID};
pub use interchange::{
    formation_from_rows, formation_to_rows, timeline_from_rows, timeline_to_rows,
    FormationRecord, ImportReport, RowIssue, SkippedRow, StrategyRecord,
};
pub use roster::{Entity, EntityKind, Roster, Team, DISC_LABEL};
pub use session::{Mode, Session, SessionStatus};
pub use snapshot::{Formation, Snapshot};
pub use timeline::{
    positions_at, CommitOutcome, Delta, DeltaRecorder, FollowLink, FollowLinks, LoopMode,
    PlaybackCursor, SnapshotReconstructor, Timeline,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
