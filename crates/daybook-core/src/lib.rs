//! Browse-and-edit core for dated report lists.
//!
//! Records fetched from a loosely specified backend are bucketed into a
//! Year → Month → Day tree, a day's line items can be grouped by a secondary
//! key, and a report's items can be edited as a draft that is only ever
//! committed whole.

pub mod backend;
pub mod config;
pub mod date_key;
pub mod draft;
pub mod error;
pub mod grouping;
pub mod hierarchy;
pub mod record;
pub mod selection;
pub mod session;
pub mod validation;

pub use backend::ReportBackend;
pub use config::ViewConfig;
pub use date_key::{DateKey, DateSource, IsoDay, RawPlacement};
pub use draft::{Draft, DraftEditManager, DraftState, EditGate, SaveBlocked, SaveRequest, Snapshot};
pub use error::{BackendError, BackendErrorKind, DraftError, ErrorCategory, Notice, ParseError};
pub use grouping::{Group, GroupKey, GroupSpec};
pub use hierarchy::{DateHierarchy, DayNode, MonthNode, RawDayNode, YearNode};
pub use record::{Item, Record};
pub use selection::SelectionController;
pub use session::ReportBrowser;
pub use validation::{RemediationRule, ValidationError};
