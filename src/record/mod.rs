//! Records and monitors
//!
//! A [`Record`] describes one measurement file: the monitor that produced
//! it and the UTC interval it covers. Records are immutable and compared by
//! their backing path. [`MonitorIdentity`] is the `(site, monitor, station)`
//! view used for listing and filtering.

mod decoder;
mod errors;
mod list;
mod monitor;
mod record;

pub use decoder::{RecordDecoder, SidFileDecoder};
pub use errors::{DecodeError, DecodeResult};
pub use list::RecordList;
pub use monitor::{parse_angle, Coordinates, MonitorIdentity, IDENTIFIER_SEPARATOR};
pub use record::Record;
