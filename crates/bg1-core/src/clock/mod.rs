//! Clock facility for the time board.
//!
//! - `DateTimeSource`: snapshot of the current date and time as display strings
//! - `LiveElement`: the per-location text cell a live widget writes into
//! - `LiveClockWidget`: an updater that keeps a `LiveElement` current
//!
//! The watchdog never derives time itself; it only watches the element for
//! content changes.

pub mod element;
pub mod source;
pub mod widget;

pub use element::LiveElement;
pub use source::{DateTimeSource, DateTimeStrings, FixedDateTime, SystemDateTime};
pub use widget::{LiveClockWidget, SystemClockWidget, WidgetHandle};
