//! Path-based outcomes: price triggers and the first-touch resolver.

pub mod resolver;
pub mod trigger;

pub use resolver::{
    resolve_first_touch, resolve_in_window, resolve_with_cursor, PathOutcome, ResolveError,
};
pub use trigger::{fill_price, GapPolicy, PriceTrigger, TouchDirection};
