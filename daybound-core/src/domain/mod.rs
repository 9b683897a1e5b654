//! Domain types shared by every engine component.

pub mod candle;
pub mod direction;
pub mod ids;
pub mod series;

pub use candle::Candle;
pub use direction::Direction;
pub use ids::RowId;
pub use series::{CandleSeries, DataError, SeriesError, WindowCursor};
