//! Domain types for SessionBars

pub mod bar;
pub mod row;

pub use bar::Bar;
pub use row::IndicatorRow;
