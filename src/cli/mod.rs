pub mod convert;
pub mod list;
pub mod ui;
