//! Terminal browser for an anime catalog, built around a themeable,
//! sortable, filterable and expandable data grid widget.

pub mod controller;
pub mod domain;
pub mod grid;
pub mod inputter;
pub mod loader;
pub mod logging;
pub mod model;
pub mod page;
pub mod renderers;
pub mod source;
pub mod state;
pub mod table;
pub mod theme;
pub mod ui;
