pub mod list_view;

pub use list_view::{view_stats, ListView, ListViewArgs, ListViewMessage, ViewStats};
