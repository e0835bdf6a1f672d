pub mod compose;
pub mod icon_cache;
pub mod menu_bar;
pub mod preview;
