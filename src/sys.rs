pub mod appearance;
pub mod clock;
pub mod probe;
pub mod render;
pub mod screen;
pub mod timer;
pub mod worker;
