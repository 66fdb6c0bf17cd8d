pub mod render;
pub mod screen;
pub mod symbols;
