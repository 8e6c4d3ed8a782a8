pub mod use_heatmap;
pub mod use_todos;

pub use use_heatmap::use_heatmap;
pub use use_todos::use_todos;
