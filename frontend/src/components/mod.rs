pub mod header;
pub mod heatmap;
pub mod todo_list;

pub use header::Header;
pub use heatmap::Heatmap;
pub use todo_list::TodoList;
