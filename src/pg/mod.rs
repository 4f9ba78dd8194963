pub mod console;
pub mod types;

pub use console::Console;
