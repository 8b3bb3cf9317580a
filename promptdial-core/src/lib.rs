pub mod config;
pub mod rails;
pub mod task;
pub mod text;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use rails::*;
pub use task::*;
pub use text::*;
pub use types::*;
