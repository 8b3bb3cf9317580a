pub mod dispatch;
pub mod traits;
