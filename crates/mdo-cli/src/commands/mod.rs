pub mod dispatch;
pub mod harmonize;
pub mod schema;
