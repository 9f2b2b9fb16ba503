pub mod core;
pub mod tags;

pub use self::core::{IndexBuilder, IndexError, ScanStats};
pub use self::tags::TagRules;
