pub mod formatter;
pub mod markdown;
