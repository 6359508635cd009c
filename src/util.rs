pub mod path;
pub mod poll;
