pub mod beats;
pub mod text;
