pub mod comp_header;
pub mod comp_simple;
