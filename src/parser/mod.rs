// Small nom parsers for option values given on the command line or in config

pub mod color;
pub mod lexer;

// Public API re-exports
pub use color::{parse_color, parse_color_list, Rgb};
