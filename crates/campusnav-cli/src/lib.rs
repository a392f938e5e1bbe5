//! Campus navigation CLI library.
//!
//! Terminal styling, output rendering, the text map adapter, and the
//! interactive command parser used by the `campusnav` binary.

pub mod logging;
pub mod output;
pub mod repl;
pub mod terminal;
pub mod text_map;
