//! Result envelope and printing for command output.

mod format;
mod model;
mod result_builder;

pub use format::OutputFormat;
pub use model::*;
pub use result_builder::{ResultBuilder, TextOutput, print_result};
