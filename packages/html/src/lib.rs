//! # NextNote HTML
//!
//! Converts documents to HTML for export and the clipboard, and turns pasted
//! HTML back into a document.
//!
//! Export is deterministic: the same tree always produces the same bytes.
//! Marks nest in a fixed order, outermost first: `strong`, `em`, `u`, `s`,
//! `sup`, `sub`, one style `span` (color, font family, font size, line
//! height), `mark`, `a`.
//!
//! Import never fails. Anything it cannot place is reduced to text.

mod compiler;
mod import;
pub mod lexer;

#[cfg(test)]
mod tests;

pub use compiler::{compile_to_html, HtmlOptions};
pub use import::{parse_html, text_to_doc};
