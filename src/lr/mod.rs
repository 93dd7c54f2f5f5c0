//! The parser-generation half: canonical LR(1) construction, LALR(1)
//! merging and table emission, and the shift-reduce driver.

pub mod automaton;
pub mod parser;
pub mod table;

pub use self::automaton::{Item, Lr1Automaton};
pub use self::parser::Parser;
pub use self::table::{Action, ParseTable};
