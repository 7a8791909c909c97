pub mod automata;
pub mod regex;

pub use crate::automata::{Automaton, Builder, Transition};
pub use crate::regex::{parse, Ast, SyntaxError, MAX_DEPTH};
pub use thompson_nfa_util::{State, Symbol};

/// Parses `expression` and builds its automaton with a fresh builder numbering from 0.
pub fn compile(expression: &str) -> Result<Automaton, SyntaxError> {
    let ast = parse(expression)?;
    Ok(Builder::new().build(&ast))
}
