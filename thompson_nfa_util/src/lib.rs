use std::fmt::{Display, Formatter};

/// Character written in an expression to stand for the empty word.
pub const EPSILON_INPUT: char = 'λ';

/// Rendered label of an epsilon transition.
pub const EPSILON_LABEL: &str = "ε";

#[inline(always)]
pub const fn is_alphabet_char(c: char) -> bool {
    c.is_ascii_lowercase()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Char(char),
    Epsilon,
}

impl Symbol {
    /// Maps an input character to its symbol, `None` if it is outside the alphabet.
    pub const fn from_input(c: char) -> Option<Symbol> {
        if c == EPSILON_INPUT {
            Some(Symbol::Epsilon)
        } else if is_alphabet_char(c) {
            Some(Symbol::Char(c))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    /// Character that reproduces this symbol when parsed.
    pub const fn input_char(&self) -> char {
        match self {
            Symbol::Char(c) => *c,
            Symbol::Epsilon => EPSILON_INPUT,
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Char(c) => write!(f, "{c}"),
            Symbol::Epsilon => f.write_str(EPSILON_LABEL),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(usize);

impl State {
    #[inline(always)]
    pub const fn id(&self) -> usize {
        self.0
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Hands out states with monotonically increasing ids.
#[derive(Debug, Clone)]
pub struct StateIdSource {
    first: usize,
    next: usize,
}

impl StateIdSource {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(first: usize) -> Self {
        Self { first, next: first }
    }

    #[inline(always)]
    pub fn fresh(&mut self) -> State {
        let s = State(self.next);
        self.next += 1;
        s
    }

    pub const fn peek(&self) -> usize {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = self.first;
    }
}

impl Default for StateIdSource {
    fn default() -> Self {
        Self::new()
    }
}
