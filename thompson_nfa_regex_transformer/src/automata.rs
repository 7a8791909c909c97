use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use derive_getters::Getters;
use itertools::Itertools;
use log::trace;
use thompson_nfa_util::{State, StateIdSource, Symbol};

use crate::regex::Ast;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Getters)]
pub struct Transition {
    from: State,
    to: State,
    label: Symbol,
}

impl Transition {
    fn epsilon(from: State, to: State) -> Transition {
        Transition { from, to, label: Symbol::Epsilon }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -{}-> {}", self.from, self.label, self.to)
    }
}

/// A compiled NFA. States keep their creation order.
#[derive(Debug, Clone, Getters)]
pub struct Automaton {
    states: Vec<State>,
    start: State,
    finals: Vec<State>,
    transitions: Vec<Transition>,
}

impl Automaton {
    pub fn is_final(&self, state: State) -> bool {
        self.finals.contains(&state)
    }

    pub fn outgoing(&self, state: State) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.from == state)
    }

    pub fn epsilon_closure(&self, from: impl IntoIterator<Item = State>) -> BTreeSet<State> {
        let mut closure = BTreeSet::new();
        let mut stack = from.into_iter().collect_vec();

        while let Some(s) = stack.pop() {
            if !closure.insert(s) {
                continue;
            }
            for t in self.outgoing(s).filter(|t| t.label.is_epsilon()) {
                if !closure.contains(&t.to) {
                    stack.push(t.to);
                }
            }
        }

        closure
    }

    /// Runs the word through the automaton, tracking every state reachable so far.
    pub fn accepts(&self, word: &str) -> bool {
        let mut current = self.epsilon_closure([self.start]);

        for c in word.chars() {
            let label = Symbol::Char(c);
            let next = current
                .iter()
                .flat_map(|s| self.outgoing(*s).filter(|t| t.label == label).map(|t| t.to))
                .collect_vec();
            if next.is_empty() {
                return false;
            }
            current = self.epsilon_closure(next);
        }

        current.iter().any(|s| self.is_final(*s))
    }
}

impl Display for Automaton {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "states: {}", self.states.iter().join(" "))?;
        writeln!(f, "start: {}", self.start)?;
        writeln!(f, "finals: {}", self.finals.iter().join(" "))?;
        for t in &self.transitions {
            writeln!(f, "{t}")?;
        }

        Ok(())
    }
}

/// Owns the state counter for a run of builds. Ids keep increasing across
/// builds until [`Builder::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    ids: StateIdSource,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first_id: usize) -> Self {
        Self { ids: StateIdSource::starting_at(first_id) }
    }

    pub fn next_id(&self) -> usize {
        self.ids.peek()
    }

    pub fn reset(&mut self) {
        self.ids.reset();
    }

    pub fn build(&mut self, ast: &Ast) -> Automaton {
        let automaton = self.fragment(ast);
        trace!(
            "built {} states and {} transitions for {ast}",
            automaton.states.len(),
            automaton.transitions.len()
        );
        automaton
    }

    // Sub-fragments are moved into their parent, never shared
    fn fragment(&mut self, ast: &Ast) -> Automaton {
        match ast {
            Ast::Literal(symbol) => {
                let (s1, s2) = (self.ids.fresh(), self.ids.fresh());
                Automaton {
                    states: vec![s1, s2],
                    start: s1,
                    finals: vec![s2],
                    transitions: vec![Transition { from: s1, to: s2, label: *symbol }],
                }
            }
            Ast::Union(l, r) => {
                let (a1, a2) = (self.fragment(l), self.fragment(r));
                let s_start = self.ids.fresh();

                let mut transitions = a1.transitions;
                transitions.extend(a2.transitions);
                transitions.push(Transition::epsilon(s_start, a1.start));
                transitions.push(Transition::epsilon(s_start, a2.start));

                let mut states = a1.states;
                states.extend(a2.states);
                states.push(s_start);

                let mut finals = a1.finals;
                finals.extend(a2.finals);

                Automaton { states, start: s_start, finals, transitions }
            }
            Ast::Concat(l, r) => {
                let (a1, a2) = (self.fragment(l), self.fragment(r));

                let mut transitions = a1.transitions;
                transitions.extend(a2.transitions);
                transitions.extend(a1.finals.iter().map(|f| Transition::epsilon(*f, a2.start)));

                let mut states = a1.states;
                states.extend(a2.states);

                Automaton { states, start: a1.start, finals: a2.finals, transitions }
            }
            Ast::Star(inner) => {
                let a = self.fragment(inner);
                let s_start = self.ids.fresh();

                let mut transitions = a.transitions;
                for f in &a.finals {
                    transitions.push(Transition::epsilon(*f, a.start));
                    transitions.push(Transition::epsilon(*f, s_start));
                }
                transitions.push(Transition::epsilon(s_start, a.start));

                let mut states = a.states;
                states.push(s_start);

                let mut finals = a.finals;
                finals.push(s_start);

                Automaton { states, start: s_start, finals, transitions }
            }
        }
    }
}
