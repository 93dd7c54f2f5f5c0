//! The shift-reduce parser driver.

use super::table::{Action, ParseTable};

/// A stack machine driven by an LALR(1) [`ParseTable`].
///
/// Input is a sequence of terminal *names*; the caller decides how its
/// tokens map onto grammar terminals. The end-of-input marker is appended
/// internally.
#[derive(Debug)]
pub struct Parser<'t, 'g> {
    table: &'t ParseTable<'g>,
}

impl<'t, 'g> Parser<'t, 'g> {
    pub fn new(table: &'t ParseTable<'g>) -> Self {
        Self { table }
    }

    /// Run the machine over `input`. Returns `true` on accept; any missing
    /// action, missing GOTO entry, or stack underflow rejects.
    pub fn parse<I>(&self, input: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let table = self.table;
        let tokens: Vec<I::Item> = input.into_iter().collect();

        let mut stack: Vec<usize> = vec![table.initial_state()];
        let mut cursor = 0;

        loop {
            let Some(&state) = stack.last() else {
                return false;
            };
            let name = tokens.get(cursor).map(|t| t.as_ref()).unwrap_or("$");

            let Some(action) = table.action_by_name(state, name) else {
                return false;
            };

            match action {
                Action::Shift(next) => {
                    stack.push(next);
                    cursor += 1;
                }

                Action::Reduce(id) => {
                    let production = table.production(id);
                    // ε-productions pop nothing.
                    if !production.is_epsilon() {
                        for _ in 0..production.right().len() {
                            if stack.pop().is_none() {
                                return false;
                            }
                        }
                    }
                    let Some(&top) = stack.last() else {
                        return false;
                    };
                    let Some(next) = table.goto(top, production.left()) else {
                        return false;
                    };
                    stack.push(next);
                }

                Action::Accept => return true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn accepts(grammar: &str, input: &str) -> bool {
        let grammar = Grammar::parse(grammar).unwrap();
        let table = ParseTable::build(&grammar);
        let parser = Parser::new(&table);
        parser.parse(input.chars().map(|c| c.to_string()))
    }

    #[test]
    fn trivial_grammar() {
        assert!(accepts("S -> a", "a"));
        assert!(!accepts("S -> a", "aa"));
        assert!(!accepts("S -> a", ""));
    }

    #[test]
    fn recursive_grammar() {
        let grammar = "S -> A A\nA -> a A | b";
        assert!(accepts(grammar, "abab"));
        assert!(accepts(grammar, "aaabab"));
        assert!(accepts(grammar, "bb"));
        assert!(!accepts(grammar, "aab"));
        assert!(!accepts(grammar, "ababab"));
        assert!(!accepts(grammar, ""));
    }

    #[test]
    fn epsilon_production_pops_nothing() {
        let grammar = "S -> a A b\nA -> c | ε";
        assert!(accepts(grammar, "acb"));
        assert!(accepts(grammar, "ab"));
        assert!(!accepts(grammar, "acc"));
        assert!(!accepts(grammar, "a"));
    }

    #[test]
    fn unknown_terminal_rejects() {
        assert!(!accepts("S -> a", "z"));
    }
}
