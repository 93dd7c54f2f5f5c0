//! FIRST and FOLLOW set computation.

use crate::grammar::{Grammar, SymbolID};
use crate::types::{Map, Set};

/// FIRST and FOLLOW sets of a grammar, computed to fixpoint.
#[derive(Debug)]
pub struct FirstFollow {
    first: Map<SymbolID, Set<SymbolID>>,
    follow: Map<SymbolID, Set<SymbolID>>,
}

impl FirstFollow {
    pub fn new(grammar: &Grammar) -> Self {
        let first = compute_first(grammar);
        let follow = compute_follow(grammar, &first);
        Self { first, follow }
    }

    /// `FIRST(X)`. For a terminal this is `{X}`.
    pub fn first(&self, symbol: SymbolID) -> &Set<SymbolID> {
        &self.first[&symbol]
    }

    /// `FOLLOW(A)` for a nonterminal `A`.
    pub fn follow(&self, nonterminal: SymbolID) -> &Set<SymbolID> {
        &self.follow[&nonterminal]
    }

    /// `FIRST(β)` for a sequence of symbols. The empty sequence yields `{ε}`.
    pub fn first_of_sequence<I>(&self, sequence: I) -> Set<SymbolID>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        first_of_sequence(&self.first, sequence)
    }
}

fn first_of_sequence<I>(first: &Map<SymbolID, Set<SymbolID>>, sequence: I) -> Set<SymbolID>
where
    I: IntoIterator<Item = SymbolID>,
{
    let mut result = Set::default();
    for symbol in sequence {
        let first_x = &first[&symbol];
        result.extend(first_x.iter().copied().filter(|&s| s != SymbolID::EPSILON));
        if !first_x.contains(&SymbolID::EPSILON) {
            return result;
        }
    }
    // Every symbol was nullable (or the sequence was empty).
    result.insert(SymbolID::EPSILON);
    result
}

fn compute_first(grammar: &Grammar) -> Map<SymbolID, Set<SymbolID>> {
    let mut first: Map<SymbolID, Set<SymbolID>> = Map::default();

    // FIRST(t) = {t} for terminals, including ε and $.
    for (id, _) in grammar.terminals() {
        first.insert(id, Some(id).into_iter().collect());
    }
    for (id, _) in grammar.nonterminals() {
        first.insert(id, Set::default());
    }

    let mut changed = true;
    while changed {
        changed = false;

        for (_, production) in grammar.productions() {
            // Walk X1 X2 ... Xk, collecting FIRST(Xi) \ {ε} while the prefix
            // stays nullable. An ε-production falls out of the same walk
            // because FIRST(ε) = {ε}.
            let to_add = first_of_sequence(&first, production.right().iter().copied());

            let set = first.get_mut(&production.left()).unwrap();
            for symbol in to_add {
                changed |= set.insert(symbol);
            }
        }
    }

    first
}

fn compute_follow(
    grammar: &Grammar,
    first: &Map<SymbolID, Set<SymbolID>>,
) -> Map<SymbolID, Set<SymbolID>> {
    let mut follow: Map<SymbolID, Set<SymbolID>> = Map::default();
    for (id, _) in grammar.nonterminals() {
        follow.insert(id, Set::default());
    }
    follow
        .get_mut(&grammar.start_symbol())
        .unwrap()
        .insert(SymbolID::EOI);

    let mut changed = true;
    while changed {
        changed = false;

        for (_, production) in grammar.productions() {
            let right = production.right();
            for (i, &symbol) in right.iter().enumerate() {
                if grammar.symbol(symbol).is_terminal() {
                    continue;
                }

                let beta = &right[i + 1..];
                let first_beta = first_of_sequence(first, beta.iter().copied());

                let mut to_add: Vec<SymbolID> = first_beta
                    .iter()
                    .copied()
                    .filter(|&s| s != SymbolID::EPSILON)
                    .collect();
                if first_beta.contains(&SymbolID::EPSILON) {
                    to_add.extend(follow[&production.left()].iter().copied());
                }

                let set = follow.get_mut(&symbol).unwrap();
                for s in to_add {
                    changed |= set.insert(s);
                }
            }
        }
    }

    follow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(grammar: &Grammar, set: &Set<SymbolID>) -> Vec<String> {
        let mut names: Vec<String> = set
            .iter()
            .map(|&id| grammar.symbol(id).name().to_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn first_of_nullable_chain() {
        let grammar = Grammar::parse("S -> A B\nA -> a | ε\nB -> b").unwrap();
        let sets = FirstFollow::new(&grammar);

        let s = grammar.lookup("S").unwrap();
        let a = grammar.lookup("A").unwrap();
        assert_eq!(names(&grammar, sets.first(s)), ["a", "b"]);
        assert_eq!(names(&grammar, sets.first(a)), ["a", "ε"]);
    }

    #[test]
    fn first_includes_epsilon_when_fully_nullable() {
        let grammar = Grammar::parse("S -> A B\nA -> ε\nB -> ε").unwrap();
        let sets = FirstFollow::new(&grammar);
        let s = grammar.lookup("S").unwrap();
        assert_eq!(names(&grammar, sets.first(s)), ["ε"]);
    }

    #[test]
    fn follow_start_has_eoi() {
        let grammar = Grammar::parse("S -> a").unwrap();
        let sets = FirstFollow::new(&grammar);
        assert_eq!(
            names(&grammar, sets.follow(grammar.start_symbol())),
            ["$"]
        );
    }

    #[test]
    fn follow_through_nullable_suffix() {
        // FOLLOW(B) picks up FIRST(C) and, because C is nullable, FOLLOW(S).
        let grammar = Grammar::parse("S -> B C d\nB -> b\nC -> c | ε").unwrap();
        let sets = FirstFollow::new(&grammar);
        let b = grammar.lookup("B").unwrap();
        assert_eq!(names(&grammar, sets.follow(b)), ["c", "d"]);

        let grammar = Grammar::parse("S -> B C\nB -> b\nC -> c | ε").unwrap();
        let sets = FirstFollow::new(&grammar);
        let b = grammar.lookup("B").unwrap();
        assert_eq!(names(&grammar, sets.follow(b)), ["$", "c"]);
    }

    #[test]
    fn first_of_sequence_empty_is_epsilon() {
        let grammar = Grammar::parse("S -> a").unwrap();
        let sets = FirstFollow::new(&grammar);
        let first = sets.first_of_sequence(std::iter::empty());
        assert_eq!(names(&grammar, &first), ["ε"]);
    }

    #[test]
    fn sets_are_closed_under_one_more_round() {
        let grammar =
            Grammar::parse("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id").unwrap();
        let sets = FirstFollow::new(&grammar);

        // Applying the FIRST rule once more must not grow any set.
        for (_, production) in grammar.productions() {
            let derived = sets.first_of_sequence(production.right().iter().copied());
            for symbol in derived {
                assert!(sets.first(production.left()).contains(&symbol));
            }
        }

        // Same for the FOLLOW rules.
        for (_, production) in grammar.productions() {
            let right = production.right();
            for (i, &symbol) in right.iter().enumerate() {
                if grammar.symbol(symbol).is_terminal() {
                    continue;
                }
                let first_beta = sets.first_of_sequence(right[i + 1..].iter().copied());
                for s in first_beta.iter().copied().filter(|&s| s != SymbolID::EPSILON) {
                    assert!(sets.follow(symbol).contains(&s));
                }
                if first_beta.contains(&SymbolID::EPSILON) {
                    for &s in sets.follow(production.left()) {
                        assert!(sets.follow(symbol).contains(&s));
                    }
                }
            }
        }
    }
}
