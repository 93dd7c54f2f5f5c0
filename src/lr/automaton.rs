//! Canonical LR(1) collection construction.

use crate::first_follow::FirstFollow;
use crate::grammar::{Grammar, Production, ProductionID, SymbolID};
use crate::types::Map;
use crate::util::display_fn;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// An LR(1) item: a production, a dot position, and a single lookahead
/// terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: ProductionID,
    pub dot: usize,
    pub lookahead: SymbolID,
}

/// A production/dot pair stripped of its lookahead. States sharing the
/// same kernel-entry set merge under LALR(1).
pub type KernelEntry = (ProductionID, usize);

/// A closed set of LR(1) items. `BTreeSet` gives the exact-set equality
/// the canonical collection compares by, and ordered iteration keeps every
/// downstream construction deterministic.
pub type ItemSet = BTreeSet<Item>;

/// One state of the canonical collection with its outgoing transitions.
#[derive(Debug)]
pub struct State {
    pub items: ItemSet,
    pub transitions: Map<SymbolID, usize>,
}

/// The canonical LR(1) collection of a grammar, states numbered in
/// discovery order.
#[derive(Debug)]
pub struct Lr1Automaton<'g> {
    grammar: &'g Grammar,
    first: FirstFollow,
    augmented: Production,
    augmented_name: String,
    states: Vec<State>,
}

impl<'g> Lr1Automaton<'g> {
    /// Build the canonical collection for `grammar`, augmented with
    /// `S' -> S`.
    pub fn build(grammar: &'g Grammar) -> Self {
        let start = grammar.start_symbol();
        let mut automaton = Self {
            grammar,
            first: FirstFollow::new(grammar),
            augmented: Production::new(SymbolID::AUGMENTED, vec![start]),
            augmented_name: format!("{}'", grammar.symbol(start).name()),
            states: Vec::new(),
        };
        automaton.populate();
        automaton
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The name of the augmented start symbol `S'`.
    pub fn augmented_name(&self) -> &str {
        &self.augmented_name
    }

    /// Production lookup that also resolves the augmented production.
    pub fn production(&self, id: ProductionID) -> &Production {
        if id == ProductionID::AUGMENTED {
            &self.augmented
        } else {
            self.grammar.production(id)
        }
    }

    /// The right-hand-side symbol after the dot, or `None` when the item is
    /// complete. Items over an ε-production are complete at dot zero: the
    /// `[ε]` marker is not a consumable symbol.
    pub fn symbol_after_dot(&self, item: Item) -> Option<SymbolID> {
        let production = self.production(item.production);
        if production.is_epsilon() {
            return None;
        }
        production.right().get(item.dot).copied()
    }

    /// CLOSURE(I): for every `[A -> α·Bβ, a]` with `B` nonterminal, add
    /// `[B -> ·γ, b]` for every production of `B` and every terminal
    /// `b ∈ FIRST(βa)`.
    pub fn closure(&self, items: &mut ItemSet) {
        let mut worklist: VecDeque<Item> = items.iter().copied().collect();

        while let Some(item) = worklist.pop_front() {
            let Some(b) = self.symbol_after_dot(item) else {
                continue;
            };
            if self.grammar.symbol(b).is_terminal() {
                continue;
            }

            let production = self.production(item.production);
            let beta = &production.right()[item.dot + 1..];
            let first = self
                .first
                .first_of_sequence(beta.iter().copied().chain(Some(item.lookahead)));

            for (id, _) in self.grammar.productions_for(b) {
                for &lookahead in &first {
                    if lookahead == SymbolID::EPSILON {
                        continue;
                    }
                    let new_item = Item {
                        production: id,
                        dot: 0,
                        lookahead,
                    };
                    if items.insert(new_item) {
                        worklist.push_back(new_item);
                    }
                }
            }
        }
    }

    /// GOTO(I, X): advance the dot over `X` and close the result.
    pub fn goto(&self, items: &ItemSet, symbol: SymbolID) -> ItemSet {
        let mut moved = ItemSet::new();
        for &item in items {
            if self.symbol_after_dot(item) == Some(symbol) {
                moved.insert(Item {
                    dot: item.dot + 1,
                    ..item
                });
            }
        }
        if !moved.is_empty() {
            self.closure(&mut moved);
        }
        moved
    }

    fn populate(&mut self) {
        let mut index: Map<ItemSet, usize> = Map::default();
        let mut worklist: VecDeque<usize> = VecDeque::new();

        let mut initial = ItemSet::new();
        initial.insert(Item {
            production: ProductionID::AUGMENTED,
            dot: 0,
            lookahead: SymbolID::EOI,
        });
        self.closure(&mut initial);

        self.states.push(State {
            items: initial.clone(),
            transitions: Map::default(),
        });
        index.insert(initial, 0);
        worklist.push_back(0);

        while let Some(id) = worklist.pop_front() {
            // Symbols with a dot in front of them, in item order.
            let mut labels: Vec<SymbolID> = Vec::new();
            for &item in &self.states[id].items {
                if let Some(symbol) = self.symbol_after_dot(item) {
                    if !labels.contains(&symbol) {
                        labels.push(symbol);
                    }
                }
            }

            for symbol in labels {
                let next = self.goto(&self.states[id].items, symbol);
                if next.is_empty() {
                    continue;
                }

                let target = match index.get(&next) {
                    Some(&target) => target,
                    None => {
                        let target = self.states.len();
                        self.states.push(State {
                            items: next.clone(),
                            transitions: Map::default(),
                        });
                        index.insert(next, target);
                        worklist.push_back(target);
                        target
                    }
                };
                self.states[id].transitions.insert(symbol, target);
            }
        }

        tracing::debug!(
            states = self.states.len(),
            "constructed the canonical LR(1) collection",
        );
    }

    /// Render one item as `[A -> α · β, a]`.
    pub fn display_item(&self, item: Item) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            let production = self.production(item.production);
            let left = if item.production == ProductionID::AUGMENTED {
                self.augmented_name.as_str()
            } else {
                self.grammar.symbol(production.left()).name()
            };
            write!(f, "[{} ->", left)?;
            for (i, &symbol) in production.right().iter().enumerate() {
                if i == item.dot {
                    f.write_str(" ·")?;
                }
                write!(f, " {}", self.grammar.symbol(symbol).name())?;
            }
            if item.dot == production.right().len() {
                f.write_str(" ·")?;
            }
            write!(f, ", {}]", self.grammar.symbol(item.lookahead).name())
        })
    }
}
