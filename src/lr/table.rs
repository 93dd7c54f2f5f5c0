//! LALR(1) table construction: kernel-based state merging, ACTION/GOTO
//! emission, and conflict diagnostics.

use super::automaton::{ItemSet, KernelEntry, Lr1Automaton};
use crate::grammar::{Grammar, Production, ProductionID, SymbolID};
use crate::types::Map;
use crate::util::display_fn;
use indexmap::map::Entry;
use std::collections::BTreeSet;
use std::fmt;

/// A parser action in the ACTION table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Reduce(ProductionID),
    Accept,
}

/// One merged LALR(1) state with its table rows.
#[derive(Debug)]
pub struct LalrState {
    pub items: ItemSet,
    pub actions: Map<SymbolID, Action>,
    pub gotos: Map<SymbolID, usize>,
}

/// The LALR(1) ACTION/GOTO tables of a grammar.
///
/// Conflicts do not fail construction: the first-written action is
/// retained, a diagnostic is recorded, and the caller inspects
/// [`conflicts`](Self::conflicts).
#[derive(Debug)]
pub struct ParseTable<'g> {
    grammar: &'g Grammar,
    augmented: Production,
    augmented_name: String,
    states: Vec<LalrState>,
    conflicts: Vec<String>,
    initial: usize,
}

impl<'g> ParseTable<'g> {
    /// Build the LR(1) collection for `grammar` and merge it into LALR(1)
    /// tables.
    pub fn build(grammar: &'g Grammar) -> Self {
        Self::from_automaton(Lr1Automaton::build(grammar))
    }

    /// Merge an existing canonical collection.
    pub fn from_automaton(automaton: Lr1Automaton<'g>) -> Self {
        let grammar = automaton.grammar();
        let lr1_states = automaton.states();

        // Group the LR(1) states by kernel-entry set; merging unions the
        // lookaheads of equal kernel entries. Merged states are numbered by
        // their first-discovered member, so LR(1) state 0 lands in LALR
        // state 0.
        let mut kernel_index: Map<BTreeSet<KernelEntry>, usize> = Map::default();
        let mut lr1_to_lalr: Vec<usize> = Vec::with_capacity(lr1_states.len());
        let mut merged: Vec<ItemSet> = Vec::new();

        for state in lr1_states {
            let kernel: BTreeSet<KernelEntry> = state
                .items
                .iter()
                .map(|item| (item.production, item.dot))
                .collect();
            let id = *kernel_index.entry(kernel).or_insert_with(|| {
                merged.push(ItemSet::new());
                merged.len() - 1
            });
            merged[id].extend(state.items.iter().copied());
            lr1_to_lalr.push(id);
        }
        let initial = lr1_to_lalr[0];

        // Transitions are induced: kernels determine GOTO targets, so every
        // member of a group maps its edges to the same merged states.
        let mut transitions: Vec<Map<SymbolID, usize>> = vec![Map::default(); merged.len()];
        for (lr1_id, state) in lr1_states.iter().enumerate() {
            let from = lr1_to_lalr[lr1_id];
            for (&symbol, &target) in &state.transitions {
                transitions[from].insert(symbol, lr1_to_lalr[target]);
            }
        }

        let mut conflicts = Vec::new();
        let mut states = Vec::new();
        for (id, items) in merged.into_iter().enumerate() {
            let row = &transitions[id];
            let mut actions: Map<SymbolID, Action> = Map::default();
            let mut gotos: Map<SymbolID, usize> = Map::default();

            for &item in &items {
                match automaton.symbol_after_dot(item) {
                    Some(symbol) if grammar.symbol(symbol).is_terminal() => {
                        let Some(&target) = row.get(&symbol) else {
                            continue;
                        };
                        insert_action(
                            &mut actions,
                            &mut conflicts,
                            grammar,
                            id,
                            symbol,
                            Action::Shift(target),
                        );
                    }
                    Some(_) => {}
                    None if item.production == ProductionID::AUGMENTED => {
                        if item.lookahead == SymbolID::EOI {
                            insert_action(
                                &mut actions,
                                &mut conflicts,
                                grammar,
                                id,
                                SymbolID::EOI,
                                Action::Accept,
                            );
                        }
                    }
                    None => {
                        insert_action(
                            &mut actions,
                            &mut conflicts,
                            grammar,
                            id,
                            item.lookahead,
                            Action::Reduce(item.production),
                        );
                    }
                }
            }

            for (&symbol, &target) in row {
                if grammar.symbol(symbol).is_nonterminal() {
                    gotos.insert(symbol, target);
                }
            }

            states.push(LalrState {
                items,
                actions,
                gotos,
            });
        }

        tracing::debug!(
            lr1_states = lr1_states.len(),
            lalr_states = states.len(),
            conflicts = conflicts.len(),
            "emitted LALR(1) tables",
        );

        let augmented = automaton.production(ProductionID::AUGMENTED).clone();
        let augmented_name = automaton.augmented_name().to_owned();
        Self {
            grammar,
            augmented,
            augmented_name,
            states,
            conflicts,
            initial,
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn states(&self) -> &[LalrState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The state holding the kernel of LR(1) state 0.
    pub fn initial_state(&self) -> usize {
        self.initial
    }

    /// Conflict diagnostics recorded during emission.
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    pub fn action(&self, state: usize, terminal: SymbolID) -> Option<Action> {
        self.states[state].actions.get(&terminal).copied()
    }

    /// Resolve a terminal by name against the ACTION columns of `state`.
    pub fn action_by_name(&self, state: usize, name: &str) -> Option<Action> {
        self.states[state]
            .actions
            .iter()
            .find_map(|(&symbol, &action)| {
                (self.grammar.symbol(symbol).name() == name).then_some(action)
            })
    }

    pub fn goto(&self, state: usize, nonterminal: SymbolID) -> Option<usize> {
        self.states[state].gotos.get(&nonterminal).copied()
    }

    /// Production lookup that also resolves the augmented production.
    pub fn production(&self, id: ProductionID) -> &Production {
        if id == ProductionID::AUGMENTED {
            &self.augmented
        } else {
            self.grammar.production(id)
        }
    }

    /// Render every state with its items, actions, and gotos.
    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(|f| {
            for (id, state) in self.states.iter().enumerate() {
                writeln!(f, "state {:02}:", id)?;
                for &item in &state.items {
                    writeln!(f, "  {}", self.display_item(item))?;
                }
                for (&symbol, action) in &state.actions {
                    let name = self.grammar.symbol(symbol).name();
                    match action {
                        Action::Shift(target) => writeln!(f, "  {} => shift({:02})", name, target)?,
                        Action::Reduce(production) => writeln!(
                            f,
                            "  {} => reduce({})",
                            name,
                            self.production(*production).display(self.grammar)
                        )?,
                        Action::Accept => writeln!(f, "  {} => accept", name)?,
                    }
                }
                for (&symbol, target) in &state.gotos {
                    writeln!(
                        f,
                        "  {} => goto({:02})",
                        self.grammar.symbol(symbol).name(),
                        target
                    )?;
                }
            }
            Ok(())
        })
    }

    fn display_item(&self, item: super::automaton::Item) -> impl fmt::Display + '_ {
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

/// Write `action` into the cell, recording a diagnostic when the cell
/// already holds a different action. The first-written action is retained;
/// re-inserting an identical action is not a conflict.
fn insert_action(
    actions: &mut Map<SymbolID, Action>,
    conflicts: &mut Vec<String>,
    grammar: &Grammar,
    state: usize,
    symbol: SymbolID,
    action: Action,
) {
    match actions.entry(symbol) {
        Entry::Vacant(entry) => {
            entry.insert(action);
        }
        Entry::Occupied(entry) => {
            if *entry.get() == action {
                return;
            }
            let kind = match (entry.get(), &action) {
                (Action::Reduce(_), Action::Reduce(_)) => "Reduce/Reduce",
                _ => "Shift/Reduce",
            };
            conflicts.push(format!(
                "{} conflict in state {} on {}",
                kind,
                state,
                grammar.symbol(symbol).name()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_grammar_has_no_conflicts() {
        let grammar = Grammar::parse("S -> a").unwrap();
        let table = ParseTable::build(&grammar);

        assert!(!table.is_empty());
        assert!(table.conflicts().is_empty());
    }

    #[test]
    fn accept_sits_on_eoi() {
        let grammar = Grammar::parse("S -> a").unwrap();
        let table = ParseTable::build(&grammar);

        let accepting = table
            .states()
            .iter()
            .enumerate()
            .filter(|(id, _)| table.action(*id, SymbolID::EOI) == Some(Action::Accept))
            .count();
        assert_eq!(accepting, 1);
    }

    #[test]
    fn merged_states_preserve_kernels() {
        let grammar = Grammar::parse("S -> A A\nA -> a A | b").unwrap();
        let automaton = Lr1Automaton::build(&grammar);

        let lr1_kernels: Vec<BTreeSet<KernelEntry>> = automaton
            .states()
            .iter()
            .map(|state| {
                state
                    .items
                    .iter()
                    .map(|item| (item.production, item.dot))
                    .collect()
            })
            .collect();

        let table = ParseTable::from_automaton(automaton);
        assert!(table.len() <= lr1_kernels.len());

        // Every LALR state's kernel must equal the kernel of some LR(1)
        // state that merged into it.
        for state in table.states() {
            let kernel: BTreeSet<KernelEntry> = state
                .items
                .iter()
                .map(|item| (item.production, item.dot))
                .collect();
            assert!(lr1_kernels.contains(&kernel));
        }
    }

    #[test]
    fn ambiguous_grammar_reports_conflicts() {
        // S -> S S | a is ambiguous: shift/reduce on `a`.
        let grammar = Grammar::parse("S -> S S | a").unwrap();
        let table = ParseTable::build(&grammar);

        assert!(!table.conflicts().is_empty());
        assert!(table
            .conflicts()
            .iter()
            .all(|c| c.contains("conflict in state")));
    }

    #[test]
    fn reduce_reduce_conflict_diagnostic() {
        // Both A and B reduce from `a` with lookahead $.
        let grammar = Grammar::parse("S -> A | B\nA -> a\nB -> a").unwrap();
        let table = ParseTable::build(&grammar);

        assert!(table
            .conflicts()
            .iter()
            .any(|c| c.starts_with("Reduce/Reduce conflict in state")));
    }

    #[test]
    fn every_cell_single_action_or_diagnosed() {
        let grammar = Grammar::parse("S -> S S | a").unwrap();
        let table = ParseTable::build(&grammar);

        // Cells hold exactly one action by construction; an overwrite
        // attempt must have left a diagnostic behind.
        let total_actions: usize = table.states().iter().map(|s| s.actions.len()).sum();
        assert!(total_actions > 0);
        assert!(!table.conflicts().is_empty());
    }
}
