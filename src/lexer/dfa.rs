//! Subset construction over a multi-rule NFA and table-filling DFA
//! minimization.

use super::nfa::{Fragment, Nfa, NfaStateID};
use super::tokenizer::TokenType;
use crate::types::Map;
use bit_set::BitSet;
use std::collections::VecDeque;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct DfaStateID {
    raw: u32,
}

impl DfaStateID {
    pub const START: Self = Self::new(0);

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Debug for DfaStateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.raw)
    }
}

/// Token annotation carried by an accepting state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AcceptInfo {
    pub token: TokenType,
    pub priority: i32,
    pub ignore: bool,
}

/// A lexical rule compiled into the shared NFA arena.
#[derive(Debug, Copy, Clone)]
pub struct CompiledRule {
    pub fragment: Fragment,
    pub token: TokenType,
    pub priority: i32,
    pub ignore: bool,
}

/// A deterministic state: a transition map plus an optional token
/// annotation. The same type serves annotated (lexer) and plain DFAs;
/// plain states simply carry no annotation.
#[derive(Debug)]
pub struct DfaState {
    transitions: Map<char, DfaStateID>,
    accept: Option<AcceptInfo>,
}

impl DfaState {
    pub fn transition(&self, symbol: char) -> Option<DfaStateID> {
        self.transitions.get(&symbol).copied()
    }

    pub fn transitions(&self) -> impl Iterator<Item = (char, DfaStateID)> + '_ {
        self.transitions.iter().map(|(&c, &t)| (c, t))
    }

    pub fn accept(&self) -> Option<AcceptInfo> {
        self.accept
    }

    pub fn is_accepting(&self) -> bool {
        self.accept.is_some()
    }
}

/// A DFA over `char` labels. State 0 is the start state; every transition
/// target lies within the state vector.
#[derive(Debug)]
pub struct Dfa {
    states: Vec<DfaState>,
}

impl Dfa {
    /// Combine every compiled rule into one DFA by subset construction.
    ///
    /// The virtual start set is the ε-closure of all rule start states.
    /// An accepting subset is annotated with the winning rule: numerically
    /// smallest priority first, earliest rule index on ties.
    pub fn from_rules(nfa: &Nfa, rules: &[CompiledRule]) -> Self {
        let alphabet: Vec<char> = nfa.alphabet().collect();

        let mut states: Vec<DfaState> = Vec::new();
        let mut subsets: Vec<Vec<NfaStateID>> = Vec::new();
        let mut index: Map<Vec<NfaStateID>, DfaStateID> = Map::default();
        let mut worklist: VecDeque<DfaStateID> = VecDeque::new();

        let start = nfa.epsilon_closure(rules.iter().map(|rule| rule.fragment.start));
        states.push(DfaState {
            transitions: Map::default(),
            accept: annotate(nfa, rules, &start),
        });
        index.insert(start.clone(), DfaStateID::START);
        subsets.push(start);
        worklist.push_back(DfaStateID::START);

        while let Some(id) = worklist.pop_front() {
            for &symbol in &alphabet {
                let moved = nfa.moves(&subsets[id.index()], symbol);
                if moved.is_empty() {
                    continue;
                }
                let subset = nfa.epsilon_closure(moved);

                let target = match index.get(&subset) {
                    Some(&target) => target,
                    None => {
                        let target = DfaStateID::new(states.len() as u32);
                        states.push(DfaState {
                            transitions: Map::default(),
                            accept: annotate(nfa, rules, &subset),
                        });
                        index.insert(subset.clone(), target);
                        subsets.push(subset);
                        worklist.push_back(target);
                        target
                    }
                };
                states[id.index()].transitions.insert(symbol, target);
            }
        }

        Self { states }
    }

    pub fn start(&self) -> DfaStateID {
        DfaStateID::START
    }

    pub fn state(&self, id: DfaStateID) -> &DfaState {
        &self.states[id.index()]
    }

    pub fn states(&self) -> impl Iterator<Item = (DfaStateID, &DfaState)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (DfaStateID::new(i as u32), state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Run the whole input through the automaton and report acceptance.
    pub fn accepts(&self, input: &str) -> bool {
        let mut state = self.start();
        for c in input.chars() {
            match self.state(state).transition(c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.state(state).is_accepting()
    }

    /// Merge equivalent states via the table-filling algorithm.
    ///
    /// Two states start out distinguishable when their annotations name
    /// different token types (or only one accepts); the marking then
    /// propagates backwards over transitions until fixpoint. Union-find
    /// collapses the unmarked pairs into partitions.
    pub fn minimize(&self) -> Self {
        let n = self.states.len();
        if n == 0 {
            return Self { states: Vec::new() };
        }

        // Canonical pair order (i, j) with i < j.
        let pair = |i: usize, j: usize| -> usize {
            debug_assert!(i < j);
            j * (j - 1) / 2 + i
        };

        let mut distinguishable = BitSet::with_capacity(n * n.saturating_sub(1) / 2);
        for j in 1..n {
            for i in 0..j {
                let left = self.states[i].accept.map(|a| a.token);
                let right = self.states[j].accept.map(|a| a.token);
                if left != right {
                    distinguishable.insert(pair(i, j));
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for j in 1..n {
                for i in 0..j {
                    if distinguishable.contains(pair(i, j)) {
                        continue;
                    }
                    if self.any_distinguishing_symbol(i, j, &distinguishable, pair) {
                        distinguishable.insert(pair(i, j));
                        changed = true;
                    }
                }
            }
        }

        let mut partition = UnionFind::new(n);
        for j in 1..n {
            for i in 0..j {
                if !distinguishable.contains(pair(i, j)) {
                    partition.union(i, j);
                }
            }
        }

        // Number the merged states by first appearance, so the partition
        // containing the old start state becomes the new start state.
        let mut merged_of: Map<usize, DfaStateID> = Map::default();
        let mut representatives: Vec<usize> = Vec::new();
        for i in 0..n {
            let root = partition.find(i);
            merged_of.entry(root).or_insert_with(|| {
                representatives.push(i);
                DfaStateID::new(representatives.len() as u32 - 1)
            });
        }

        let states = representatives
            .iter()
            .map(|&representative| {
                let old = &self.states[representative];
                let transitions = old
                    .transitions
                    .iter()
                    .map(|(&symbol, &target)| {
                        (symbol, merged_of[&partition.find(target.index())])
                    })
                    .collect();
                DfaState {
                    transitions,
                    accept: old.accept,
                }
            })
            .collect();

        Self { states }
    }

    fn any_distinguishing_symbol(
        &self,
        i: usize,
        j: usize,
        distinguishable: &BitSet,
        pair: impl Fn(usize, usize) -> usize,
    ) -> bool {
        let left = &self.states[i];
        let right = &self.states[j];

        let symbols = left
            .transitions
            .keys()
            .chain(right.transitions.keys().filter(|s| !left.transitions.contains_key(*s)));

        for &symbol in symbols {
            match (left.transition(symbol), right.transition(symbol)) {
                (Some(a), Some(b)) => {
                    if a == b {
                        continue;
                    }
                    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                    if distinguishable.contains(pair(lo.index(), hi.index())) {
                        return true;
                    }
                }
                // Exactly one side moves: the pair is distinguishable.
                _ => return true,
            }
        }
        false
    }
}

fn annotate(nfa: &Nfa, rules: &[CompiledRule], subset: &[NfaStateID]) -> Option<AcceptInfo> {
    let mut best: Option<usize> = None;
    for &id in subset {
        let Some(rule) = nfa.state(id).accept() else {
            continue;
        };
        let better = match best {
            None => true,
            Some(current) => {
                rules[rule].priority < rules[current].priority
                    || (rules[rule].priority == rules[current].priority && rule < current)
            }
        };
        if better {
            best = Some(rule);
        }
    }
    best.map(|rule| AcceptInfo {
        token: rules[rule].token,
        priority: rules[rule].priority,
        ignore: rules[rule].ignore,
    })
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // Path halving.
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}
