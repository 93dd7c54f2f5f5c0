//! Grammar types and the line-oriented grammar text format.

use crate::types::Map;
use crate::util::display_fn;
use std::fmt;

/// Interned handle for a grammar symbol.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolID {
    raw: u32,
}

impl SymbolID {
    /// Reserved terminal denoting the empty string.
    pub const EPSILON: Self = Self::new(0);
    /// Reserved terminal marking the end of input.
    pub const EOI: Self = Self::new(1);
    /// Reserved nonterminal `S'` introduced by grammar augmentation.
    pub(crate) const AUGMENTED: Self = Self::new(u32::MAX);

    const OFFSET: u32 = 2;

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }
}

impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EPSILON => f.write_str("S#eps"),
            Self::EOI => f.write_str("S#eoi"),
            Self::AUGMENTED => f.write_str("S#aug"),
            Self { raw } => write!(f, "S#{:03}", raw),
        }
    }
}

/// Whether a symbol stands for itself in the input or derives further.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

/// A named grammar symbol. Two symbols with the same (name, kind) intern
/// to the same [`SymbolID`].
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal)
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Nonterminal)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u32,
}

impl ProductionID {
    /// Reserved ID for the augmented production `S' -> S`.
    pub(crate) const AUGMENTED: Self = Self::new(u32::MAX);

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }
}

impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::AUGMENTED => f.write_str("P#aug"),
            Self { raw } => write!(f, "P#{:03}", raw),
        }
    }
}

/// A production rule `A -> X1 X2 ... Xk`. The right-hand side `[ε]`
/// encodes the ε-production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    left: SymbolID,
    right: Vec<SymbolID>,
}

impl Production {
    pub(crate) fn new(left: SymbolID, right: Vec<SymbolID>) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> SymbolID {
        self.left
    }

    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// True exactly when the right-hand side is the single symbol `ε`.
    pub fn is_epsilon(&self) -> bool {
        matches!(self.right[..], [SymbolID::EPSILON])
    }

    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} ->", grammar.symbol(self.left).name())?;
            for &symbol in &self.right {
                write!(f, " {}", grammar.symbol(symbol).name())?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("malformed production line: {line:?}")]
    MalformedLine { line: String },

    #[error("symbol {name:?} is used both as a terminal and a nonterminal")]
    KindConflict { name: String },

    #[error("grammar has no productions")]
    Empty,
}

/// An immutable context-free grammar.
///
/// Owns the interned symbol table and the production list. Read-only once
/// constructed; every downstream computation borrows it.
#[derive(Debug)]
pub struct Grammar {
    symbols: Map<SymbolID, Symbol>,
    by_name: Map<String, SymbolID>,
    productions: Map<ProductionID, Production>,
    start: SymbolID,
}

impl Grammar {
    /// Define a grammar programmatically using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef::new();
        f(&mut def)?;
        def.end()
    }

    /// Parse the newline-separated `LHS -> RHS1 | RHS2 | ...` text format.
    ///
    /// The first left-hand side becomes the start symbol. Symbols are
    /// classified as terminal or nonterminal on first observation; `ε` and
    /// the empty alternative both denote the ε-production.
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        Self::define(|def| {
            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let parts: Vec<&str> = line.split("->").collect();
                let &[left, right] = parts.as_slice() else {
                    return Err(GrammarError::MalformedLine { line: line.to_owned() });
                };

                let left = def.nonterminal(left.trim())?;
                if def.start.is_none() {
                    def.start_symbol(left);
                }

                for alternative in right.split('|') {
                    let alternative = alternative.trim();
                    if alternative.is_empty() || alternative == "ε" {
                        def.production(left, vec![SymbolID::EPSILON])?;
                        continue;
                    }

                    let mut symbols = Vec::new();
                    for name in alternative.split_whitespace() {
                        let id = match classify(name) {
                            SymbolKind::Terminal => def.terminal(name)?,
                            SymbolKind::Nonterminal => def.nonterminal(name)?,
                        };
                        symbols.push(id);
                    }
                    def.production(left, symbols)?;
                }
            }
            Ok(())
        })
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolID, &Symbol)> + '_ {
        self.symbols.iter().map(|(id, symbol)| (*id, symbol))
    }

    pub fn terminals(&self) -> impl Iterator<Item = (SymbolID, &Symbol)> + '_ {
        self.symbols().filter(|(_, symbol)| symbol.is_terminal())
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = (SymbolID, &Symbol)> + '_ {
        self.symbols().filter(|(_, symbol)| symbol.is_nonterminal())
    }

    pub fn symbol(&self, id: SymbolID) -> &Symbol {
        &self.symbols[&id]
    }

    /// Look up an interned symbol by name.
    pub fn lookup(&self, name: &str) -> Option<SymbolID> {
        self.by_name.get(name).copied()
    }

    pub fn productions(&self) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions.iter().map(|(id, production)| (*id, production))
    }

    /// Productions whose left-hand side is `left`.
    pub fn productions_for(
        &self,
        left: SymbolID,
    ) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions().filter(move |(_, p)| p.left() == left)
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn start_symbol(&self) -> SymbolID {
        self.start
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "terminals:")?;
        for (_, symbol) in self.terminals() {
            write!(f, " {}", symbol.name())?;
        }
        write!(f, "\nnonterminals:")?;
        for (_, symbol) in self.nonterminals() {
            write!(f, " {}", symbol.name())?;
        }
        writeln!(f, "\nstart symbol: {}", self.symbol(self.start).name())?;
        writeln!(f, "productions:")?;
        for (_, production) in self.productions() {
            writeln!(f, "  {}", production.display(self))?;
        }
        Ok(())
    }
}

/// The contextual values for building a [`Grammar`].
#[derive(Debug)]
pub struct GrammarDef {
    symbols: Map<SymbolID, Symbol>,
    by_name: Map<String, SymbolID>,
    productions: Map<ProductionID, Production>,
    start: Option<SymbolID>,
    next_symbol: u32,
    next_production: u32,
}

impl GrammarDef {
    fn new() -> Self {
        let mut def = Self {
            symbols: Map::default(),
            by_name: Map::default(),
            productions: Map::default(),
            start: None,
            next_symbol: SymbolID::OFFSET,
            next_production: 0,
        };
        def.seed(SymbolID::EPSILON, "ε");
        def.seed(SymbolID::EOI, "$");
        def
    }

    fn seed(&mut self, id: SymbolID, name: &str) {
        self.symbols.insert(
            id,
            Symbol {
                name: name.to_owned(),
                kind: SymbolKind::Terminal,
            },
        );
        self.by_name.insert(name.to_owned(), id);
    }

    fn intern(&mut self, name: &str, kind: SymbolKind) -> Result<SymbolID, GrammarError> {
        if let Some(&id) = self.by_name.get(name) {
            if self.symbols[&id].kind != kind {
                return Err(GrammarError::KindConflict { name: name.to_owned() });
            }
            return Ok(id);
        }

        let id = SymbolID::new(self.next_symbol);
        self.next_symbol += 1;
        self.symbols.insert(
            id,
            Symbol {
                name: name.to_owned(),
                kind,
            },
        );
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Intern a terminal symbol.
    pub fn terminal(&mut self, name: &str) -> Result<SymbolID, GrammarError> {
        self.intern(name, SymbolKind::Terminal)
    }

    /// Intern a nonterminal symbol.
    pub fn nonterminal(&mut self, name: &str) -> Result<SymbolID, GrammarError> {
        self.intern(name, SymbolKind::Nonterminal)
    }

    /// Add a production rule. The left-hand side must be a nonterminal.
    pub fn production(
        &mut self,
        left: SymbolID,
        right: Vec<SymbolID>,
    ) -> Result<ProductionID, GrammarError> {
        let lhs = &self.symbols[&left];
        if !lhs.is_nonterminal() {
            return Err(GrammarError::KindConflict {
                name: lhs.name().to_owned(),
            });
        }

        let id = ProductionID::new(self.next_production);
        self.next_production += 1;
        self.productions.insert(id, Production::new(left, right));
        Ok(id)
    }

    /// Specify the start symbol. Defaults to the first production's LHS.
    pub fn start_symbol(&mut self, symbol: SymbolID) {
        self.start.replace(symbol);
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        let start = match self.start {
            Some(start) => start,
            None => self
                .productions
                .first()
                .map(|(_, p)| p.left())
                .ok_or(GrammarError::Empty)?,
        };

        Ok(Grammar {
            symbols: self.symbols,
            by_name: self.by_name,
            productions: self.productions,
            start,
        })
    }
}

const PUNCTUATION: &str = "(){}[];,+-*/<>=!&|";

const KEYWORDS: &[&str] = &[
    "if", "while", "int", "float", "bool", "print", "else", "id", "num",
];

/// Classify a symbol name on first observation.
fn classify(name: &str) -> SymbolKind {
    if name == "ε" || name == "$" {
        return SymbolKind::Terminal;
    }
    if name.ends_with('\'') {
        return SymbolKind::Nonterminal;
    }

    let mut chars = name.chars();
    let first = chars.next().expect("symbol names are nonempty");
    if chars.next().is_none() {
        // Single character: terminal unless an uppercase letter outside the
        // punctuation set.
        if first.is_uppercase() && !PUNCTUATION.contains(first) {
            return SymbolKind::Nonterminal;
        }
        return SymbolKind::Terminal;
    }

    let lower = name.to_lowercase();
    if KEYWORDS.contains(&lower.as_str()) || name.contains(['=', '<', '>']) {
        return SymbolKind::Terminal;
    }
    SymbolKind::Nonterminal
}
