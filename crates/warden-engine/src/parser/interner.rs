//! Names and literal text of one script, stored once.
//!
//! Every identifier, string and template chunk the lexer produces is kept
//! in a single text buffer and referred to by [`Symbol`]. The transformer
//! relies on [`Interner::get`] to ask whether a name occurs anywhere in a
//! script without walking it again.

use rustc_hash::FxHashMap;
use std::ops::Range;

/// Handle to interned text. Only meaningful with the interner that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct Interner {
    text: String,
    ranges: Vec<Range<usize>>,
    lookup: FxHashMap<Box<str>, Symbol>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` is a hint for the number of distinct names.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity * 8),
            ranges: Vec::with_capacity(capacity),
            lookup: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.lookup.get(s) {
            return sym;
        }
        let sym = Symbol(self.ranges.len() as u32);
        let start = self.text.len();
        self.text.push_str(s);
        self.ranges.push(start..self.text.len());
        self.lookup.insert(s.into(), sym);
        sym
    }

    /// The symbol of `s`, if the script contains it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.lookup.get(s).copied()
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        match self.ranges.get(sym.index()) {
            Some(range) => &self.text[range.clone()],
            None => "",
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
