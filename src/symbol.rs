use std::ops::Range;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use miette::SourceSpan;

// Symbol table of LABEL -> address, in definition order
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Used to refer to offsets from the start of a source file.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct SrcOffset(pub usize);

/// Location within source
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Span {
    offs: SrcOffset,
    len: usize,
}

impl Span {
    pub fn new(offs: SrcOffset, len: usize) -> Self {
        Span { offs, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn offs(&self) -> usize {
        self.offs.0
    }

    pub fn end(&self) -> usize {
        self.offs.0 + self.len
    }

    /// Span covering both `self` and `other`.
    pub fn join(&self, other: Span) -> Span {
        let start = self.offs().min(other.offs());
        let end = self.end().max(other.end());
        Span::new(SrcOffset(start), end - start)
    }
}

impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.offs().into(), value.len())
    }
}

impl From<Span> for Range<usize> {
    fn from(value: Span) -> Self {
        value.offs()..value.end()
    }
}

/// A resolved label.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Symbol {
    pub addr: u16,
    /// Where the label was defined
    pub span: Span,
}

/// Label table built during the first pass and read during the second.
/// Names are case-insensitive.
#[derive(Default, Debug)]
pub struct SymbolTable {
    table: FxMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            table: IndexMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Define a label. Fails with the earlier definition if the name is taken.
    pub fn insert(&mut self, name: &str, addr: u16, span: Span) -> Result<(), Symbol> {
        let key = name.to_ascii_uppercase();
        if let Some(prev) = self.table.get(&key) {
            return Err(*prev);
        }
        self.table.insert(key, Symbol { addr, span });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.table
            .get(&name.to_ascii_uppercase())
            .map(|sym| sym.addr)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Labels in definition order, with their normalized names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.table.iter().map(|(name, sym)| (name.as_str(), sym))
    }
}
