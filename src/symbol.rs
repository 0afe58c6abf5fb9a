use std::{collections::HashMap, fmt, rc::Rc};

/// A handle to an interned identifier spelling. Two symbols compare equal
/// iff they were interned from equal spellings in the same [`SymbolTable`].
/// To retrieve the spelling, use [`SymbolTable::resolve`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Interns identifier spellings into stable numeric handles.
///
/// Handles are dense, starting at 0, and are never removed; a spelling is
/// immutable once interned.
#[derive(Default, Debug)]
pub struct SymbolTable {
    map: HashMap<Rc<str>, u32>,
    vec: Vec<Rc<str>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> SymbolTable {
        SymbolTable {
            map: HashMap::with_capacity(capacity),
            vec: Vec::with_capacity(capacity),
        }
    }

    /// Interns the provided spelling, returning the existing handle if it
    /// is already known. This is the only mutator.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&handle) = self.map.get(name) {
            return Symbol(handle);
        }
        let key: Rc<str> = name.into();
        let handle: u32 = self.vec.len().try_into().expect("symbol table overflow");
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, handle);
        Symbol(handle)
    }

    /// Returns the handle for a spelling if it has been interned.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.map.get(name).copied().map(Symbol)
    }

    /// Returns the spelling for a handle. Panics if the handle does not
    /// belong to this table.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.vec[symbol.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }
}
