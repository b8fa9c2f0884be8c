// Bidirectional symbol/id mapping.

use hashbrown::HashMap;

use crate::symbol::{Reserved, Symbol};
use crate::BuildError;

/// Bidirectional mapping between symbols and dense ids.
///
/// Every table starts with the eight reserved symbols at their fixed ids
/// (`<eps>` = 0, `<alpha>` = 1, .. `<phi>` = 7); further symbols get ids in
/// insertion order.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    ids: HashMap<Symbol, u32>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        let mut symbols = vec![Symbol::Epsilon];
        symbols.extend(Reserved::ALL.iter().map(|&r| Symbol::Reserved(r)));

        let ids = symbols
            .iter()
            .enumerate()
            .map(|(id, sym)| (sym.clone(), id as u32))
            .collect();

        SymbolTable { ids, symbols }
    }

    /// Return the id of `symbol`, inserting it first if it is new.
    pub fn insert_or_find(&mut self, symbol: &Symbol) -> u32 {
        if let Some(&id) = self.ids.get(symbol) {
            return id;
        }
        let id = self.symbols.len() as u32;
        self.ids.insert(symbol.clone(), id);
        self.symbols.push(symbol.clone());
        id
    }

    /// Return the id of `symbol`, or a `KeyError` if it was never inserted.
    pub fn find(&self, symbol: &Symbol) -> Result<u32, BuildError> {
        self.ids
            .get(symbol)
            .copied()
            .ok_or_else(|| BuildError::KeyError(symbol.to_string()))
    }

    /// Return the symbol with the given id.
    pub fn get(&self, id: u32) -> Result<&Symbol, BuildError> {
        self.symbols
            .get(id as usize)
            .ok_or_else(|| BuildError::KeyError(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate symbols in id (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
