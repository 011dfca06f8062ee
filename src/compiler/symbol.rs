use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub index: usize,
}

/// Maps names to global slots. Every definition takes a fresh slot, so
/// rebinding a name shadows the old slot instead of reusing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    store: HashMap<String, Symbol>,
    pub num_definitions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            index: self.num_definitions,
        };
        self.store.insert(name.to_owned(), symbol);
        self.num_definitions += 1;
        symbol
    }

    pub fn resolve(&self, name: &str) -> Option<Symbol> {
        self.store.get(name).copied()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_define() {
        let mut global = SymbolTable::new();

        assert_eq!(global.define("a"), Symbol { index: 0 });
        assert_eq!(global.define("b"), Symbol { index: 1 });
        assert_eq!(global.num_definitions, 2);
    }

    #[test]
    fn test_resolve() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");

        assert_eq!(global.resolve("a"), Some(Symbol { index: 0 }));
        assert_eq!(global.resolve("b"), Some(Symbol { index: 1 }));
        assert_eq!(global.resolve("c"), None);
    }

    #[test]
    fn test_redefinition_takes_fresh_slot() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");
        let shadow = global.define("a");

        assert_eq!(shadow, Symbol { index: 2 });
        assert_eq!(global.resolve("a"), Some(shadow));
        assert_eq!(global.num_definitions, 3);
    }
}
