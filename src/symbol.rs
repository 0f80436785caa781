use std::collections::HashMap;

use crate::value::SymbolId;

/// Interned symbol table. Each unique name maps to a unique SymbolId, so
/// `eq` on symbols is an id comparison.
///
/// Keywords are flagged at intern time: the special-form names and any
/// name starting with `:`. A keyword can never be bound as a variable.
pub struct SymbolTable {
    name_to_id: HashMap<String, SymbolId>,
    id_to_name: Vec<String>,
    keyword: Vec<bool>,
}

/// Ids of the names `SymbolTable::new` interns first, in that order.
pub mod sym {
    use crate::value::SymbolId;

    pub const QUOTE: SymbolId = SymbolId(0);
    pub const PROGN: SymbolId = SymbolId(1);
    pub const COND: SymbolId = SymbolId(2);
    pub const SETQ: SymbolId = SymbolId(3);
    pub const LAMBDA: SymbolId = SymbolId(4);
    pub const MACRO: SymbolId = SymbolId(5);
    pub const CATCH: SymbolId = SymbolId(6);
    pub const UNWIND_PROTECT: SymbolId = SymbolId(7);
    pub const DELAY: SymbolId = SymbolId(8);
    // Ordinary symbols from here on.
    pub const REST: SymbolId = SymbolId(9);
    pub const T: SymbolId = SymbolId(10);
    pub const ERROR: SymbolId = SymbolId(11);
    pub const VERSION: SymbolId = SymbolId(12);
    pub const EOF: SymbolId = SymbolId(13);
    pub const LIST: SymbolId = SymbolId(14);
    pub const CONS: SymbolId = SymbolId(15);
    pub const APPEND: SymbolId = SymbolId(16);
}

/// Number of leading entries in the table that are special-form keywords.
const SPECIAL_FORMS: usize = 9;

/// Prefix marking a macro-local dummy variable.
pub const DUMMY_PREFIX: char = '$';

impl SymbolTable {
    /// A table holding the `sym` names and nothing else. The first
    /// `SPECIAL_FORMS` of them are keywords.
    pub fn new() -> Self {
        let names = [
            "quote", "progn", "cond", "setq", "lambda", "macro", "catch", "unwind-protect",
            "delay", "&rest", "t", "*error*", "*version*", "*eof*", "list", "cons", "append",
        ];

        let mut table = SymbolTable {
            name_to_id: HashMap::new(),
            id_to_name: Vec::new(),
            keyword: Vec::new(),
        };
        for (i, name) in names.iter().enumerate() {
            let id = table.push(name);
            if i < SPECIAL_FORMS {
                table.keyword[id.0 as usize] = true;
            }
        }
        table
    }

    fn push(&mut self, name: &str) -> SymbolId {
        let id = SymbolId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        self.keyword.push(name.len() > 1 && name.starts_with(':'));
        id
    }

    /// The id for `name`, allocating one on first sight.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        match self.name_to_id.get(name) {
            Some(&id) => id,
            None => self.push(name),
        }
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.id_to_name[id.0 as usize]
    }

    /// The id for `name` if it was ever interned.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.name_to_id.get(name).copied()
    }

    pub fn is_keyword(&self, id: SymbolId) -> bool {
        self.keyword[id.0 as usize]
    }

    pub fn is_dummy_name(&self, id: SymbolId) -> bool {
        self.name(id).starts_with(DUMMY_PREFIX)
    }

    pub fn count(&self) -> usize {
        self.id_to_name.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
