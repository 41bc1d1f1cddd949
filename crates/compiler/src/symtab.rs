// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use crate::errors::TranslateError;
use crate::labels::Label;
use crate::opcode::Slot;
use std::fmt;
use strum::Display;
use tracing::{debug, warn};

/// Default capacity of the symbol arena.
pub const SYMBOLS_MAX: usize = 1000;

/// What kind of entity a resolved name denotes.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolClass {
    Constant,
    Variable,
    Procedure,
}

/// Resolution filter. `Any` admits every class; diagnostics render it as
/// plain "name" so an unresolved wildcard lookup reads "unresolved name"
/// while a filtered one names the class it wanted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassFilter {
    Any,
    Of(SymbolClass),
}

impl ClassFilter {
    pub fn admits(&self, class: SymbolClass) -> bool {
        match self {
            ClassFilter::Any => true,
            ClassFilter::Of(wanted) => *wanted == class,
        }
    }
}

impl fmt::Display for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassFilter::Any => f.write_str("name"),
            ClassFilter::Of(class) => write!(f, "{class}"),
        }
    }
}

/// Class-specific payload. The variant fixes the entry's class, so the two
/// can never disagree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Payload {
    /// The literal value the constant stands for.
    Constant(i64),
    /// The storage slot reserved for the variable.
    Variable(Slot),
    /// The label of the procedure's entry point.
    Procedure(Label),
}

impl Payload {
    pub fn class(&self) -> SymbolClass {
        match self {
            Payload::Constant(_) => SymbolClass::Constant,
            Payload::Variable(_) => SymbolClass::Variable,
            Payload::Procedure(_) => SymbolClass::Procedure,
        }
    }
}

/// One declaration. Entries are history, not state: they are appended on
/// intern and never removed, only hidden from resolution once their scope
/// is left.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SymbolEntry {
    pub name: String,
    /// Nesting depth of the declaring scope.
    pub level: u32,
    pub payload: Payload,
    visible: bool,
}

impl SymbolEntry {
    pub fn class(&self) -> SymbolClass {
        self.payload.class()
    }
}

/// Scope-chained registry of declared names. Scopes own no collection of
/// their own; membership is the level stamped on each entry at intern time,
/// and leaving a scope bulk-hides the entries stamped with it.
#[derive(Debug)]
pub struct SymbolTable {
    /// Declaration history, oldest first. Resolution walks it backwards so
    /// the most recent visible declaration wins.
    entries: Vec<SymbolEntry>,
    level: u32,
    limit: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_limit(SYMBOLS_MAX)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: vec![],
            level: 0,
            limit,
        }
    }

    pub fn enter_scope(&mut self) {
        self.level += 1;
    }

    /// Leave the current scope, hiding its entries for good: re-entering
    /// the same numeric level later must not resurrect a sibling scope's
    /// names. A no-op at level 0.
    pub fn leave_scope(&mut self) {
        if self.level == 0 {
            return;
        }
        for entry in &mut self.entries {
            if entry.level == self.level {
                entry.visible = false;
            }
        }
        self.level -= 1;
    }

    /// Declare a name at the current level. Shadowing an existing visible
    /// declaration (any class, same or outer level) is legal and warned
    /// about; the new entry wins every later resolution.
    pub fn intern(&mut self, name: &str, payload: Payload) -> Result<(), TranslateError> {
        if self.entries.len() >= self.limit {
            return Err(TranslateError::SymbolsExhausted);
        }
        if let Some(existing) = self.resolve(name, ClassFilter::Any) {
            warn!(
                "shadowing existing declaration '{}' ({})",
                existing.name,
                existing.class()
            );
        }
        self.entries.push(SymbolEntry {
            name: name.to_string(),
            level: self.level,
            payload,
            visible: true,
        });
        Ok(())
    }

    /// The most recently declared visible entry matching the name and
    /// filter, or `None`. Callers decide whether absence is fatal.
    pub fn resolve(&self, name: &str, filter: ClassFilter) -> Option<&SymbolEntry> {
        self.entries.iter().rev().find(|entry| {
            entry.visible
                && entry.level <= self.level
                && filter.admits(entry.class())
                && entry.name == name
        })
    }

    /// Write the declaration history to the debug log, most recent first.
    pub fn dump(&self) {
        debug!("name\tclass\tscope");
        debug!("----\t-----\t-----");
        for entry in self.entries.iter().rev() {
            debug!("{}\t{}\t{}", entry.name, entry.class(), entry.level);
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
