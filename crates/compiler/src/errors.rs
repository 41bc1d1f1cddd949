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

use crate::symtab::ClassFilter;
use thiserror::Error;

/// Fatal translation failures. Any of these aborts the whole run: grammar
/// methods propagate them with `?` and only the driver prints the message
/// (with a `fatal: ` prefix) and sets the process exit status. Recovered
/// lexical errors and shadow warnings are not errors; they are logged and
/// translation continues.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TranslateError {
    /// Expected-terminal mismatch anywhere in the grammar.
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    /// An identifier was used without a visible declaration of the required
    /// class. The filter distinguishes "unresolved variable" (assignment
    /// target), "unresolved procedure" (call), and plain "unresolved name"
    /// (value position).
    #[error("unresolved {class} '{name}'")]
    Unresolved { name: String, class: ClassFilter },

    /// A procedure name appeared where a value was required.
    #[error("procedure '{0}' used as a value")]
    ProcedureAsValue(String),

    #[error("exhausted label storage")]
    LabelsExhausted,

    #[error("exhausted symbol storage")]
    SymbolsExhausted,

    /// FOR requires the upper bound to strictly exceed the lower bound.
    #[error("FOR upper bound {hi} must exceed lower bound {lo}")]
    LoopBounds { lo: i64, hi: i64 },

    /// TIMES requires a count of at least 1.
    #[error("TIMES count must be at least 1, got {0}")]
    LoopCount(i64),
}
