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

//! A single-pass, syntax-directed translator for the `toil` mini-language.
//! Scanning, scope-correct name resolution and stack-machine code emission
//! all happen in one synchronous descent over the source text; there is no
//! syntax tree and no backpatching, so the instruction stream is append
//! only and complete the moment the last token is consumed.
//!
//! [`translate`] is the whole public entry point: source in, [`Program`]
//! out, first violated rule reported as a [`TranslateError`].

mod codegen;
mod errors;
mod labels;
mod opcode;
mod scanner;
mod symtab;

mod codegen_tests;

pub mod testing;

pub use crate::codegen::{Program, TranslateOptions, translate};
pub use crate::errors::TranslateError;
pub use crate::labels::{LABELS_MAX, Label, Labels};
pub use crate::opcode::{Instr, Slot};
pub use crate::scanner::{DIGIT_MAX, IDENT_LEN_MAX, Keyword, Scanner, Token};
pub use crate::symtab::{
    ClassFilter, Payload, SYMBOLS_MAX, SymbolClass, SymbolEntry, SymbolTable,
};
