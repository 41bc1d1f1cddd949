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

use crate::labels::Label;
use std::fmt;

/// Storage index assigned to a variable at declaration time. Rendered as a
/// bare number in the listing.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Slot(pub u16);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of the emitted listing: an instruction, a label definition, or
/// a marker. `Display` renders exactly the line the target assembler sees.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Instr {
    /// Push a literal value.
    Push(i64),
    /// Push the contents of a variable slot.
    Load(Slot),
    /// Pop into a variable slot.
    Store(Slot),
    Dup,
    Pop,
    // Binary operators pop the right operand, then the left, and push the
    // result. Comparisons push 1 when the relation holds, else 0.
    Add,
    Sub,
    Mul,
    Div,
    CmpGt,
    CmpLt,
    CmpEq,
    Jmp(Label),
    /// Pop; jump when the value is zero.
    Jmpz(Label),
    /// Pop; jump when the value is non-zero.
    Jmpnz(Label),
    Call(Label),
    Ret,
    /// Reserve storage for a variable slot.
    Resv(Slot),
    /// Save the iteration counter for the surrounding loop.
    SaveC,
    /// Set the iteration counter.
    SetC(i64),
    /// Decrement the counter; jump back while it stays above zero.
    LoopC(Label),
    /// Restore the last saved iteration counter.
    RestC,
    /// Define a branch target: renders as `L{n}:`.
    DefLabel(Label),
    /// Start-of-execution marker separating declarations from the program
    /// body.
    Entry,
    Halt,
    /// End-of-program marker, always the final line.
    End,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Push(value) => write!(f, "PUSH {value}"),
            Instr::Load(slot) => write!(f, "LOAD {slot}"),
            Instr::Store(slot) => write!(f, "STORE {slot}"),
            Instr::Dup => f.write_str("DUP"),
            Instr::Pop => f.write_str("POP"),
            Instr::Add => f.write_str("ADD"),
            Instr::Sub => f.write_str("SUB"),
            Instr::Mul => f.write_str("MUL"),
            Instr::Div => f.write_str("DIV"),
            Instr::CmpGt => f.write_str("CMPGT"),
            Instr::CmpLt => f.write_str("CMPLT"),
            Instr::CmpEq => f.write_str("CMPEQ"),
            Instr::Jmp(label) => write!(f, "JMP {label}"),
            Instr::Jmpz(label) => write!(f, "JMPZ {label}"),
            Instr::Jmpnz(label) => write!(f, "JMPNZ {label}"),
            Instr::Call(label) => write!(f, "CALL {label}"),
            Instr::Ret => f.write_str("RET"),
            Instr::Resv(slot) => write!(f, "RESV {slot}"),
            Instr::SaveC => f.write_str("SAVEC"),
            Instr::SetC(value) => write!(f, "SETC {value}"),
            Instr::LoopC(label) => write!(f, "LOOPC {label}"),
            Instr::RestC => f.write_str("RESTC"),
            Instr::DefLabel(label) => write!(f, "{label}:"),
            Instr::Entry => f.write_str("ENTRY:"),
            Instr::Halt => f.write_str("HALT"),
            Instr::End => f.write_str("END"),
        }
    }
}
