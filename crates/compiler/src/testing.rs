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

//! A reference machine for the emitted instruction set. Tests run
//! translated programs through it to check runtime properties that the
//! listing alone can't show: what actually executed, and what the
//! variable slots hold at HALT.

use std::collections::BTreeMap;

use crate::codegen::Program;
use crate::labels::Label;
use crate::opcode::{Instr, Slot};

/// What a run did: every instruction executed, in order, and the final
/// contents of the variable slots.
#[derive(Debug)]
pub struct Execution {
    pub trace: Vec<Instr>,
    pub slots: BTreeMap<Slot, i64>,
}

impl Execution {
    /// Final value of a variable slot.
    pub fn slot(&self, slot: Slot) -> i64 {
        self.slots[&slot]
    }

    /// How many times one particular instruction was executed.
    pub fn count(&self, instr: Instr) -> usize {
        self.trace.iter().filter(|i| **i == instr).count()
    }
}

/// Run a translated program from its ENTRY marker to HALT.
///
/// Storage reservations are honored wherever they appear in the listing;
/// global `RESV` lines sit above the entry marker and never execute, so
/// they are collected in a pre-scan along with the label positions.
/// Panics on conditions the target machine would fault on: division by
/// zero, a jump to an undefined label, stack underflow, or running past
/// the end of the listing. That is acceptable in test support.
pub fn execute(program: &Program) -> Execution {
    let code = &program.code;

    let mut targets = BTreeMap::new();
    let mut entry = None;
    let mut slots = BTreeMap::new();
    for (position, instr) in code.iter().enumerate() {
        match instr {
            Instr::DefLabel(label) => {
                targets.insert(*label, position);
            }
            Instr::Entry => entry = Some(position),
            Instr::Resv(slot) => {
                slots.insert(*slot, 0);
            }
            _ => {}
        }
    }
    let Some(entry) = entry else {
        panic!("program has no ENTRY marker");
    };
    let target = |label: Label| -> usize {
        *targets
            .get(&label)
            .unwrap_or_else(|| panic!("jump to undefined label {label}"))
    };

    let mut trace = vec![];
    let mut stack: Vec<i64> = vec![];
    let mut returns: Vec<usize> = vec![];
    let mut counter: i64 = 0;
    let mut saved_counters: Vec<i64> = vec![];
    let mut pc = entry + 1;

    loop {
        let Some(&instr) = code.get(pc) else {
            panic!("ran past the end of the listing");
        };
        trace.push(instr);
        pc += 1;
        match instr {
            Instr::Push(value) => stack.push(value),
            Instr::Load(slot) => {
                let value = *slots
                    .get(&slot)
                    .unwrap_or_else(|| panic!("load from unreserved slot {slot}"));
                stack.push(value);
            }
            Instr::Store(slot) => {
                let value = pop(&mut stack);
                if slots.insert(slot, value).is_none() {
                    panic!("store to unreserved slot {slot}");
                }
            }
            Instr::Dup => {
                let value = *stack.last().expect("evaluation stack underflow");
                stack.push(value);
            }
            Instr::Pop => {
                pop(&mut stack);
            }
            Instr::Add => {
                let (left, right) = pop2(&mut stack);
                stack.push(left + right);
            }
            Instr::Sub => {
                let (left, right) = pop2(&mut stack);
                stack.push(left - right);
            }
            Instr::Mul => {
                let (left, right) = pop2(&mut stack);
                stack.push(left * right);
            }
            Instr::Div => {
                let (left, right) = pop2(&mut stack);
                if right == 0 {
                    panic!("division by zero");
                }
                stack.push(left / right);
            }
            Instr::CmpGt => {
                let (left, right) = pop2(&mut stack);
                stack.push(i64::from(left > right));
            }
            Instr::CmpLt => {
                let (left, right) = pop2(&mut stack);
                stack.push(i64::from(left < right));
            }
            Instr::CmpEq => {
                let (left, right) = pop2(&mut stack);
                stack.push(i64::from(left == right));
            }
            Instr::Jmp(label) => pc = target(label),
            Instr::Jmpz(label) => {
                if pop(&mut stack) == 0 {
                    pc = target(label);
                }
            }
            Instr::Jmpnz(label) => {
                if pop(&mut stack) != 0 {
                    pc = target(label);
                }
            }
            Instr::Call(label) => {
                returns.push(pc);
                pc = target(label);
            }
            Instr::Ret => pc = returns.pop().expect("return outside a call"),
            Instr::Resv(slot) => {
                slots.insert(slot, 0);
            }
            Instr::SaveC => saved_counters.push(counter),
            Instr::SetC(value) => counter = value,
            Instr::LoopC(label) => {
                counter -= 1;
                if counter > 0 {
                    pc = target(label);
                }
            }
            Instr::RestC => {
                counter = saved_counters.pop().expect("counter restore without a save");
            }
            Instr::DefLabel(_) | Instr::Entry => {}
            Instr::Halt => break,
            Instr::End => panic!("executed the END marker"),
        }
    }

    Execution { trace, slots }
}

fn pop(stack: &mut Vec<i64>) -> i64 {
    stack.pop().expect("evaluation stack underflow")
}

/// The right operand is on top of the stack.
fn pop2(stack: &mut Vec<i64>) -> (i64, i64) {
    let right = pop(stack);
    let left = pop(stack);
    (left, right)
}
