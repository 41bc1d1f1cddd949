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

/// Takes the token stream and turns it into a list of instructions, in one
/// pass. Each grammar rule below is a method; a rule consumes its tokens
/// and emits its code in the same call, so every branch target is defined
/// by the time its last reference is emitted and nothing is ever patched
/// after the fact.
use std::fmt;

use itertools::Itertools;

use crate::errors::TranslateError;
use crate::labels::{LABELS_MAX, Label, Labels};
use crate::opcode::{Instr, Slot};
use crate::scanner::{Keyword, Scanner, Token};
use crate::symtab::{ClassFilter, Payload, SYMBOLS_MAX, SymbolClass, SymbolTable};

/// Capacity limits for one translation. The defaults match the fixed
/// storage of the target architecture; tests shrink them to reach the
/// exhaustion paths.
#[derive(Clone, Debug)]
pub struct TranslateOptions {
    /// Label ids available before translation aborts with
    /// "exhausted label storage".
    pub max_labels: u16,
    /// Symbol entries available before translation aborts with
    /// "exhausted symbol storage".
    pub max_symbols: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            max_labels: LABELS_MAX,
            max_symbols: SYMBOLS_MAX,
        }
    }
}

/// Where an expression's result lives once its code has run: on top of the
/// evaluation stack. Every expression rule returns one, and every consumer
/// of a value takes one, so operand order is visible in the signatures
/// rather than implicit in emission order.
#[derive(Debug, Eq, PartialEq)]
#[must_use = "the translated value is live on the evaluation stack"]
struct StackValue;

/// The result of a translation: the program's declared name and its
/// instruction stream, in exactly the order the grammar rules emitted it.
/// `Display` renders the listing, one instruction per line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    pub name: String,
    pub code: Vec<Instr>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.code.iter().join("\n"))
    }
}

/// Translate a complete source program into its instruction listing.
/// One call owns one scanner, symbol table and label allocator; no state
/// survives it. The first violated rule aborts the whole translation.
pub fn translate(source: &str, options: TranslateOptions) -> Result<Program, TranslateError> {
    Translator::new(source, &options).program()
}

/// The translation session: one token of lookahead, the scoped symbol
/// table, the label allocator and the code emitted so far.
struct Translator<'a> {
    scanner: Scanner<'a>,
    symbols: SymbolTable,
    labels: Labels,
    code: Vec<Instr>,
    next_slot: u16,
}

impl<'a> Translator<'a> {
    fn new(source: &'a str, options: &TranslateOptions) -> Self {
        Self {
            scanner: Scanner::new(source),
            symbols: SymbolTable::with_limit(options.max_symbols),
            labels: Labels::with_limit(options.max_labels),
            code: vec![],
            next_slot: 0,
        }
    }

    // Emission helpers. The StackValue plumbing tracks the net stack
    // effect of each instruction: push, pop, or binary (pop two, push
    // one, right operand on top).

    fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
    }

    fn emit_push(&mut self, instr: Instr) -> StackValue {
        self.emit(instr);
        StackValue
    }

    fn emit_pop(&mut self, instr: Instr, _top: StackValue) {
        self.emit(instr);
    }

    fn emit_binary(&mut self, instr: Instr, _left: StackValue, _right: StackValue) -> StackValue {
        self.emit(instr);
        StackValue
    }

    /// Join point of a short-circuit operator: exactly one of the two arms
    /// ran, and each arm left one value on the stack.
    fn merge(&self, _arm: StackValue, _other: StackValue) -> StackValue {
        StackValue
    }

    fn put_label(&mut self, label: Label) {
        self.emit(Instr::DefLabel(label));
    }

    /// Storage slots are numbered in a u16; running off its end is an
    /// exhaustion, not a wraparound.
    fn alloc_slot(&mut self) -> Result<Slot, TranslateError> {
        let slot = Slot(self.next_slot);
        self.next_slot = self
            .next_slot
            .checked_add(1)
            .ok_or(TranslateError::SymbolsExhausted)?;
        Ok(slot)
    }

    // Token helpers.

    fn unexpected(&self, expected: impl fmt::Display) -> TranslateError {
        TranslateError::Unexpected {
            expected: expected.to_string(),
            found: self.scanner.sym().to_string(),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), TranslateError> {
        if !self.scanner.sym().is_keyword(keyword) {
            return Err(self.unexpected(keyword));
        }
        self.scanner.advance();
        Ok(())
    }

    /// Consume the keyword if it is next; report whether it was.
    fn accept_keyword(&mut self, keyword: Keyword) -> bool {
        if self.scanner.sym().is_keyword(keyword) {
            self.scanner.advance();
            return true;
        }
        false
    }

    fn expect_special(&mut self, c: char) -> Result<(), TranslateError> {
        if !self.scanner.sym().is_special(c) {
            return Err(self.unexpected(format!("'{c}'")));
        }
        self.scanner.advance();
        Ok(())
    }

    fn expect_ident(&mut self) -> Result<String, TranslateError> {
        match self.scanner.sym() {
            Token::Ident(name) => {
                let name = name.clone();
                self.scanner.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_literal(&mut self) -> Result<i64, TranslateError> {
        match self.scanner.sym() {
            Token::Literal(value) => {
                let value = *value;
                self.scanner.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("literal")),
        }
    }

    // Resolution helpers for the two contexts that demand a single class.

    fn resolve_variable(&self, name: &str) -> Result<Slot, TranslateError> {
        let filter = ClassFilter::Of(SymbolClass::Variable);
        match self.symbols.resolve(name, filter).map(|entry| entry.payload) {
            Some(Payload::Variable(slot)) => Ok(slot),
            _ => Err(TranslateError::Unresolved {
                name: name.to_string(),
                class: filter,
            }),
        }
    }

    fn resolve_procedure(&self, name: &str) -> Result<Label, TranslateError> {
        let filter = ClassFilter::Of(SymbolClass::Procedure);
        match self.symbols.resolve(name, filter).map(|entry| entry.payload) {
            Some(Payload::Procedure(label)) => Ok(label),
            _ => Err(TranslateError::Unresolved {
                name: name.to_string(),
                class: filter,
            }),
        }
    }

    // Expression rules, lowest precedence first in the grammar but listed
    // here innermost first. All binary operators fold left to right.

    /// Factor = literal | name | "(" Expression ")". A name resolves with
    /// the wildcard filter so the innermost declaration wins regardless of
    /// class; what it turns out to be decides the emission.
    fn factor(&mut self) -> Result<StackValue, TranslateError> {
        match self.scanner.sym().clone() {
            Token::Literal(value) => {
                self.scanner.advance();
                Ok(self.emit_push(Instr::Push(value)))
            }
            Token::Ident(name) => {
                let resolved = self
                    .symbols
                    .resolve(&name, ClassFilter::Any)
                    .map(|entry| entry.payload);
                let Some(payload) = resolved else {
                    return Err(TranslateError::Unresolved {
                        name,
                        class: ClassFilter::Any,
                    });
                };
                self.scanner.advance();
                match payload {
                    Payload::Constant(value) => Ok(self.emit_push(Instr::Push(value))),
                    Payload::Variable(slot) => Ok(self.emit_push(Instr::Load(slot))),
                    Payload::Procedure(_) => Err(TranslateError::ProcedureAsValue(name)),
                }
            }
            Token::Special('(') => {
                self.scanner.advance();
                let value = self.expression()?;
                self.expect_special(')')?;
                Ok(value)
            }
            _ => Err(self.unexpected("factor")),
        }
    }

    /// Term = Factor {("*" | "/") Factor}.
    fn term(&mut self) -> Result<StackValue, TranslateError> {
        let mut value = self.factor()?;
        loop {
            let instr = match self.scanner.sym() {
                Token::Special('*') => Instr::Mul,
                Token::Special('/') => Instr::Div,
                _ => return Ok(value),
            };
            self.scanner.advance();
            let right = self.factor()?;
            value = self.emit_binary(instr, value, right);
        }
    }

    /// ArithExpr = Term {("+" | "-") Term}.
    fn arith_expression(&mut self) -> Result<StackValue, TranslateError> {
        let mut value = self.term()?;
        loop {
            let instr = match self.scanner.sym() {
                Token::Special('+') => Instr::Add,
                Token::Special('-') => Instr::Sub,
                _ => return Ok(value),
            };
            self.scanner.advance();
            let right = self.term()?;
            value = self.emit_binary(instr, value, right);
        }
    }

    /// Relation = ArithExpr [(">" | "<" | "=") ArithExpr]. At most one
    /// comparison; the compare-and-set leaves a real 0/1 on the stack.
    fn relation(&mut self) -> Result<StackValue, TranslateError> {
        let value = self.arith_expression()?;
        let instr = match self.scanner.sym() {
            Token::Special('>') => Instr::CmpGt,
            Token::Special('<') => Instr::CmpLt,
            Token::Special('=') => Instr::CmpEq,
            _ => return Ok(value),
        };
        self.scanner.advance();
        let right = self.arith_expression()?;
        Ok(self.emit_binary(instr, value, right))
    }

    /// Expression = Relation {("AND" | "OR") Relation}, with short-circuit
    /// control flow: the right operand's code is jumped over whenever the
    /// left value already decides the result.
    fn expression(&mut self) -> Result<StackValue, TranslateError> {
        let mut value = self.relation()?;
        loop {
            if self.accept_keyword(Keyword::And) {
                // Left false: skip the right operand and force the result
                // to 0.
                let skip = self.labels.next_label()?;
                let join = self.labels.next_label()?;
                self.emit_pop(Instr::Jmpz(skip), value);
                let right = self.relation()?;
                self.emit(Instr::Jmp(join));
                self.put_label(skip);
                let forced = self.emit_push(Instr::Push(0));
                self.put_label(join);
                value = self.merge(right, forced);
            } else if self.accept_keyword(Keyword::Or) {
                // Left true: keep it as the result and skip the right
                // operand.
                let join = self.labels.next_label()?;
                let probe = self.emit_push(Instr::Dup);
                self.emit_pop(Instr::Jmpnz(join), probe);
                // Fall through: the left value is 0; drop it and let the
                // right operand supply the result.
                self.emit(Instr::Pop);
                let right = self.relation()?;
                self.put_label(join);
                value = self.merge(value, right);
            } else {
                return Ok(value);
            }
        }
    }

    // Statement rules. Each consumes its own leading keyword and its own
    // terminator.

    fn starts_statement(&self) -> bool {
        matches!(
            self.scanner.sym(),
            Token::Ident(_)
                | Token::Keyword(Keyword::If)
                | Token::Keyword(Keyword::While)
                | Token::Keyword(Keyword::Repeat)
                | Token::Keyword(Keyword::For)
                | Token::Keyword(Keyword::Times)
        )
    }

    /// Block = {Statement}. Ends at the first token that cannot start a
    /// statement; the caller matches its own terminator there, so a wrong
    /// terminator surfaces as that caller's expected-terminal mismatch.
    fn block(&mut self) -> Result<(), TranslateError> {
        while self.starts_statement() {
            self.statement()?;
        }
        Ok(())
    }

    /// A leading identifier is either an assignment (`name := Expression`)
    /// or a bare procedure call; the token after the name decides, and the
    /// name is resolved under the class that context demands.
    fn statement(&mut self) -> Result<(), TranslateError> {
        match self.scanner.sym().clone() {
            Token::Ident(name) => {
                self.scanner.advance();
                if self.scanner.sym() == &Token::Assign {
                    self.scanner.advance();
                    let slot = self.resolve_variable(&name)?;
                    let value = self.expression()?;
                    self.emit_pop(Instr::Store(slot), value);
                } else {
                    let label = self.resolve_procedure(&name)?;
                    self.emit(Instr::Call(label));
                }
                Ok(())
            }
            Token::Keyword(Keyword::If) => self.if_statement(),
            Token::Keyword(Keyword::While) => self.while_statement(),
            Token::Keyword(Keyword::Repeat) => self.repeat_statement(),
            Token::Keyword(Keyword::For) => self.for_statement(),
            Token::Keyword(Keyword::Times) => self.times_statement(),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// IfStatement = "IF" Expression "THEN" Block "ELSE" Block "ENDIF".
    /// Both arms are required; an arm may still be an empty block. Both
    /// labels are allocated before the condition is translated, so the
    /// listing numbers them ahead of any label the condition needs.
    fn if_statement(&mut self) -> Result<(), TranslateError> {
        self.expect_keyword(Keyword::If)?;
        let otherwise = self.labels.next_label()?;
        let join = self.labels.next_label()?;

        let cond = self.expression()?;
        self.expect_keyword(Keyword::Then)?;
        self.emit_pop(Instr::Jmpz(otherwise), cond);

        self.block()?;
        self.emit(Instr::Jmp(join));

        self.put_label(otherwise);
        self.expect_keyword(Keyword::Else)?;
        self.block()?;
        self.put_label(join);
        self.expect_keyword(Keyword::Endif)
    }

    /// WhileStatement = "WHILE" Expression Block "ENDWHILE". The condition
    /// is re-translated nowhere: the loop jumps back above it.
    fn while_statement(&mut self) -> Result<(), TranslateError> {
        self.expect_keyword(Keyword::While)?;
        let top = self.labels.next_label()?;
        let exit = self.labels.next_label()?;

        self.put_label(top);
        let cond = self.expression()?;
        self.emit_pop(Instr::Jmpz(exit), cond);

        self.block()?;
        self.expect_keyword(Keyword::Endwhile)?;
        self.emit(Instr::Jmp(top));
        self.put_label(exit);
        Ok(())
    }

    /// RepeatStatement = "REPEAT" Block "UNTIL" Expression. The body runs
    /// before the first test, so it always runs at least once.
    fn repeat_statement(&mut self) -> Result<(), TranslateError> {
        self.expect_keyword(Keyword::Repeat)?;
        let top = self.labels.next_label()?;

        self.put_label(top);
        self.block()?;
        self.expect_keyword(Keyword::Until)?;
        let cond = self.expression()?;
        self.emit_pop(Instr::Jmpz(top), cond);
        Ok(())
    }

    /// ForStatement = "FOR" name "FROM" literal "TO" literal Block
    /// "ENDFOR". The loop variable is declared in a scope of its own,
    /// initialized to the lower bound, and never updated; iteration count
    /// is carried by the counter register, upper minus lower times.
    fn for_statement(&mut self) -> Result<(), TranslateError> {
        self.expect_keyword(Keyword::For)?;
        let name = self.expect_ident()?;
        self.expect_keyword(Keyword::From)?;
        let lo = self.expect_literal()?;
        self.expect_keyword(Keyword::To)?;
        let hi = self.expect_literal()?;
        if hi <= lo {
            return Err(TranslateError::LoopBounds { lo, hi });
        }

        self.symbols.enter_scope();
        let slot = self.alloc_slot()?;
        self.symbols.intern(&name, Payload::Variable(slot))?;
        self.emit(Instr::Resv(slot));
        let init = self.emit_push(Instr::Push(lo));
        self.emit_pop(Instr::Store(slot), init);

        self.emit(Instr::SaveC);
        self.emit(Instr::SetC(hi - lo));
        let top = self.labels.next_label()?;
        self.put_label(top);

        self.block()?;
        self.expect_keyword(Keyword::Endfor)?;
        self.emit(Instr::LoopC(top));
        self.emit(Instr::RestC);
        self.symbols.leave_scope();
        Ok(())
    }

    /// TimesStatement = "TIMES" literal Block "ENDTIMES". A bare counted
    /// repetition; it declares nothing, so it opens no scope.
    fn times_statement(&mut self) -> Result<(), TranslateError> {
        self.expect_keyword(Keyword::Times)?;
        let count = self.expect_literal()?;
        if count < 1 {
            return Err(TranslateError::LoopCount(count));
        }

        self.emit(Instr::SaveC);
        self.emit(Instr::SetC(count));
        let top = self.labels.next_label()?;
        self.put_label(top);

        self.block()?;
        self.expect_keyword(Keyword::Endtimes)?;
        self.emit(Instr::LoopC(top));
        self.emit(Instr::RestC);
        Ok(())
    }

    // Declaration rules. All three kinds sit at the top of the program,
    // in fixed order: constants, then variables, then procedures.

    /// {ConstDecl} = {"CONST" name literal}. No code; the value is folded
    /// into every use site.
    fn const_decls(&mut self) -> Result<(), TranslateError> {
        while self.accept_keyword(Keyword::Const) {
            let name = self.expect_ident()?;
            let value = self.expect_literal()?;
            self.symbols.intern(&name, Payload::Constant(value))?;
        }
        Ok(())
    }

    /// {VarDecl} = {"VAR" name "INT"}. Assigns the next storage slot and
    /// reserves it in the listing.
    fn var_decls(&mut self) -> Result<(), TranslateError> {
        while self.accept_keyword(Keyword::Var) {
            let name = self.expect_ident()?;
            self.expect_keyword(Keyword::Int)?;
            let slot = self.alloc_slot()?;
            self.symbols.intern(&name, Payload::Variable(slot))?;
            self.emit(Instr::Resv(slot));
        }
        Ok(())
    }

    /// {ProcDecl} = {"PROC" name Block "END"}. The name is interned before
    /// the body is translated, so the body can call it; the body gets a
    /// scope of its own.
    fn proc_decls(&mut self) -> Result<(), TranslateError> {
        while self.accept_keyword(Keyword::Proc) {
            let name = self.expect_ident()?;
            let label = self.labels.next_label()?;
            self.symbols.intern(&name, Payload::Procedure(label))?;
            self.put_label(label);

            self.symbols.enter_scope();
            self.block()?;
            self.symbols.leave_scope();
            self.expect_keyword(Keyword::End)?;
            self.emit(Instr::Ret);
        }
        Ok(())
    }

    /// Program = "PROGRAM" name {ConstDecl} {VarDecl} {ProcDecl} Block
    /// "END". The program name is recorded but not interned; it is not a
    /// callable or loadable thing. Nothing may follow the closing END.
    fn program(mut self) -> Result<Program, TranslateError> {
        self.expect_keyword(Keyword::Program)?;
        let name = self.expect_ident()?;

        self.const_decls()?;
        self.var_decls()?;
        self.proc_decls()?;

        self.emit(Instr::Entry);
        self.block()?;
        self.expect_keyword(Keyword::End)?;
        self.emit(Instr::Halt);
        self.emit(Instr::End);

        if self.scanner.sym() != &Token::Eof {
            return Err(self.unexpected("end of input"));
        }

        self.symbols.dump();
        Ok(Program {
            name,
            code: self.code,
        })
    }
}
