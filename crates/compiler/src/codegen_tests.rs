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

#[cfg(test)]
mod tests {
    use crate::codegen::{Program, TranslateOptions, translate};
    use crate::errors::TranslateError;
    use crate::labels::Label;
    use crate::opcode::Instr::*;
    use crate::opcode::Slot;
    use crate::symtab::{ClassFilter, SymbolClass};
    use crate::testing::execute;
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use unindent::unindent;

    fn translated(source: &str) -> Program {
        translate(source, TranslateOptions::default()).unwrap()
    }

    fn translate_err(source: &str) -> TranslateError {
        translate(source, TranslateOptions::default()).unwrap_err()
    }

    #[test]
    fn test_assign_add_expr() {
        let program = translated("PROGRAM p VAR x INT x := 1 + 2 END");
        assert_eq!(program.name, "p");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                Push(1),
                Push(2),
                Add,
                Store(Slot(0)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_constant_folds_into_use_sites() {
        let program = translated("PROGRAM p CONST n 7 VAR x INT x := n END");
        assert_eq!(
            program.code,
            vec![Resv(Slot(0)), Entry, Push(7), Store(Slot(0)), Halt, End]
        );
    }

    #[test]
    fn test_grouping_reorders_emission() {
        let program = translated("PROGRAM p VAR x INT x := 2 * (1 + 3) END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                Push(2),
                Push(1),
                Push(3),
                Add,
                Mul,
                Store(Slot(0)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_and_emits_short_circuit_shape() {
        let program = translated("PROGRAM p VAR x INT x := 1 AND 2 END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                Push(1),
                Jmpz(Label(0)),
                Push(2),
                Jmp(Label(1)),
                DefLabel(Label(0)),
                Push(0),
                DefLabel(Label(1)),
                Store(Slot(0)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_or_emits_short_circuit_shape() {
        let program = translated("PROGRAM p VAR x INT x := 0 OR 2 END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                Push(0),
                Dup,
                Jmpnz(Label(0)),
                Pop,
                Push(2),
                DefLabel(Label(0)),
                Store(Slot(0)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_if_else() {
        let program = translated("PROGRAM p VAR x INT IF 1 THEN x := 1 ELSE x := 2 ENDIF END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                Push(1),
                Jmpz(Label(0)),
                Push(1),
                Store(Slot(0)),
                Jmp(Label(1)),
                DefLabel(Label(0)),
                Push(2),
                Store(Slot(0)),
                DefLabel(Label(1)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_if_with_empty_else_keeps_both_labels() {
        let program = translated("PROGRAM p VAR x INT IF 1 THEN x := 1 ELSE ENDIF END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                Push(1),
                Jmpz(Label(0)),
                Push(1),
                Store(Slot(0)),
                Jmp(Label(1)),
                DefLabel(Label(0)),
                DefLabel(Label(1)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_if_requires_an_else_arm() {
        let error = translate_err("PROGRAM p VAR x INT IF 1 THEN x := 1 ENDIF END");
        assert_eq!(
            error,
            TranslateError::Unexpected {
                expected: "ELSE".to_string(),
                found: "ENDIF".to_string(),
            }
        );
        assert_eq!(error.to_string(), "expected ELSE, found ENDIF");
    }

    #[test]
    fn test_while_tests_before_the_body() {
        let program = translated("PROGRAM p VAR x INT WHILE x < 3 x := x + 1 ENDWHILE END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                DefLabel(Label(0)),
                Load(Slot(0)),
                Push(3),
                CmpLt,
                Jmpz(Label(1)),
                Load(Slot(0)),
                Push(1),
                Add,
                Store(Slot(0)),
                Jmp(Label(0)),
                DefLabel(Label(1)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_repeat_tests_after_the_body() {
        let program = translated("PROGRAM p VAR x INT REPEAT x := x + 1 UNTIL x > 2 END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                DefLabel(Label(0)),
                Load(Slot(0)),
                Push(1),
                Add,
                Store(Slot(0)),
                Load(Slot(0)),
                Push(2),
                CmpGt,
                Jmpz(Label(0)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_for_reserves_and_initializes_its_variable() {
        let program = translated("PROGRAM p VAR x INT FOR i FROM 3 TO 5 x := x + 1 ENDFOR END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                Resv(Slot(1)),
                Push(3),
                Store(Slot(1)),
                SaveC,
                SetC(2),
                DefLabel(Label(0)),
                Load(Slot(0)),
                Push(1),
                Add,
                Store(Slot(0)),
                LoopC(Label(0)),
                RestC,
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_times_brackets_the_body_with_counter_ops() {
        let program = translated("PROGRAM p VAR x INT TIMES 2 x := x + 1 ENDTIMES END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                Entry,
                SaveC,
                SetC(2),
                DefLabel(Label(0)),
                Load(Slot(0)),
                Push(1),
                Add,
                Store(Slot(0)),
                LoopC(Label(0)),
                RestC,
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_procedure_body_precedes_entry() {
        let program = translated("PROGRAM p VAR x INT PROC f x := 1 END f END");
        assert_eq!(
            program.code,
            vec![
                Resv(Slot(0)),
                DefLabel(Label(0)),
                Push(1),
                Store(Slot(0)),
                Ret,
                Entry,
                Call(Label(0)),
                Halt,
                End
            ]
        );
    }

    #[test]
    fn test_empty_program() {
        let program = translated("PROGRAM p END");
        assert_eq!(program.name, "p");
        assert_eq!(program.code, vec![Entry, Halt, End]);
    }

    #[test]
    fn test_listing_renders_one_instruction_per_line() {
        let program = translated("PROGRAM p VAR x INT x := 1 END");
        assert_eq!(
            program.to_string(),
            "RESV 0\nENTRY:\nPUSH 1\nSTORE 0\nHALT\nEND\n"
        );
    }

    #[test]
    fn test_comments_are_invisible_to_translation() {
        let program = translated("PROGRAM p (* setup *) VAR x INT x := (* here *) 4 END");
        assert_eq!(
            program.code,
            vec![Resv(Slot(0)), Entry, Push(4), Store(Slot(0)), Halt, End]
        );
    }

    #[test]
    fn test_assignment_requires_a_declared_variable() {
        let error = translate_err("PROGRAM p x := 1 + 2 END");
        assert_eq!(
            error,
            TranslateError::Unresolved {
                name: "x".to_string(),
                class: ClassFilter::Of(SymbolClass::Variable),
            }
        );
        assert_eq!(error.to_string(), "unresolved variable 'x'");
    }

    #[test]
    fn test_expression_names_resolve_under_the_wildcard() {
        let error = translate_err("PROGRAM p VAR x INT x := y END");
        assert_eq!(
            error,
            TranslateError::Unresolved {
                name: "y".to_string(),
                class: ClassFilter::Any,
            }
        );
        assert_eq!(error.to_string(), "unresolved name 'y'");
    }

    #[test]
    fn test_assignment_to_a_procedure_name_fails() {
        let error = translate_err("PROGRAM p PROC f END f := 1 END");
        assert_eq!(
            error,
            TranslateError::Unresolved {
                name: "f".to_string(),
                class: ClassFilter::Of(SymbolClass::Variable),
            }
        );
    }

    #[test]
    fn test_calling_a_variable_fails() {
        let error = translate_err("PROGRAM p VAR x INT x END");
        assert_eq!(
            error,
            TranslateError::Unresolved {
                name: "x".to_string(),
                class: ClassFilter::Of(SymbolClass::Procedure),
            }
        );
        assert_eq!(error.to_string(), "unresolved procedure 'x'");
    }

    #[test]
    fn test_a_procedure_is_not_a_value() {
        let error = translate_err("PROGRAM p VAR x INT PROC f END x := f END");
        assert_eq!(error, TranslateError::ProcedureAsValue("f".to_string()));
        assert_eq!(error.to_string(), "procedure 'f' used as a value");
    }

    #[test_case(5, 5 ; "equal bounds")]
    #[test_case(5, 3 ; "descending bounds")]
    fn test_for_bounds_must_ascend(lo: i64, hi: i64) {
        let source = format!("PROGRAM p VAR x INT FOR i FROM {lo} TO {hi} x := 1 ENDFOR END");
        assert_eq!(
            translate_err(&source),
            TranslateError::LoopBounds { lo, hi }
        );
    }

    #[test]
    fn test_times_count_must_be_positive() {
        let error = translate_err("PROGRAM p TIMES 0 ENDTIMES END");
        assert_eq!(error, TranslateError::LoopCount(0));
        assert_eq!(error.to_string(), "TIMES count must be at least 1, got 0");
    }

    #[test]
    fn test_missing_program_end() {
        let error = translate_err("PROGRAM p VAR x INT x := 1");
        assert_eq!(
            error,
            TranslateError::Unexpected {
                expected: "END".to_string(),
                found: "end of input".to_string(),
            }
        );
        assert_eq!(error.to_string(), "expected END, found end of input");
    }

    #[test]
    fn test_trailing_tokens_after_end() {
        let error = translate_err("PROGRAM p END END");
        assert_eq!(
            error,
            TranslateError::Unexpected {
                expected: "end of input".to_string(),
                found: "END".to_string(),
            }
        );
    }

    #[test]
    fn test_wrong_loop_terminator() {
        let error = translate_err("PROGRAM p VAR x INT WHILE 1 x := 1 ENDIF END");
        assert_eq!(
            error,
            TranslateError::Unexpected {
                expected: "ENDWHILE".to_string(),
                found: "ENDIF".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_then() {
        let error = translate_err("PROGRAM p VAR x INT IF 1 x := 1 ENDIF END");
        assert_eq!(error.to_string(), "expected THEN, found identifier 'x'");
    }

    #[test]
    fn test_unclosed_grouping() {
        let error = translate_err("PROGRAM p VAR x INT x := (1 + 2 END");
        assert_eq!(error.to_string(), "expected ')', found END");
    }

    #[test]
    fn test_program_keyword_required() {
        let error = translate_err("VAR x INT");
        assert_eq!(
            error,
            TranslateError::Unexpected {
                expected: "PROGRAM".to_string(),
                found: "VAR".to_string(),
            }
        );
    }

    #[test]
    fn test_label_exhaustion_is_fatal() {
        let options = TranslateOptions {
            max_labels: 1,
            ..TranslateOptions::default()
        };
        let error = translate("PROGRAM p IF 1 THEN ELSE ENDIF END", options).unwrap_err();
        assert_eq!(error, TranslateError::LabelsExhausted);
        assert_eq!(error.to_string(), "exhausted label storage");
    }

    #[test]
    fn test_symbol_exhaustion_is_fatal() {
        let options = TranslateOptions {
            max_symbols: 1,
            ..TranslateOptions::default()
        };
        let error = translate("PROGRAM p VAR x INT VAR y INT END", options).unwrap_err();
        assert_eq!(error, TranslateError::SymbolsExhausted);
        assert_eq!(error.to_string(), "exhausted symbol storage");
    }

    #[test]
    fn test_slot_space_exhaustion_is_fatal() {
        // A symbol cap above the u16 slot range lets the slot numbers run
        // out first; redeclaring one name keeps the table scan cheap.
        let mut source = String::from("PROGRAM p ");
        for _ in 0..=u16::MAX {
            source.push_str("VAR x INT ");
        }
        source.push_str("END");
        let options = TranslateOptions {
            max_symbols: 70_000,
            ..TranslateOptions::default()
        };
        assert_eq!(
            translate(&source, options),
            Err(TranslateError::SymbolsExhausted)
        );
    }

    #[test_case("2 > 1", 1 ; "greater holds")]
    #[test_case("1 > 2", 0 ; "greater fails")]
    #[test_case("1 < 2", 1 ; "less holds")]
    #[test_case("2 = 2", 1 ; "equals holds")]
    #[test_case("2 = 3", 0 ; "equals fails")]
    fn test_relations_compute_booleans(expr: &str, expected: i64) {
        let source = format!("PROGRAM p VAR x INT x := {expr} END");
        let execution = execute(&translated(&source));
        assert_eq!(execution.slot(Slot(0)), expected);
    }

    #[test_case("3 - 1 - 1", 1 ; "subtraction folds left")]
    #[test_case("8 / 2 / 2", 2 ; "division folds left")]
    #[test_case("2 + 3 * 4", 14 ; "term binds tighter than sum")]
    #[test_case("10 - 2 * 3", 4 ; "product under subtraction")]
    fn test_arithmetic_evaluates_left_to_right(expr: &str, expected: i64) {
        let source = format!("PROGRAM p VAR x INT x := {expr} END");
        let execution = execute(&translated(&source));
        assert_eq!(execution.slot(Slot(0)), expected);
    }

    #[test]
    fn test_and_short_circuit_skips_the_right_operand() {
        // The division would fault if it ever executed.
        let execution = execute(&translated("PROGRAM p VAR x INT x := 0 AND 1 / 0 END"));
        assert_eq!(execution.count(Div), 0);
        assert_eq!(execution.slot(Slot(0)), 0);
    }

    #[test]
    fn test_or_short_circuit_skips_the_right_operand() {
        let execution = execute(&translated("PROGRAM p VAR x INT x := 1 OR 1 / 0 END"));
        assert_eq!(execution.count(Div), 0);
        assert_eq!(execution.slot(Slot(0)), 1);
    }

    #[test]
    fn test_and_falls_through_to_the_right_operand() {
        let execution = execute(&translated("PROGRAM p VAR x INT x := 2 AND 3 END"));
        assert_eq!(execution.slot(Slot(0)), 3);
    }

    #[test]
    fn test_or_falls_through_to_the_right_operand() {
        let execution = execute(&translated("PROGRAM p VAR x INT x := 0 OR 5 END"));
        assert_eq!(execution.slot(Slot(0)), 5);
    }

    #[test]
    fn test_while_runs_to_its_fixpoint() {
        let execution = execute(&translated(
            "PROGRAM p VAR x INT WHILE x < 3 x := x + 1 ENDWHILE END",
        ));
        assert_eq!(execution.slot(Slot(0)), 3);
    }

    #[test]
    fn test_repeat_runs_at_least_once() {
        let execution = execute(&translated(
            "PROGRAM p VAR x INT REPEAT x := x + 1 UNTIL 1 END",
        ));
        assert_eq!(execution.slot(Slot(0)), 1);
    }

    #[test_case(3, 5, 2 ; "two iterations")]
    #[test_case(0, 1, 1 ; "single iteration")]
    #[test_case(2, 6, 4 ; "four iterations")]
    fn test_for_runs_upper_minus_lower_times(lo: i64, hi: i64, expected: i64) {
        let source = format!("PROGRAM p VAR x INT FOR i FROM {lo} TO {hi} x := x + 1 ENDFOR END");
        let execution = execute(&translated(&source));
        assert_eq!(execution.slot(Slot(0)), expected);
    }

    #[test]
    fn test_for_variable_holds_the_lower_bound_throughout() {
        let execution = execute(&translated(
            "PROGRAM p VAR x INT FOR i FROM 3 TO 5 x := x + i ENDFOR END",
        ));
        assert_eq!(execution.slot(Slot(0)), 6);
    }

    #[test_case(1, 1 ; "once")]
    #[test_case(3, 3 ; "thrice")]
    fn test_times_runs_exactly_count_times(count: i64, expected: i64) {
        let source = format!("PROGRAM p VAR x INT TIMES {count} x := x + 1 ENDTIMES END");
        let execution = execute(&translated(&source));
        assert_eq!(execution.slot(Slot(0)), expected);
    }

    #[test]
    fn test_nested_counted_loops_preserve_the_counter() {
        let execution = execute(&translated(
            "PROGRAM p VAR x INT TIMES 2 FOR i FROM 0 TO 2 x := x + 1 ENDFOR ENDTIMES END",
        ));
        assert_eq!(execution.slot(Slot(0)), 4);
    }

    #[test]
    fn test_for_variable_shadows_and_unwinds() {
        let source = unindent(
            "
            PROGRAM p
            VAR x INT
            VAR y INT
            x := 9
            FOR x FROM 1 TO 3
                y := y + x
            ENDFOR
            y := y + x
            END",
        );
        let execution = execute(&translated(&source));
        // The loop variable shadowed x in its own slot; the outer x is
        // untouched and resolvable again after ENDFOR.
        assert_eq!(execution.slot(Slot(0)), 9);
        assert_eq!(execution.slot(Slot(1)), 11);
    }

    #[test]
    fn test_procedure_body_runs_per_call() {
        let execution = execute(&translated(
            "PROGRAM p VAR x INT PROC bump x := x + 1 END bump bump END",
        ));
        assert_eq!(execution.slot(Slot(0)), 2);
    }

    #[test]
    fn test_whole_program_translates_and_runs() {
        let source = unindent(
            "
            PROGRAM demo
            CONST limit 3
            VAR x INT
            PROC bump
                x := x + 1
            END
                WHILE x < limit
                    bump
                ENDWHILE
            END",
        );
        let program = translated(&source);
        assert_eq!(program.name, "demo");
        let execution = execute(&program);
        assert_eq!(execution.slot(Slot(0)), 3);
        assert_eq!(execution.count(Call(Label(0))), 3);
    }
}
