//! tests/interpret.rs — scénarios de bout en bout pour louve-vm
//!
//! Chaque scénario passe une source complète à `Vm::interpret` avec la
//! sortie capturée, et vérifie à la fois le résultat et le texte produit.
//!
//! Lancer en local avec :
//!   cargo test -p louve-vm

use indoc::indoc;
use louve_vm::{InterpretResult, Vm};

fn run(source: &str) -> (InterpretResult, String) {
    let mut vm = Vm::with_captured_output();
    let result = vm.interpret(source);
    (result, vm.take_output())
}

fn run_ok(source: &str) -> String {
    let (result, out) = run(source);
    assert_eq!(result, InterpretResult::Ok, "sortie partielle : {out:?}");
    out
}

/* ───────────────────── Expressions & print ───────────────────── */

#[test]
fn arithmetic_precedence() {
    assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
}

#[test]
fn grouping_and_unary() {
    assert_eq!(run_ok("print -(1 + 2) * 3;"), "-9\n");
    assert_eq!(run_ok("print !true; print !nil; print !0;"), "false\ntrue\nfalse\n");
}

#[test]
fn comparison_chains() {
    assert_eq!(run_ok("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 4;"), "true\ntrue\nfalse\ntrue\n");
}

#[test]
fn equality_across_variants() {
    assert_eq!(run_ok("print 1 == 1.0;"), "true\n");
    assert_eq!(run_ok("print nil == false;"), "false\n");
    assert_eq!(run_ok("print 1 != 2;"), "true\n");
}

#[test]
fn display_forms() {
    assert_eq!(run_ok("print nil; print true; print 2.5; print 7;"), "nil\ntrue\n2.5\n7\n");
}

/* ───────────────────── Chaînes ───────────────────── */

#[test]
fn interned_strings_compare_equal_by_reference() {
    let out = run_ok(indoc! {r#"
        var a = "hi";
        var b = "hi";
        print a == b;
    "#});
    assert_eq!(out, "true\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run_ok(r#"print "foo" + "bar";"#), "foobar\n");
    // Le résultat de la concaténation est interné lui aussi.
    assert_eq!(run_ok(r#"print "foo" + "bar" == "foobar";"#), "true\n");
}

#[test]
fn adding_string_and_number_fails() {
    let mut vm = Vm::with_captured_output();
    assert_eq!(vm.interpret(r#"print "a" + 1;"#), InterpretResult::RuntimeError);
    assert_eq!(vm.last_error(), Some("Operands must be two numbers or two strings."));
}

/* ───────────────────── Variables & portées ───────────────────── */

#[test]
fn global_redefinition_is_allowed() {
    assert_eq!(run_ok("var a = 1; var a = 2; print a;"), "2\n");
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(run_ok("var a = 1; print a = 5;"), "5\n");
}

#[test]
fn block_scoped_shadowing() {
    let out = run_ok(indoc! {"
        var x = 10;
        {
            var y = x + 1;
            print y;
        }
        print x;
    "});
    assert_eq!(out, "11\n10\n");
}

#[test]
fn inner_local_shadows_outer() {
    let out = run_ok(indoc! {"
        var x = 1;
        {
            var x = 2;
            print x;
        }
        print x;
    "});
    assert_eq!(out, "2\n1\n");
}

#[test]
fn undefined_global_read_is_a_runtime_error() {
    let mut vm = Vm::with_captured_output();
    assert_eq!(vm.interpret("print undefined_name;"), InterpretResult::RuntimeError);
    assert_eq!(vm.last_error(), Some("Undefined variable 'undefined_name'."));
}

#[test]
fn undefined_global_write_is_a_runtime_error() {
    let mut vm = Vm::with_captured_output();
    assert_eq!(vm.interpret("inconnu = 3;"), InterpretResult::RuntimeError);
    assert_eq!(vm.last_error(), Some("Undefined variable 'inconnu'."));
    // L'affectation ratée ne doit pas avoir défini la variable.
    assert_eq!(vm.interpret("print inconnu;"), InterpretResult::RuntimeError);
    assert_eq!(vm.last_error(), Some("Undefined variable 'inconnu'."));
}

/* ───────────────────── const ───────────────────── */

#[test]
fn assigning_to_const_global_fails_at_runtime() {
    let mut vm = Vm::with_captured_output();
    let result = vm.interpret("const k = 5; k = 6;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(vm.last_error(), Some("Cannot assign to const variable 'k'."));
    assert_eq!(vm.take_output(), "");
}

#[test]
fn const_global_reads_normally() {
    assert_eq!(run_ok("const k = 5; print k + 1;"), "6\n");
}

/* ───────────────────── Division ───────────────────── */

#[test]
fn integer_division_by_zero_is_an_error() {
    let mut vm = Vm::with_captured_output();
    assert_eq!(vm.interpret("print 1 / 0;"), InterpretResult::RuntimeError);
    assert_eq!(vm.last_error(), Some("Integer division by zero."));
    assert_eq!(vm.take_output(), "");
}

#[test]
fn float_division_by_zero_is_not() {
    assert_eq!(run_ok("print 1 / 0.0;"), "inf\n");
}

/* ───────────────────── Contrôle de flot ───────────────────── */

#[test]
fn if_else_branches() {
    assert_eq!(run_ok("if (1 < 2) print \"oui\"; else print \"non\";"), "oui\n");
    assert_eq!(run_ok("if (1 > 2) print \"oui\"; else print \"non\";"), "non\n");
    assert_eq!(run_ok("if (false) print 1;"), "");
}

#[test]
fn and_or_short_circuit() {
    assert_eq!(run_ok("print true and 2;"), "2\n");
    assert_eq!(run_ok("print false and 2;"), "false\n");
    assert_eq!(run_ok("print false or 3;"), "3\n");
    assert_eq!(run_ok("print 1 or 3;"), "1\n");
    // La branche droite n'est pas évaluée : pas d'erreur de variable.
    assert_eq!(run_ok("print false and inexistante;"), "false\n");
}

#[test]
fn while_loop_counts() {
    let out = run_ok(indoc! {"
        var i = 0;
        while (i < 3) {
            print i;
            i = i + 1;
        }
    "});
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn for_loop_with_all_clauses() {
    let out = run_ok("for (var i = 0; i < 3; i = i + 1) print i;");
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn for_loop_without_clauses_terminates_via_condition() {
    let out = run_ok(indoc! {"
        var i = 0;
        for (; i < 2;) i = i + 1;
        print i;
    "});
    assert_eq!(out, "2\n");
}

/* ───────────────────── Erreurs de compilation ───────────────────── */

#[test]
fn syntax_error_reports_compile_error() {
    let (result, out) = run("print ;");
    assert_eq!(result, InterpretResult::CompileError);
    assert_eq!(out, "");
}

#[test]
fn compile_error_produces_no_output() {
    let (result, out) = run("print 1; print ];");
    assert_eq!(result, InterpretResult::CompileError);
    assert_eq!(out, "");
}

/* ───────────────────── Forme longue ───────────────────── */

#[test]
fn long_constant_smoke() {
    // 300 constantes chaîne distinctes, puis on imprime l'une d'elles :
    // le chemin OP_CONSTANT_LONG est traversé à l'exécution.
    let mut source = String::new();
    for i in 0..300 {
        source.push_str(&format!("var v{i} = \"s{i}\";\n"));
    }
    source.push_str("print v299;\n");
    assert_eq!(run_ok(&source), "s299\n");
}

#[test]
fn long_global_assignment_roundtrip() {
    let mut source = String::new();
    for i in 0..300 {
        source.push_str(&format!("var v{i} = {i};\n"));
    }
    source.push_str("v299 = v299 + 1; print v299;\n");
    assert_eq!(run_ok(&source), "300\n");
}

/* ───────────────────── Totalité ───────────────────── */

#[test]
fn interpret_is_total_on_assorted_sources() {
    // Ni panique ni blocage : chaque source termine sur l'un des trois
    // résultats.
    let sources = [
        "",
        ";",
        "print",
        "\"",
        "@",
        "var a;",
        "{ }",
        "{ { { print 1; } } }",
        "print 1 + + 2;",
        "while (false) {}",
        "if (true) {} else {}",
        "1 / 0;",
        "const c = 1; c = 2;",
    ];
    for source in sources {
        let mut vm = Vm::with_captured_output();
        let _ = vm.interpret(source);
    }
}
