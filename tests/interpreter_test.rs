//! End-to-end scenarios driven through the compiled binary, the way a user
//! would run a script: write a source file, invoke `luma`, check stdout,
//! stderr and the process exit code.
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

fn script_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("luma_test_{}_{}.lox", std::process::id(), name));
    path
}

fn run_source(name: &str, source: &str) -> Output {
    let path = script_path(name);
    {
        let mut file = std::fs::File::create(&path).expect("create temp script");
        file.write_all(source.as_bytes()).expect("write temp script");
    }
    let output = Command::new(env!("CARGO_BIN_EXE_luma"))
        .arg(&path)
        .output()
        .expect("run luma binary");
    let _ = std::fs::remove_file(&path);
    output
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn arithmetic_and_precedence() {
    let output = run_source("arith", "print 1 + 2 * 3 - (4 / 2);\n");
    assert_eq!(stdout_of(&output), "5\n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn global_variables_persist_across_statements() {
    let output = run_source(
        "globals",
        "var greeting = \"hi\";\nvar count = 1;\ncount = count + 1;\nprint greeting;\nprint count;\n",
    );
    assert_eq!(stdout_of(&output), "hi\n2\n");
}

#[test]
fn closures_capture_and_share_state() {
    let source = r#"
        fun makeCounter() {
            var count = 0;
            fun increment() {
                count = count + 1;
                return count;
            }
            return increment;
        }
        var counter = makeCounter();
        print counter();
        print counter();
        print counter();
    "#;
    let output = run_source("closures", source);
    assert_eq!(stdout_of(&output), "1\n2\n3\n");
}

#[test]
fn classes_support_this_and_initializers() {
    let source = r#"
        class Counter {
            init(start) {
                this.value = start;
            }
            bump() {
                this.value = this.value + 1;
                return this.value;
            }
        }
        var c = Counter(10);
        print c.bump();
        print c.bump();
    "#;
    let output = run_source("classes", source);
    assert_eq!(stdout_of(&output), "11\n12\n");
}

#[test]
fn inheritance_and_super_dispatch() {
    let source = r#"
        class Animal {
            speak() {
                return "...";
            }
            describe() {
                return "An animal says " + this.speak();
            }
        }
        class Dog < Animal {
            speak() {
                return "Woof";
            }
            describe() {
                return super.describe() + "!";
            }
        }
        print Dog().describe();
    "#;
    let output = run_source("inherit", source);
    assert_eq!(stdout_of(&output), "An animal says Woof!\n");
}

#[test]
fn runtime_error_prints_message_and_stack_trace() {
    let source = r#"
        fun a() {
            b();
        }
        fun b() {
            return 1 + nil;
        }
        a();
    "#;
    let output = run_source("runtime_error", source);
    assert_eq!(output.status.code(), Some(70));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Operands must be two numbers or two strings."));
    assert!(stderr.contains("in b()"));
    assert!(stderr.contains("in a()"));
    assert!(stderr.contains("in script"));
}

#[test]
fn compile_error_exits_65_without_running() {
    let output = run_source("compile_error", "print 1 +;\n");
    assert_eq!(output.status.code(), Some(65));
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn calling_a_non_function_is_a_runtime_error() {
    let output = run_source("bad_call", "var x = 3;\nx();\n");
    assert_eq!(output.status.code(), Some(70));
    assert!(stderr_of(&output).contains("Can only call functions and classes."));
}

#[test]
fn wrong_arity_is_a_runtime_error() {
    let output = run_source("arity", "fun f(a, b) { return a + b; }\nf(1);\n");
    assert_eq!(output.status.code(), Some(70));
    assert!(stderr_of(&output).contains("Expected 2 arguments but got 1."));
}
