use std::fs;
use std::path::PathBuf;
use std::process::Output;

use assert_cmd::Command;
use tempfile::TempDir;

fn cs() -> Command {
    Command::cargo_bin("cs").expect("binary `cs` should build")
}

fn write_source(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).expect("failed to write test source");
    path
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// Debug builds trace extra [INFO] lines to stderr, so stderr assertions
// check containment rather than equality.
fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn runs_hello_world() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "hello.cs",
        r#"
using System;

class Program
{
    static void Main()
    {
        Console.WriteLine("Hello, World!");
    }
}
"#,
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "Hello, World!\n");
}

#[test]
fn runs_loops_and_helper_calls() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "fact.cs",
        r#"
using System;

class Program
{
    static int Factorial(int n)
    {
        if (n <= 1) { return 1; }
        return n * Factorial(n - 1);
    }

    static void Main()
    {
        var i = 1;
        while (i <= 5)
        {
            Console.WriteLine("" + Factorial(i));
            i = i + 1;
        }
    }
}
"#,
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "1\n2\n6\n24\n120\n");
}

#[test]
fn main_may_take_a_string_array() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "args.cs",
        r#"
using System;

class Program
{
    static void Main(string[] args)
    {
        Console.Write("ok");
    }
}
"#,
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "ok");
}

#[test]
fn main_with_extra_parameters_is_rejected() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "bad_main.cs",
        "class Program { static void Main(int a, int b) { } }",
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("entry point signature not supported"));
}

#[test]
fn missing_entry_point_fails() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "no_main.cs",
        "class Program { static void Helper() { } }",
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("no entry point"));
}

#[test]
fn multiple_entry_points_fail() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "two_mains.cs",
        "class A { static void Main() { } } class B { static void Main() { } }",
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("ambiguous entry point: found 2 methods named `Main`"));
}

#[test]
fn compile_errors_print_code_and_message_lines() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "broken.cs",
        r#"
class Program
{
    static void Main()
    {
        Missing();
    }
}
"#,
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains("E0001: the name `Missing` does not exist in the current context"),
        "{stderr}"
    );
}

#[test]
fn syntax_errors_are_reported_with_their_code() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "syntax.cs",
        "class Program { static void Main() { var x = ; } }",
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("P0001: "));
}

#[test]
fn syntax_error_inside_main_reports_the_diagnostic_not_a_missing_entry_point() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "broken_main.cs",
        "class P { static void Main(int { } }",
    );

    // Recovery drops the mangled `Main` declaration; the user should still
    // see the syntax error rather than "no entry point".
    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("P0001: "), "{stderr}");
    assert!(!stderr.contains("no entry point"), "{stderr}");
}

#[test]
fn unresolvable_using_warns_but_still_runs() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "missing_lib.cs",
        r#"
using System;
using Does.Not.Exist;

class Program
{
    static void Main()
    {
        Console.WriteLine("ran anyway");
    }
}
"#,
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), "ran anyway\n");
    assert!(stderr_of(&output)
        .contains("warning: no library found for using directive `Does.Not.Exist`"));
}

#[test]
fn runtime_fault_fails_the_process() {
    let dir = TempDir::new().unwrap();
    let file = write_source(
        &dir,
        "div.cs",
        r#"
class Program
{
    static void Main()
    {
        var zero = 0;
        var x = 1 / zero;
        x = x + 1;
    }
}
"#,
    );

    let output = cs().arg("run").arg(&file).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("attempted to divide by zero"));
}

#[test]
fn unreadable_file_fails() {
    let output = cs().arg("run").arg("definitely_absent.cs").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("failed to read"));
}

#[test]
fn no_arguments_prints_usage() {
    let output = cs().output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("cs [command] [file]"));
}

#[test]
fn run_without_a_file_prints_usage() {
    let output = cs().arg("run").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("cs [command] [file]"));
}

#[test]
fn unknown_command_prints_usage() {
    let output = cs().arg("bogus").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("cs [command] [file]"));
}

#[test]
fn compile_command_is_not_implemented() {
    let output = cs().arg("compile").arg("whatever.cs").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Not implemented"));
}
