//! pytest rendering of synthesized cases.

use super::inputs::PyValue;
use super::synthesizer::{Expectation, GeneratedTestCase};
use std::collections::BTreeSet;
use std::fmt::Write;

const HYPOTHESIS_NOTE: &str = "# Generated from code structure; \
    expectations are hypotheses to confirm, not verified behavior.";

/// Exception classes Python resolves without an import.
const BUILTIN_EXCEPTIONS: &[&str] = &[
    "ArithmeticError",
    "AssertionError",
    "AttributeError",
    "BaseException",
    "BaseExceptionGroup",
    "BlockingIOError",
    "BrokenPipeError",
    "BufferError",
    "ChildProcessError",
    "ConnectionAbortedError",
    "ConnectionError",
    "ConnectionRefusedError",
    "ConnectionResetError",
    "DeprecationWarning",
    "EOFError",
    "EnvironmentError",
    "Exception",
    "ExceptionGroup",
    "FileExistsError",
    "FileNotFoundError",
    "FloatingPointError",
    "GeneratorExit",
    "IOError",
    "ImportError",
    "IndentationError",
    "IndexError",
    "InterruptedError",
    "IsADirectoryError",
    "KeyError",
    "KeyboardInterrupt",
    "LookupError",
    "MemoryError",
    "ModuleNotFoundError",
    "NameError",
    "NotADirectoryError",
    "NotImplementedError",
    "OSError",
    "OverflowError",
    "PermissionError",
    "ProcessLookupError",
    "RecursionError",
    "ReferenceError",
    "RuntimeError",
    "RuntimeWarning",
    "StopAsyncIteration",
    "StopIteration",
    "SyntaxError",
    "SystemError",
    "SystemExit",
    "TabError",
    "TimeoutError",
    "TypeError",
    "UnboundLocalError",
    "UnicodeDecodeError",
    "UnicodeEncodeError",
    "UnicodeError",
    "UnicodeTranslateError",
    "UserWarning",
    "ValueError",
    "Warning",
    "ZeroDivisionError",
];

/// How a raised exception name becomes visible to the generated module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExceptionImport<'a> {
    /// `from <module> import Name`
    FromTarget(&'a str),
    /// `import root` for `root.sub.Name`
    Module(&'a str),
}

fn exception_import(exception: &str) -> Option<ExceptionImport<'_>> {
    match exception.split_once('.') {
        Some((root, _)) if matches!(root, "self" | "cls") => None,
        Some((root, _)) if root.starts_with(char::is_uppercase) => {
            Some(ExceptionImport::FromTarget(root))
        }
        Some((root, _)) => Some(ExceptionImport::Module(root)),
        None if BUILTIN_EXCEPTIONS.contains(&exception) => None,
        None if exception.starts_with(char::is_uppercase) => {
            Some(ExceptionImport::FromTarget(exception))
        }
        // a bound exception instance, not a class
        None => None,
    }
}

impl GeneratedTestCase {
    /// The case as a pytest function.
    pub fn render(&self) -> String {
        self.render_named(&self.test_name)
    }

    fn render_named(&self, test_name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "def {test_name}():");
        let _ = writeln!(out, "    # {}: {}", self.kind, self.rationale);

        if !self.inputs.is_empty() {
            let _ = writeln!(out, "    # Arrange");
            for input in &self.inputs {
                let _ = writeln!(out, "    {} = {}", input.name, input.value);
            }
            out.push('\n');
        }

        let call = if self.is_async {
            format!("asyncio.run({})", self.call)
        } else {
            self.call.clone()
        };

        match &self.expectation {
            Expectation::Raises(exception) => {
                let _ = writeln!(out, "    # Act / Assert");
                let _ = writeln!(out, "    with pytest.raises({exception}):");
                let _ = writeln!(out, "        {call}");
            }
            expectation => {
                let _ = writeln!(out, "    # Act");
                let _ = writeln!(out, "    result = {call}");
                out.push('\n');
                let _ = writeln!(out, "    # Assert");
                let _ = writeln!(out, "    {}", assertion(expectation));
            }
        }
        out
    }

    /// Name imported from the module under test.
    pub fn import_name(&self) -> &str {
        self.target.split('.').next().unwrap_or(&self.target)
    }

    fn needs_pytest(&self) -> bool {
        match &self.expectation {
            Expectation::Raises(_) => true,
            Expectation::Equals(PyValue::Float(x)) => x.is_finite(),
            _ => false,
        }
    }
}

fn assertion(expectation: &Expectation) -> String {
    match expectation {
        Expectation::Equals(PyValue::None) | Expectation::ReturnsDefault(PyValue::None) => {
            "assert result is None".to_string()
        }
        Expectation::Equals(PyValue::Float(x)) if x.is_nan() => {
            "assert result != result".to_string()
        }
        Expectation::Equals(value @ PyValue::Float(x)) if x.is_finite() => {
            format!("assert result == pytest.approx({value})")
        }
        Expectation::Equals(value) | Expectation::ReturnsDefault(value) => {
            format!("assert result == {value}")
        }
        Expectation::NotNone => "assert result is not None".to_string(),
        Expectation::ReturnsNone => "assert result is None".to_string(),
        Expectation::Raises(exception) => format!("# expects {exception}"),
    }
}

/// A complete pytest module for cases targeting `module`.
///
/// Test function names repeated across cases get an ordinal suffix so
/// pytest collects every one.
pub fn render_module(module: &str, cases: &[GeneratedTestCase]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HYPOTHESIS_NOTE}");

    let mut names: BTreeSet<&str> = cases.iter().map(GeneratedTestCase::import_name).collect();
    let mut modules = BTreeSet::new();
    for case in cases {
        if let Expectation::Raises(exception) = &case.expectation {
            match exception_import(exception) {
                Some(ExceptionImport::FromTarget(name)) => {
                    names.insert(name);
                }
                Some(ExceptionImport::Module(root)) => {
                    modules.insert(root);
                }
                None => {}
            }
        }
    }

    if cases.iter().any(|c| c.is_async) {
        out.push_str("import asyncio\n");
    }
    if cases.iter().any(GeneratedTestCase::needs_pytest) {
        out.push_str("import pytest\n");
    }
    for root in &modules {
        let _ = writeln!(out, "import {root}");
    }
    if !names.is_empty() {
        let joined = names.into_iter().collect::<Vec<_>>().join(", ");
        let _ = writeln!(out, "from {module} import {joined}");
    }

    let mut taken: BTreeSet<String> = BTreeSet::new();
    for case in cases {
        let mut name = case.test_name.clone();
        let mut ordinal = 2;
        while taken.contains(&name) {
            name = format!("{}_{ordinal}", case.test_name);
            ordinal += 1;
        }
        out.push_str("\n\n");
        out.push_str(&case.render_named(&name));
        taken.insert(name);
    }
    out
}

/// Python module name for a unit identifier (`pkg/util.py` -> `util`).
pub fn module_name(unit_id: &str) -> String {
    let file = unit_id.rsplit(['/', '\\']).next().unwrap_or(unit_id);
    let stem = file.strip_suffix(".py").unwrap_or(file);
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "module".to_string()
    } else {
        cleaned
    }
}
