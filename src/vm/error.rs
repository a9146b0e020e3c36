//! Runtime error representation, shaped after the teacher's `ErrorKind`/
//! `VMError` pair but reworded to the exact runtime message text.
#[derive(Debug, Clone)]
pub enum ErrorKind {
    OperandMustBeNumber,
    OperandsMustBeNumbers,
    OperandsMustBeTwoNumbersOrTwoStrings,
    UndefinedVariable(String),
    UndefinedProperty(String),
    OnlyInstancesHaveProperties,
    OnlyInstancesHaveMethods,
    CanOnlyCallFunctionsAndClasses,
    WrongArity { expected: u8, got: u8 },
    StackOverflow,
    SuperclassMustBeAClass,
}

#[derive(Debug, Clone)]
pub struct VMError {
    pub kind: ErrorKind,
    /// One entry per live call frame, innermost first, naming the function
    /// (or `"script"` for the top-level frame) active when the error fired.
    pub stack_trace: Vec<(String, u32)>,
}

impl VMError {
    pub fn message(&self) -> String {
        match &self.kind {
            ErrorKind::OperandMustBeNumber => "Operand must be a number.".to_string(),
            ErrorKind::OperandsMustBeNumbers => "Operands must be numbers.".to_string(),
            ErrorKind::OperandsMustBeTwoNumbersOrTwoStrings => {
                "Operands must be two numbers or two strings.".to_string()
            }
            ErrorKind::UndefinedVariable(name) => format!("Undefined variable '{name}'."),
            ErrorKind::UndefinedProperty(name) => format!("Undefined property '{name}'."),
            ErrorKind::OnlyInstancesHaveProperties => "Only instances have properties.".to_string(),
            ErrorKind::OnlyInstancesHaveMethods => "Only instances have methods.".to_string(),
            ErrorKind::CanOnlyCallFunctionsAndClasses => "Can only call functions and classes.".to_string(),
            ErrorKind::WrongArity { expected, got } => {
                format!("Expected {expected} arguments but got {got}.")
            }
            ErrorKind::StackOverflow => "Stack overflow.".to_string(),
            ErrorKind::SuperclassMustBeAClass => "Superclass must be a class.".to_string(),
        }
    }
}

impl std::fmt::Display for VMError {
    /// `<message>\n[line <n>] in <name>\n…`, innermost frame first — the
    /// exact wording the interpreter writes to stderr on a runtime error.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.message())?;
        for (i, (name, line)) in self.stack_trace.iter().enumerate() {
            let label = if name.is_empty() { "script".to_string() } else { format!("{name}()") };
            if i + 1 == self.stack_trace.len() {
                write!(f, "[line {line}] in {label}")?;
            } else {
                writeln!(f, "[line {line}] in {label}")?;
            }
        }
        Ok(())
    }
}
