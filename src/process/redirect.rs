use std::fmt;

const TRUNCATE_OPERATOR: &str = ">";
const APPEND_OPERATOR: &str = ">>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub path: String,
    pub append: bool,
}

/// Program arguments with the first redirect operator and its target split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPlan {
    pub program_args: Vec<String>,
    pub target: Option<RedirectTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectError {
    MissingTarget(String),
    MissingProgram,
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectError::MissingTarget(op) => write!(f, "missing redirect target after '{}'", op),
            RedirectError::MissingProgram => write!(f, "missing command before redirect"),
        }
    }
}

impl std::error::Error for RedirectError {}

impl RedirectPlan {
    pub fn plan(args: Vec<String>) -> Result<Self, RedirectError> {
        let Some(op_index) = args
            .iter()
            .position(|arg| arg == TRUNCATE_OPERATOR || arg == APPEND_OPERATOR)
        else {
            return Ok(Self {
                program_args: args,
                target: None,
            });
        };

        let mut program_args = args;
        let mut tail = program_args.split_off(op_index);
        let operator = tail.remove(0);

        if tail.is_empty() {
            return Err(RedirectError::MissingTarget(operator));
        }
        let path = tail.remove(0);

        if program_args.is_empty() {
            return Err(RedirectError::MissingProgram);
        }

        // Later operators are not re-scanned; they reach the program verbatim.
        program_args.extend(tail);

        Ok(Self {
            program_args,
            target: Some(RedirectTarget {
                path,
                append: operator == APPEND_OPERATOR,
            }),
        })
    }

    pub fn program(&self) -> &str {
        self.program_args.first().map(String::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_no_redirect_passes_through() {
        let plan = RedirectPlan::plan(args("ls -la /tmp")).unwrap();
        assert_eq!(plan.program_args, args("ls -la /tmp"));
        assert!(plan.target.is_none());
        assert_eq!(plan.program(), "ls");
    }

    #[test]
    fn test_truncate_redirect() {
        let plan = RedirectPlan::plan(args("echo hi > out.txt")).unwrap();
        assert_eq!(plan.program_args, args("echo hi"));
        assert_eq!(
            plan.target,
            Some(RedirectTarget {
                path: "out.txt".to_string(),
                append: false,
            })
        );
    }

    #[test]
    fn test_append_redirect() {
        let plan = RedirectPlan::plan(args("date >> log.txt")).unwrap();
        assert_eq!(plan.program_args, args("date"));
        assert!(plan.target.unwrap().append);
    }

    #[test]
    fn test_missing_target() {
        assert_eq!(
            RedirectPlan::plan(args("ls >")),
            Err(RedirectError::MissingTarget(">".to_string()))
        );
        assert_eq!(
            RedirectPlan::plan(args("ls >>")),
            Err(RedirectError::MissingTarget(">>".to_string()))
        );
    }

    #[test]
    fn test_missing_program() {
        assert_eq!(
            RedirectPlan::plan(args("> out.txt")),
            Err(RedirectError::MissingProgram)
        );
    }

    #[test]
    fn test_only_first_operator_is_honored() {
        let plan = RedirectPlan::plan(args("echo a > first.txt b >> second.txt")).unwrap();
        assert_eq!(plan.program_args, args("echo a b >> second.txt"));
        assert_eq!(plan.target.unwrap().path, "first.txt");
    }

    #[test]
    fn test_operator_glued_to_word_is_literal() {
        let plan = RedirectPlan::plan(args("echo a>b")).unwrap();
        assert_eq!(plan.program_args, args("echo a>b"));
        assert!(plan.target.is_none());
    }
}
