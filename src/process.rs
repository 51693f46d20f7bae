use std::process::{Command, Output};

use tracing::debug;

use crate::error::ProcessError;

/// Runs `command` to completion and returns its captured output.
///
/// A command that cannot be spawned or exits non-zero is an error; stderr is
/// kept in the error so the caller can see why.
pub(crate) fn run(command: &mut Command) -> Result<Output, ProcessError> {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!("running {:?}", command);

    let output = command
        .output()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ProcessError::Status {
            program,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = run(&mut Command::new("definitely-not-a-real-program-4711")).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn non_zero_exit_keeps_stderr() {
        let err = run(Command::new("sh").args(["-c", "echo nope >&2; exit 3"])).unwrap_err();
        match err {
            ProcessError::Status { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn success_returns_stdout() {
        let output = run(Command::new("sh").args(["-c", "echo hello"])).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }
}
