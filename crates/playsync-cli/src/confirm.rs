//! Confirmation before an update batch.

use std::io::{BufRead, Write};

use playsync_schema::UpdateCandidate;

/// What the operator decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Nothing to update.
    UpToDate,
    Proceed,
    Declined,
}

/// Show the pending updates and ask for agreement unless `auto_yes`.
///
/// Only an answer of exactly `y` (surrounding whitespace ignored) proceeds;
/// end of input declines.
pub fn confirm<R: BufRead, W: Write>(
    candidates: &[UpdateCandidate],
    auto_yes: bool,
    mut input: R,
    mut output: W,
) -> std::io::Result<Gate> {
    if candidates.is_empty() {
        writeln!(output, "Everything is up to date!")?;
        return Ok(Gate::UpToDate);
    }

    writeln!(output, "The following applications will be updated:")?;
    for c in candidates {
        writeln!(
            output,
            "{} Version : {} -> {}",
            c.filename, c.local_version, c.remote_version
        )?;
    }
    writeln!(output)?;

    if auto_yes {
        return Ok(Gate::Proceed);
    }

    write!(output, "Do you agree? y/n ?")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    if answer.trim() == "y" {
        Ok(Gate::Proceed)
    } else {
        Ok(Gate::Declined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> UpdateCandidate {
        UpdateCandidate {
            identifier: "com.a".into(),
            filename: "a.apk".into(),
            local_version: 1,
            remote_version: 2,
        }
    }

    fn run(candidates: &[UpdateCandidate], yes: bool, input: &str) -> (Gate, String) {
        let mut out = Vec::new();
        let gate = confirm(candidates, yes, input.as_bytes(), &mut out).unwrap();
        (gate, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_empty_is_up_to_date() {
        let (gate, out) = run(&[], false, "");
        assert_eq!(gate, Gate::UpToDate);
        assert_eq!(out, "Everything is up to date!\n");
    }

    #[test]
    fn test_auto_yes_does_not_prompt() {
        let (gate, out) = run(&[candidate()], true, "");
        assert_eq!(gate, Gate::Proceed);
        assert!(out.contains("a.apk Version : 1 -> 2"));
        assert!(!out.contains("Do you agree"));
    }

    #[test]
    fn test_only_lowercase_y_proceeds() {
        assert_eq!(run(&[candidate()], false, "y\n").0, Gate::Proceed);
        assert_eq!(run(&[candidate()], false, "  y  \n").0, Gate::Proceed);
        for answer in ["Y\n", "yes\n", "n\n", "\n", ""] {
            assert_eq!(run(&[candidate()], false, answer).0, Gate::Declined, "{answer:?}");
        }
    }

    #[test]
    fn test_prompt_text() {
        let (_, out) = run(&[candidate()], false, "n\n");
        assert!(out.starts_with("The following applications will be updated:\n"));
        assert!(out.ends_with("Do you agree? y/n ?"));
    }
}
