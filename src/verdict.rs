use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictCode {
    Accepted,
    WrongAnswer,
    RuntimeError,
    // There is no .out file to compare against.
    NoAnswer,
}

pub struct Verdict {
    code: VerdictCode,
    case: String,
    elapsed: Duration,
}

/// Compares outputs token by token, so spacing and line breaks do not matter.
pub fn same_output(actual: &str, expect: &str) -> bool {
    actual.split_whitespace().eq(expect.split_whitespace())
}

impl Verdict {
    pub fn judge<S: ToString>(
        case: S,
        exited_ok: bool,
        actual: &str,
        expect: Option<&str>,
        elapsed: Duration,
    ) -> Self {
        use VerdictCode::*;
        let code = if !exited_ok {
            RuntimeError
        } else {
            match expect {
                None => NoAnswer,
                Some(e) if same_output(actual, e) => Accepted,
                Some(_) => WrongAnswer,
            }
        };

        Verdict {
            code,
            case: case.to_string(),
            elapsed,
        }
    }

    pub fn code(&self) -> VerdictCode {
        self.code
    }

    pub fn is_accepted(&self) -> bool {
        self.code == VerdictCode::Accepted
    }

    pub fn print(&self, w: &mut dyn termcolor::WriteColor) -> std::io::Result<()> {
        use termcolor::Color::{Green, Red, Yellow};
        use termcolor::ColorSpec;
        let use_color = w.supports_color();

        let (color, msg) = match self.code {
            VerdictCode::Accepted => (Some(Green), "AC"),
            VerdictCode::WrongAnswer => (Some(Red), "WA"),
            VerdictCode::RuntimeError => (Some(Yellow), "RE"),
            VerdictCode::NoAnswer => (None, "no answer file"),
        };

        write!(w, "{}: ", self.case)?;
        if use_color {
            w.set_color(ColorSpec::new().set_fg(color).set_bold(true))?;
        }
        write!(w, "{}", msg)?;
        if use_color {
            w.reset()?;
        }
        writeln!(w, " ({} ms)", self.elapsed.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    #[test]
    fn whitespace_is_ignored() {
        assert!(same_output("1 2\n3\n", "1 2 3"));
        assert!(same_output("", "\n"));
        assert!(!same_output("1 2", "1 2 3"));
        assert!(!same_output("Yes", "YES"));
    }

    #[test]
    fn judge_codes() {
        let d = Duration::from_millis(5);
        assert_eq!(
            Verdict::judge("1.in", true, "3\n", Some("3"), d).code(),
            VerdictCode::Accepted
        );
        assert_eq!(
            Verdict::judge("1.in", true, "4\n", Some("3"), d).code(),
            VerdictCode::WrongAnswer
        );
        assert_eq!(
            Verdict::judge("1.in", false, "3\n", Some("3"), d).code(),
            VerdictCode::RuntimeError
        );
        assert_eq!(
            Verdict::judge("1.in", true, "3\n", None, d).code(),
            VerdictCode::NoAnswer
        );
    }

    #[test]
    fn prints_without_color() {
        let mut buf = Buffer::no_color();
        Verdict::judge("test/sample-1.in", true, "x", Some("y"), Duration::from_millis(12))
            .print(&mut buf)
            .unwrap();
        assert_eq!(
            String::from_utf8(buf.into_inner()).unwrap(),
            "test/sample-1.in: WA (12 ms)\n"
        );
    }
}
