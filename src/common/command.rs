use std::path::PathBuf;

use crate::common::Error;
use crate::system::interface::ProcessId;

/// Upper bound on the argument vector, program name included.
pub const MAX_ARGS: usize = 512;

/// One fully tokenized command line, ready for dispatch.
///
/// `args` always starts with the program name, so it can be handed to an
/// exec-style call as the argument vector without further shuffling.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub args: Vec<String>,
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
    pub background: bool,
}

impl CommandSpec {
    /// Tokenize one input line.
    ///
    /// Returns `Ok(None)` for blank lines and comments (first word starting
    /// with `#`). Every word has each `$$` occurrence expanded to the shell's
    /// own process identifier before it is interpreted, so `echo $$` and
    /// `log.$$ < in.txt` both see the real pid.
    ///
    /// `&` requests a background run only as the very last word of the line;
    /// everywhere else it is an ordinary argument.
    pub fn parse(line: &str, shell_pid: ProcessId) -> Result<Option<Self>, Error> {
        let mut words = line.split_whitespace().peekable();

        let Some(first) = words.next() else {
            return Ok(None);
        };
        if first.starts_with('#') {
            return Ok(None);
        }

        let name = expand_pid(first, shell_pid);
        let mut spec = CommandSpec {
            args: vec![name.clone()],
            name,
            stdin: None,
            stdout: None,
            background: false,
        };

        while let Some(word) = words.next() {
            match word {
                "<" => match words.next() {
                    Some(file) => spec.stdin = Some(expand_pid(file, shell_pid).into()),
                    None => return Err(Error::RedirectWithoutTarget("<")),
                },
                ">" => match words.next() {
                    Some(file) => spec.stdout = Some(expand_pid(file, shell_pid).into()),
                    None => return Err(Error::RedirectWithoutTarget(">")),
                },
                "&" if words.peek().is_none() => spec.background = true,
                word => spec.push_arg(expand_pid(word, shell_pid))?,
            }
        }

        Ok(Some(spec))
    }

    fn push_arg(&mut self, arg: String) -> Result<(), Error> {
        if self.args.len() >= MAX_ARGS {
            return Err(Error::TooManyArguments(MAX_ARGS));
        }
        self.args.push(arg);
        Ok(())
    }
}

fn expand_pid(word: &str, shell_pid: ProcessId) -> String {
    if word.contains("$$") {
        word.replace("$$", &shell_pid.to_string())
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{CommandSpec, MAX_ARGS};
    use crate::common::Error;
    use crate::system::interface::ProcessId;

    const PID: ProcessId = ProcessId(4242);

    fn parse(line: &str) -> CommandSpec {
        CommandSpec::parse(line, PID).unwrap().unwrap()
    }

    #[test]
    fn plain_command() {
        let spec = parse("ls -la /tmp");
        assert_eq!(spec.name, "ls");
        assert_eq!(spec.args, ["ls", "-la", "/tmp"]);
        assert_eq!(spec.stdin, None);
        assert_eq!(spec.stdout, None);
        assert!(!spec.background);
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        assert_eq!(CommandSpec::parse("", PID).unwrap(), None);
        assert_eq!(CommandSpec::parse("   \n", PID).unwrap(), None);
        assert_eq!(CommandSpec::parse("# just a note", PID).unwrap(), None);
        assert_eq!(CommandSpec::parse("#comment", PID).unwrap(), None);
    }

    #[test]
    fn pid_placeholder_is_expanded() {
        let spec = parse("echo $$ pre$$post $$$");
        assert_eq!(spec.args, ["echo", "4242", "pre4242post", "4242$"]);

        let spec = parse("log$$ > out.$$");
        assert_eq!(spec.name, "log4242");
        assert_eq!(spec.stdout, Some("out.4242".into()));
    }

    #[test]
    fn redirections() {
        let spec = parse("sort < in.txt > out.txt");
        assert_eq!(spec.args, ["sort"]);
        assert_eq!(spec.stdin, Some("in.txt".into()));
        assert_eq!(spec.stdout, Some("out.txt".into()));

        // last redirection wins
        let spec = parse("cat > a.txt > b.txt");
        assert_eq!(spec.stdout, Some("b.txt".into()));
    }

    #[test]
    fn dangling_redirection_is_an_error() {
        assert!(matches!(
            CommandSpec::parse("cat <", PID),
            Err(Error::RedirectWithoutTarget("<"))
        ));
        assert!(matches!(
            CommandSpec::parse("cat >", PID),
            Err(Error::RedirectWithoutTarget(">"))
        ));
    }

    #[test]
    fn ampersand_only_backgrounds_as_last_word() {
        let spec = parse("sleep 5 &");
        assert!(spec.background);
        assert_eq!(spec.args, ["sleep", "5"]);

        let spec = parse("echo a & b");
        assert!(!spec.background);
        assert_eq!(spec.args, ["echo", "a", "&", "b"]);

        let spec = parse("echo & &");
        assert!(spec.background);
        assert_eq!(spec.args, ["echo", "&"]);
    }

    #[test]
    fn argument_cap_is_enforced() {
        let line = format!("prog {}", "x ".repeat(MAX_ARGS));
        assert!(matches!(
            CommandSpec::parse(&line, PID),
            Err(Error::TooManyArguments(MAX_ARGS))
        ));

        // exactly at the cap is still fine
        let line = format!("prog {}", "x ".repeat(MAX_ARGS - 1));
        let spec = CommandSpec::parse(&line, PID).unwrap().unwrap();
        assert_eq!(spec.args.len(), MAX_ARGS);
    }
}
