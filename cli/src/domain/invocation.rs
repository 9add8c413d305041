//! Operator request parsing: `<verb> [args...] [to|for|from|on|in <environment>]`.

/// Words that introduce the target environment.
pub const CONNECTORS: &[&str] = &["to", "for", "from", "on", "in"];

/// A parsed operator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub verb: String,
    /// Positional arguments between the verb and the connector word.
    pub args: Vec<String>,
    pub environment: Option<String>,
    /// `-h` / `--help` appeared after the verb.
    pub help: bool,
}

impl Invocation {
    /// Parse the tokens following the program's own flags.
    ///
    /// The token after the last connector word is the environment, so a
    /// branch literally named `to` still parses (`branch to to staging`).
    /// Returns `None` when there is no verb.
    #[must_use]
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        let (verb, rest) = tokens.split_first()?;
        let mut help = false;
        let rest: Vec<&str> = rest
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| {
                let is_help = matches!(*t, "-h" | "--help");
                help |= is_help;
                !is_help
            })
            .collect();

        let connector = rest.iter().rposition(|t| CONNECTORS.contains(t));
        let (args, environment) = match connector {
            Some(idx) if idx + 1 < rest.len() => {
                let mut args: Vec<String> = rest[..idx].iter().map(ToString::to_string).collect();
                args.extend(rest[idx + 2..].iter().map(ToString::to_string));
                (args, Some(rest[idx + 1].to_string()))
            }
            Some(idx) => (rest[..idx].iter().map(ToString::to_string).collect(), None),
            None => (rest.iter().map(ToString::to_string).collect(), None),
        };

        Some(Self {
            verb: verb.as_ref().to_string(),
            args,
            environment,
            help,
        })
    }

    /// `n`-th positional argument.
    #[must_use]
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.args.get(n).map(String::as_str)
    }
}
