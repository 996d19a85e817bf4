//! # Command Matching
//!
//! Detects commands addressed to the bot account inside comment bodies.
//! The pattern is a literal `@<account>` immediately followed by optional
//! whitespace and `!<token>`.

use regex::Regex;

/// A recognized command token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Welcome the root author of the thread.
    Welcome,
}

/// Matcher for addressed commands.
///
/// Compiled once per processor; the matched token is dispatched so that
/// additional commands can be added without touching the pattern.
pub struct CommandMatcher {
    mention: String,
    pattern: Regex,
}

impl CommandMatcher {
    /// Build a matcher for the given account name.
    pub fn new(account: &str) -> Self {
        let pattern = Regex::new(&format!(r"@{}\s?!(\w+)", regex::escape(account)))
            .expect("command pattern compiles for any escaped account");
        Self {
            mention: format!("@{account}"),
            pattern,
        }
    }

    /// Cheap pre-filter: does the body mention the account at all?
    pub fn mentions(&self, body: &str) -> bool {
        body.contains(&self.mention)
    }

    /// Extract a recognized command from a body, if any.
    pub fn parse(&self, body: &str) -> Option<Command> {
        let captures = self.pattern.captures(body)?;
        match &captures[1] {
            "welcome" => Some(Command::Welcome),
            _ => None,
        }
    }
}
