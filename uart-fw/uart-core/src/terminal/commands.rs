//! Command table
//!
//! Commands are plain function pointers in a static table. Lookup is an exact,
//! case-sensitive match on the name; the first matching entry wins.

use core::fmt::{self, Write};

/// Longest accepted command name, in bytes
pub const MAX_NAME_LEN: usize = 7;

/// Command handler: receives the argument string and writes its output
pub type Handler = fn(args: &mut str, out: &mut dyn Write) -> Result<(), CommandError>;

/// Error reported by a command handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Writing the command output failed
    Output,
    /// The arguments were rejected
    InvalidArguments,
}

impl From<fmt::Error> for CommandError {
    fn from(_: fmt::Error) -> Self {
        CommandError::Output
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Output => write!(f, "output failed"),
            CommandError::InvalidArguments => write!(f, "invalid arguments"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

/// A named terminal command
#[derive(Clone, Copy)]
pub struct Command {
    name: &'static str,
    handler: Handler,
}

impl Command {
    /// Panics (at compile time in a `const`/`static`) when `name` is empty or
    /// longer than [`MAX_NAME_LEN`].
    pub const fn new(name: &'static str, handler: Handler) -> Self {
        assert!(
            !name.is_empty() && name.len() <= MAX_NAME_LEN,
            "command names are 1 to 7 bytes"
        );
        Self { name, handler }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run(&self, args: &mut str, out: &mut dyn Write) -> Result<(), CommandError> {
        (self.handler)(args, out)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Built-in command table
pub static COMMANDS: [Command; 1] = [Command::new("echo", echo)];

/// Print the arguments back followed by a line break
pub fn echo(args: &mut str, out: &mut dyn Write) -> Result<(), CommandError> {
    out.write_str(args)?;
    out.write_str("\n\r")?;
    Ok(())
}

/// Name lookup over a command table
pub trait CommandLookup {
    fn find(&self, name: &str) -> Option<&Command>;
}

impl CommandLookup for [Command] {
    fn find(&self, name: &str) -> Option<&Command> {
        self.iter().find(|command| command.name == name)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::string::String;

    fn shout(args: &mut str, out: &mut dyn Write) -> Result<(), CommandError> {
        if args.is_empty() {
            return Err(CommandError::InvalidArguments);
        }
        args.make_ascii_uppercase();
        out.write_str(args)?;
        Ok(())
    }

    fn quiet(_args: &mut str, _out: &mut dyn Write) -> Result<(), CommandError> {
        Ok(())
    }

    static TABLE: [Command; 3] = [
        Command::new("shout", shout),
        Command::new("echo", echo),
        Command::new("shout", quiet),
    ];

    #[test]
    fn test_echo_appends_line_break() {
        let mut out = String::new();
        let mut args = String::from("hello world");
        echo(&mut args, &mut out).unwrap();
        assert_eq!(out, "hello world\n\r");
    }

    #[test]
    fn test_builtin_table_has_echo() {
        assert_eq!(COMMANDS.find("echo").map(Command::name), Some("echo"));
    }

    #[test]
    fn test_lookup_is_exact_and_case_sensitive() {
        assert!(TABLE.find("ECHO").is_none());
        assert!(TABLE.find("ech").is_none());
        assert!(TABLE.find("echoo").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut out = String::new();
        let mut args = String::from("hi");
        TABLE.find("shout").unwrap().run(&mut args, &mut out).unwrap();
        assert_eq!(out, "HI");
    }

    #[test]
    fn test_handler_error_is_returned() {
        let mut out = String::new();
        let mut args = String::new();
        let result = TABLE.find("shout").unwrap().run(&mut args, &mut out);
        assert_eq!(result, Err(CommandError::InvalidArguments));
    }
}
