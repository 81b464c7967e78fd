use std::io::{BufRead, Write};

use reckon_core::recat::{Decision, Resolver, UnmatchedGroup};

/// Terminal-driven resolver: asks for a topcat, seccat and optional pattern
/// per unmatched group. A blank topcat skips the group; a blank pattern pins
/// the records as overridden instead of teaching the ruleset.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl PromptResolver<std::io::BufReader<std::io::Stdin>, std::io::Stdout> {
    pub fn stdio() -> Self {
        PromptResolver {
            input: std::io::BufReader::new(std::io::stdin()),
            output: std::io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptResolver { input, output }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        write!(self.output, "{question}: ").ok()?;
        self.output.flush().ok()?;
        let mut line = String::new();
        self.input.read_line(&mut line).ok()?;
        let line = line.trim();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }
}

impl<R: BufRead, W: Write> Resolver for PromptResolver<R, W> {
    fn resolve(&mut self, group: &UnmatchedGroup) -> Option<Decision> {
        let _ = writeln!(
            self.output,
            "\nunmatched: {} ({} record{})",
            group.source,
            group.count,
            if group.count == 1 { "" } else { "s" }
        );

        let topcat = self.ask("topcat (blank to skip)")?;
        let seccat = self.ask("seccat")?;
        let pattern = self.ask("pattern to learn (blank to pin as override)");

        Some(Decision { topcat, seccat, pattern })
    }
}
