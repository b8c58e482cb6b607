use colored::{Color, ColoredString, Colorize};

/// Presentation configuration handed to the session at construction.
/// One instance, owned by the session; nothing global.
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,
    pub good: Color,
    pub warning: Color,
    pub danger: Color,
    pub dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            good: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            dim: Color::BrightBlack,
        }
    }
}

impl Theme {
    pub fn accent(&self, text: &str) -> ColoredString {
        text.color(self.accent)
    }

    pub fn good(&self, text: &str) -> ColoredString {
        text.color(self.good)
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        text.color(self.warning)
    }

    pub fn danger(&self, text: &str) -> ColoredString {
        text.color(self.danger)
    }

    pub fn dim(&self, text: &str) -> ColoredString {
        text.color(self.dim)
    }

    pub fn ok(&self, msg: &str) {
        println!("\n  {}  {msg}\n", self.good("✓"));
    }

    pub fn err(&self, msg: &str) {
        println!("\n  {}  {msg}\n", self.danger("✗"));
    }

    pub fn warn(&self, msg: &str) {
        println!("\n  {}  {msg}\n", self.warning("!"));
    }

    pub fn rule(&self) {
        println!("{}", self.dim(&"─".repeat(64)));
    }
}
