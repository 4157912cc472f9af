use inksac::prelude::*;

use crate::core::commands::Builtin;

#[derive(Debug, Clone, Copy)]
pub struct SyntaxHighlighter {
    color_support: ColorSupport,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self {
            color_support: support,
        }
    }

    pub fn plain() -> Self {
        Self {
            color_support: ColorSupport::NoColor,
        }
    }

    fn enabled(&self) -> bool {
        !matches!(self.color_support, ColorSupport::NoColor)
    }

    /// Colours the command word and redirect operators. Whitespace is kept
    /// as typed so the cursor stays aligned.
    pub fn highlight_command(&self, input: &str) -> String {
        if !self.enabled() {
            return input.to_string();
        }

        let mut highlighted = String::with_capacity(input.len());
        let mut seen_command = false;
        for (is_word, chunk) in chunks(input) {
            if !is_word {
                highlighted.push_str(chunk);
            } else if !seen_command {
                seen_command = true;
                let colour = if Builtin::is_builtin_name(chunk) {
                    Color::Magenta
                } else {
                    Color::Cyan
                };
                let command_style = Style::builder().foreground(colour).bold().build();
                highlighted.push_str(&chunk.style(command_style).to_string());
            } else if chunk == ">" || chunk == ">>" {
                let redirect_style = Style::builder().foreground(Color::Yellow).build();
                highlighted.push_str(&chunk.style(redirect_style).to_string());
            } else {
                highlighted.push_str(chunk);
            }
        }
        highlighted
    }

    pub fn highlight_error(&self, error: &str) -> String {
        if !self.enabled() {
            return error.to_string();
        }

        let error_style = Style::builder().foreground(Color::Red).bold().build();
        error.style(error_style).to_string()
    }

    pub fn highlight_success(&self, message: &str) -> String {
        if !self.enabled() {
            return message.to_string();
        }

        let success_style = Style::builder().foreground(Color::Green).build();
        message.style(success_style).to_string()
    }

    pub fn highlight_hint(&self, hint: &str) -> String {
        if !self.enabled() {
            return hint.to_string();
        }

        let hint_style = Style::builder()
            .foreground(Color::RGB(128, 128, 128))
            .build();
        hint.style(hint_style).to_string()
    }
}

/// Splits into alternating runs of whitespace and non-whitespace.
fn chunks(input: &str) -> Vec<(bool, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_word = None;
    for (i, c) in input.char_indices() {
        let is_word = !c.is_whitespace();
        match in_word {
            Some(current) if current != is_word => {
                out.push((current, &input[start..i]));
                start = i;
            }
            _ => {}
        }
        in_word = Some(is_word);
    }
    if let Some(current) = in_word {
        out.push((current, &input[start..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_keep_whitespace() {
        assert_eq!(
            chunks("ls  -l >out"),
            vec![(true, "ls"), (false, "  "), (true, "-l"), (false, " "), (true, ">out")]
        );
        assert_eq!(chunks(" a"), vec![(false, " "), (true, "a")]);
        assert!(chunks("").is_empty());
    }

    #[test]
    fn test_plain_highlighter_is_identity() {
        let highlighter = SyntaxHighlighter::plain();
        assert_eq!(highlighter.highlight_command("echo  a > b"), "echo  a > b");
        assert_eq!(highlighter.highlight_error("boom"), "boom");
        assert_eq!(highlighter.highlight_success("ok"), "ok");
    }
}
