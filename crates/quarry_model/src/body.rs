//! Indented method body text.

const INDENT: &str = "    ";

/// Accumulates method body lines with an indentation level.
///
/// Lines are relative to the method body; [`OutputUnit`](crate::OutputUnit)
/// indents the whole body when rendering.
#[derive(Debug, Default)]
pub struct BodyBuilder {
    lines: Vec<String>,
    level: usize,
}

impl BodyBuilder {
    /// An empty body at level zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line at the current level.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{text}", INDENT.repeat(self.level)));
        }
        self
    }

    /// Appends `text` and increases the level, for `{` lines.
    pub fn open(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.line(text);
        self.level += 1;
        self
    }

    /// Decreases the level and appends `text`, for `}` lines.
    pub fn close(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self.line(text)
    }

    /// Closes one block and opens the next, for `} else {` lines.
    pub fn middle(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self.open(text)
    }

    /// The body text, lines joined with `\n`.
    pub fn build(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nests_blocks() {
        let mut body = BodyBuilder::new();
        body.line("Client client = esClient();")
            .open("try {")
            .line("return builder.execute();")
            .middle("} catch (Exception e) {")
            .line("e.printStackTrace();")
            .close("}")
            .line("return null;");
        assert_eq!(
            body.build(),
            "Client client = esClient();\n\
             try {\n    return builder.execute();\n\
             } catch (Exception e) {\n    e.printStackTrace();\n}\n\
             return null;"
        );
    }

    #[test]
    fn close_never_underflows() {
        let mut body = BodyBuilder::new();
        body.close("}");
        assert_eq!(body.build(), "}");
    }
}
