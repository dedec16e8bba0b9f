//! Markdown to styled terminal lines.
//!
//! Answers and intel items arrive as markdown. Only the constructs the
//! backend actually emits get special treatment: emphasis, headings, lists,
//! inline code, code blocks and rules. Everything else flows through as
//! plain text.

use pulldown_cmark::{Event as MdEvent, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

#[derive(Debug, Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    base: Style,
}

impl LineBuilder {
    fn push(&mut self, text: impl Into<String>, style: Style) {
        self.current
            .push(Span::styled(text.into(), self.base.patch(style)));
    }

    fn finish_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn finish_pending(&mut self) {
        if !self.current.is_empty() {
            self.finish_line();
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }
}

/// Render `raw` markdown into lines, each span styled with `base` underneath.
pub fn markdown_lines(raw: &str, base: Style) -> Vec<Line<'static>> {
    let parser = Parser::new_ext(raw, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    let mut out = LineBuilder {
        base,
        ..LineBuilder::default()
    };
    // `Some(n)` for ordered lists holds the next number.
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut bold = 0usize;
    let mut italic = 0usize;
    let mut heading = false;
    let mut in_code_block = false;

    for event in parser {
        match event {
            MdEvent::Start(tag) => match tag {
                Tag::Strong => bold += 1,
                Tag::Emphasis => italic += 1,
                Tag::Heading { .. } => {
                    out.finish_pending();
                    heading = true;
                }
                Tag::List(start) => {
                    out.finish_pending();
                    lists.push(start);
                }
                Tag::Item => {
                    out.finish_pending();
                    let indent = "  ".repeat(lists.len().saturating_sub(1));
                    let bullet = match lists.last_mut() {
                        Some(Some(n)) => {
                            let label = format!("{indent}{n}. ");
                            *n += 1;
                            label
                        }
                        _ => format!("{indent}• "),
                    };
                    out.push(bullet, Style::default().fg(Color::DarkGray));
                }
                Tag::CodeBlock(_) => {
                    out.finish_pending();
                    in_code_block = true;
                }
                _ => {}
            },
            MdEvent::End(tag) => match tag {
                TagEnd::Strong => bold = bold.saturating_sub(1),
                TagEnd::Emphasis => italic = italic.saturating_sub(1),
                TagEnd::Heading(_) => {
                    heading = false;
                    out.finish_line();
                    out.blank();
                }
                TagEnd::Paragraph => {
                    out.finish_line();
                    if lists.is_empty() {
                        out.blank();
                    }
                }
                TagEnd::Item => out.finish_pending(),
                TagEnd::List(_) => {
                    lists.pop();
                    if lists.is_empty() {
                        out.blank();
                    }
                }
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    out.finish_pending();
                    out.blank();
                }
                TagEnd::TableCell => out.push(" │ ", Style::default().fg(Color::DarkGray)),
                TagEnd::TableRow | TagEnd::TableHead => out.finish_line(),
                _ => {}
            },
            MdEvent::Text(text) => {
                if in_code_block {
                    let style = Style::default().fg(Color::Yellow);
                    let mut parts = text.split('\n').peekable();
                    while let Some(part) = parts.next() {
                        if !part.is_empty() {
                            out.push(format!("  {part}"), style);
                        }
                        if parts.peek().is_some() {
                            out.finish_line();
                        }
                    }
                    continue;
                }
                let mut style = Style::default();
                if bold > 0 || heading {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if italic > 0 {
                    style = style.add_modifier(Modifier::ITALIC);
                }
                if heading {
                    style = style.fg(Color::Cyan);
                }
                out.push(text.to_string(), style);
            }
            MdEvent::Code(text) => out.push(text.to_string(), Style::default().fg(Color::Yellow)),
            MdEvent::SoftBreak => out.push(" ", Style::default()),
            MdEvent::HardBreak => out.finish_line(),
            MdEvent::Rule => {
                out.finish_pending();
                out.push("────────", Style::default().fg(Color::DarkGray));
                out.finish_line();
            }
            _ => {}
        }
    }
    out.finish_pending();
    while out.lines.last().is_some_and(|l| l.width() == 0) {
        out.lines.pop();
    }
    out.lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn paragraphs_are_separated_by_one_blank_line() {
        let lines = markdown_lines("first\nline\n\nsecond", Style::default());
        assert_eq!(plain(&lines), ["first line", "", "second"]);
    }

    #[test]
    fn lists_get_bullets_and_numbers() {
        let raw = indoc! {"
            - alpha
            - beta

            3. three
            4. four
        "};
        let lines = markdown_lines(raw, Style::default());
        assert_eq!(plain(&lines), ["• alpha", "• beta", "", "3. three", "4. four"]);
    }

    #[test]
    fn emphasis_and_code_are_styled() {
        let lines = markdown_lines("**up** 3% on `AAPL`", Style::default());
        let spans = &lines[0].spans;
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans.last().unwrap().style.fg, Some(Color::Yellow));
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let raw = indoc! {"
            ```
            let a = 1;
            let b = 2;
            ```
        "};
        let lines = markdown_lines(raw, Style::default());
        assert_eq!(plain(&lines), ["  let a = 1;", "  let b = 2;"]);
    }

    #[test]
    fn headings_are_bold() {
        let lines = markdown_lines("## Summary\nbody", Style::default());
        assert_eq!(plain(&lines)[0], "Summary");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }
}
