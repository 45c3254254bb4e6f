//! Stock cell renderers.
//!
//! Each renderer expects a particular [`CellValue`] variant and falls back to
//! the value's display text for anything else.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::grid::{CellContext, CellRenderer};
use crate::table::{CellValue, DownloadLink};

pub const DEFAULT_DATE_FORMAT: &str = "%b %d, %Y at %I:%M %p";

fn fallback(ctx: &CellContext<'_>) -> Text<'static> {
    Text::from(ctx.value.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoldText;

impl CellRenderer for BoldText {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        fallback(ctx).style(Style::default().add_modifier(Modifier::BOLD))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl CellRenderer for PlainText {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        fallback(ctx)
    }
}

/// Check mark for `true`, cross for `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolIcon;

impl CellRenderer for BoolIcon {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        match ctx.value {
            CellValue::Bool(true) => Text::from(Span::styled("✓", Style::default().fg(Color::Green))),
            CellValue::Bool(false) => Text::from(Span::styled("✗", Style::default().fg(Color::Red))),
            _ => fallback(ctx),
        }
    }
}

/// Dollar amounts with thousands separators and two decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Currency;

pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

impl CellRenderer for Currency {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        match ctx.value {
            CellValue::Number(n) if n.is_finite() => Text::from(format_currency(*n)),
            _ => fallback(ctx),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateRenderer {
    format: String,
}

impl DateRenderer {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for DateRenderer {
    fn default() -> Self {
        DateRenderer::new(DEFAULT_DATE_FORMAT)
    }
}

impl CellRenderer for DateRenderer {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        match ctx.value {
            CellValue::Timestamp(ts) => Text::from(ts.format(&self.format).to_string()),
            _ => fallback(ctx),
        }
    }
}

/// Terminals cannot show the picture, so the cell shows where it lives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRenderer;

impl CellRenderer for ImageRenderer {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        match ctx.value {
            CellValue::Image(url) | CellValue::Text(url) if !url.is_empty() => {
                Text::from(Line::from(vec![
                    Span::styled("▣ ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        url.clone(),
                        Style::default().add_modifier(Modifier::UNDERLINED),
                    ),
                ]))
            }
            _ => fallback(ctx),
        }
    }
}

pub fn server_color(server: &str) -> Color {
    match server {
        "MEGA" => Color::Rgb(0xfe, 0x1b, 0x19),
        "1Fichier" => Color::Rgb(0xfe, 0xb0, 0x1f),
        "Zippyshare" => Color::Rgb(0xca, 0x46, 0x00),
        "Stape" => Color::Rgb(0x21, 0x32, 0x8c),
        _ => Color::Rgb(0xf0, 0x18, 0x79),
    }
}

/// One bold, server colored line per download link.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkList;

impl LinkList {
    fn line(link: &DownloadLink) -> Line<'static> {
        Line::from(Span::styled(
            link.server.clone(),
            Style::default()
                .fg(server_color(&link.server))
                .add_modifier(Modifier::BOLD),
        ))
    }
}

impl CellRenderer for LinkList {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        match ctx.value {
            CellValue::Links(links) if !links.is_empty() => {
                Text::from(links.iter().map(LinkList::line).collect::<Vec<_>>())
            }
            CellValue::Links(_) => Text::from(Span::styled(
                "no links",
                Style::default().add_modifier(Modifier::DIM),
            )),
            _ => fallback(ctx),
        }
    }
}

/// The value shown as a button label.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionButton;

impl ActionButton {
    pub const BACKGROUND: Color = Color::Rgb(0x33, 0x40, 0x53);
}

impl CellRenderer for ActionButton {
    fn render(&self, ctx: &CellContext<'_>) -> Text<'static> {
        if ctx.value.is_null() {
            return fallback(ctx);
        }
        Text::from(Span::styled(
            format!(" {} ", ctx.value),
            Style::default()
                .bg(Self::BACKGROUND)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RowId;
    use chrono::NaiveDate;

    fn render(renderer: &dyn CellRenderer, value: &CellValue) -> Text<'static> {
        renderer.render(&CellContext {
            row_id: RowId(0),
            column_index: 0,
            column_name: "c",
            view_position: 0,
            value,
        })
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(0.5), "$0.50");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(-42.0), "-$42.00");
        assert_eq!(render(&Currency, &CellValue::from("n/a")).to_string(), "n/a");
    }

    #[test]
    fn bool_icons_are_colored() {
        let yes = render(&BoolIcon, &CellValue::Bool(true));
        assert_eq!(yes.to_string(), "✓");
        assert_eq!(yes.lines[0].spans[0].style.fg, Some(Color::Green));
        let no = render(&BoolIcon, &CellValue::Bool(false));
        assert_eq!(no.lines[0].spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn dates_use_the_long_format() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(15, 4, 0)
            .unwrap();
        let text = render(&DateRenderer::default(), &CellValue::Timestamp(ts));
        assert_eq!(text.to_string(), "Mar 09, 2024 at 03:04 PM");
        let custom = render(&DateRenderer::new("%Y"), &CellValue::Timestamp(ts));
        assert_eq!(custom.to_string(), "2024");
    }

    #[test]
    fn links_render_one_line_per_server() {
        let value = CellValue::Links(vec![
            DownloadLink::new("MEGA", "https://mega.nz/x"),
            DownloadLink::new("Other", "https://example.org/y"),
        ]);
        let text = render(&LinkList, &value);
        assert_eq!(text.height(), 2);
        assert_eq!(text.lines[0].to_string(), "MEGA");
        assert_eq!(
            text.lines[0].spans[0].style.fg,
            Some(Color::Rgb(0xfe, 0x1b, 0x19))
        );
        assert_eq!(
            text.lines[1].spans[0].style.fg,
            Some(Color::Rgb(0xf0, 0x18, 0x79))
        );
        assert_eq!(render(&LinkList, &CellValue::Links(vec![])).to_string(), "no links");
    }

    #[test]
    fn button_and_bold_text_styles() {
        let button = render(&ActionButton, &CellValue::from("42"));
        assert_eq!(button.to_string(), " 42 ");
        assert_eq!(
            button.lines[0].spans[0].style.bg,
            Some(ActionButton::BACKGROUND)
        );
        let bold = render(&BoldText, &CellValue::from("Naruto"));
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(render(&PlainText, &CellValue::Null).to_string(), "∅");
    }

    #[test]
    fn image_shows_the_url() {
        let text = render(&ImageRenderer, &CellValue::Image("https://x/p.jpg".to_string()));
        assert_eq!(text.to_string(), "▣ https://x/p.jpg");
        assert_eq!(render(&ImageRenderer, &CellValue::Null).to_string(), "∅");
    }
}
