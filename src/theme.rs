use derive_setters::Setters;
use ratatui::style::{Color, Modifier};

use crate::grid::CellContext;
use crate::table::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Border {
    #[default]
    None,
    /// A rule under the region.
    Bottom(Color),
    /// A bar on the left edge plus a rule under the region.
    All(Color),
}

impl Border {
    pub fn color(&self) -> Option<Color> {
        match self {
            Border::None => None,
            Border::Bottom(c) | Border::All(c) => Some(*c),
        }
    }

    /// Lines the border adds below the content.
    pub fn bottom_height(&self) -> u16 {
        match self {
            Border::None => 0,
            _ => 1,
        }
    }

    /// Columns the border takes on the left edge.
    pub fn left_width(&self) -> u16 {
        match self {
            Border::All(_) => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Background spans the whole track.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSizing {
    /// Padding and border are taken from the track width.
    BorderBox,
    /// The content gets the full track width; padding and border spill over.
    ContentBox,
}

/// Visual description of one grid region.
#[derive(Debug, Clone, PartialEq, Default, Setters)]
#[setters(strip_option)]
pub struct Style {
    pub background: Option<Color>,
    pub foreground: Option<Color>,
    pub modifiers: Modifier,
    pub cursor: Cursor,
    pub padding: u16,
    pub border: Border,
    pub width: Option<Width>,
    pub box_sizing: Option<BoxSizing>,
    pub sticky: bool,
    pub column_span: Option<u16>,
}

impl Style {
    pub fn to_ratatui(&self) -> ratatui::style::Style {
        let mut style = ratatui::style::Style::default().add_modifier(self.modifiers);
        if let Some(bg) = self.background {
            style = style.bg(bg);
        }
        if let Some(fg) = self.foreground {
            style = style.fg(fg);
        }
        style
    }

    pub fn border_style(&self) -> ratatui::style::Style {
        let mut style = self.to_ratatui().remove_modifier(Modifier::all());
        if let Some(color) = self.border.color() {
            style = style.fg(color);
        }
        style
    }

    pub fn is_bold(&self) -> bool {
        self.modifiers.contains(Modifier::BOLD)
    }
}

/// Styles for the regions of a grid.
pub trait GridTheme {
    fn header(&self, sortable: bool) -> Style;
    fn sort_icon(&self, current_column: &str, sort_column: Option<&str>) -> Style;
    fn cell(&self, ctx: &CellContext<'_>) -> Style;
    fn expander(&self, row_id: RowId) -> Style;
}

fn cursor_for(sortable: bool) -> Cursor {
    if sortable {
        Cursor::Pointer
    } else {
        Cursor::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightTheme {
    pub striped: bool,
}

impl LightTheme {
    const HEADER_BG: Color = Color::Rgb(0xff, 0xff, 0xff);
    const CELL_BG: Color = Color::Rgb(0xff, 0xff, 0xff);
    const CELL_BG_ALT: Color = Color::Rgb(0xf6, 0xf6, 0xf6);
    const COLOR: Color = Color::Rgb(0x00, 0x00, 0x00);
    const HEADER_BORDER: Color = Color::Rgb(0xb2, 0xb2, 0xb2);
    const CELL_BORDER: Color = Color::Rgb(0xd9, 0xd9, 0xd9);
    const ICON_STRONG: Color = Color::Rgb(0x33, 0x33, 0x33);
    const ICON_FAINT: Color = Color::Rgb(0x99, 0x99, 0x99);
    const PADDING: u16 = 1;

    pub fn new(striped: bool) -> Self {
        Self { striped }
    }
}

impl GridTheme for LightTheme {
    fn header(&self, sortable: bool) -> Style {
        Style::default()
            .background(Self::HEADER_BG)
            .foreground(Self::COLOR)
            .cursor(cursor_for(sortable))
            .modifiers(Modifier::BOLD)
            .padding(Self::PADDING)
            .border(Border::Bottom(Self::HEADER_BORDER))
    }

    fn sort_icon(&self, current_column: &str, sort_column: Option<&str>) -> Style {
        let color = if sort_column == Some(current_column) {
            Self::ICON_STRONG
        } else {
            Self::ICON_FAINT
        };
        Style::default().background(Self::HEADER_BG).foreground(color)
    }

    fn cell(&self, ctx: &CellContext<'_>) -> Style {
        let background = if self.striped && ctx.view_position % 2 == 1 {
            Self::CELL_BG_ALT
        } else {
            Self::CELL_BG
        };
        Style::default()
            .background(background)
            .foreground(Self::COLOR)
            .padding(Self::PADDING)
            .border(Border::Bottom(Self::CELL_BORDER))
    }

    fn expander(&self, _row_id: RowId) -> Style {
        Style::default()
            .background(Self::CELL_BG)
            .foreground(Self::COLOR)
            .padding(Self::PADDING)
            .border(Border::Bottom(Self::CELL_BORDER))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DarkTheme {
    pub striped: bool,
}

impl DarkTheme {
    const HEADER_BG: Color = Color::Rgb(0x28, 0x31, 0x3e);
    const CELL_BG: Color = Color::Rgb(0x14, 0x1d, 0x2c);
    const CELL_BG_ALT: Color = Color::Rgb(0x02, 0x06, 0x0c);
    const COLOR: Color = Color::Rgb(0xff, 0xff, 0xff);
    const BORDER: Color = Color::Rgb(0x3d, 0x44, 0x50);
    const ICON_STRONG: Color = Color::Rgb(0xcc, 0xcc, 0xcc);
    const ICON_FAINT: Color = Color::Rgb(0x66, 0x66, 0x66);
    const PADDING: u16 = 1;

    pub fn new(striped: bool) -> Self {
        Self { striped }
    }
}

impl GridTheme for DarkTheme {
    fn header(&self, sortable: bool) -> Style {
        Style::default()
            .background(Self::HEADER_BG)
            .foreground(Self::COLOR)
            .cursor(cursor_for(sortable))
            .padding(Self::PADDING)
            .border(Border::All(Self::BORDER))
    }

    fn sort_icon(&self, current_column: &str, sort_column: Option<&str>) -> Style {
        let color = if sort_column == Some(current_column) {
            Self::ICON_STRONG
        } else {
            Self::ICON_FAINT
        };
        Style::default().background(Self::HEADER_BG).foreground(color)
    }

    fn cell(&self, ctx: &CellContext<'_>) -> Style {
        let background = if self.striped && ctx.view_position % 2 == 1 {
            Self::CELL_BG_ALT
        } else {
            Self::CELL_BG
        };
        Style::default()
            .background(background)
            .foreground(Self::COLOR)
            .padding(Self::PADDING)
            .border(Border::All(Self::BORDER))
    }

    fn expander(&self, _row_id: RowId) -> Style {
        Style::default()
            .background(Self::CELL_BG)
            .foreground(Self::COLOR)
            .padding(Self::PADDING)
            .border(Border::All(Self::BORDER))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeKind {
    #[default]
    Light,
    Dark,
}

impl ThemeKind {
    pub fn toggled(self) -> Self {
        match self {
            ThemeKind::Light => ThemeKind::Dark,
            ThemeKind::Dark => ThemeKind::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeChoice {
    pub kind: ThemeKind,
    pub striped: bool,
}

impl Default for ThemeChoice {
    fn default() -> Self {
        Self {
            kind: ThemeKind::Light,
            striped: true,
        }
    }
}

impl ThemeChoice {
    pub fn resolve(&self) -> BuiltinTheme {
        match self.kind {
            ThemeKind::Light => BuiltinTheme::Light(LightTheme::new(self.striped)),
            ThemeKind::Dark => BuiltinTheme::Dark(DarkTheme::new(self.striped)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    Light(LightTheme),
    Dark(DarkTheme),
}

impl GridTheme for BuiltinTheme {
    fn header(&self, sortable: bool) -> Style {
        match self {
            BuiltinTheme::Light(t) => t.header(sortable),
            BuiltinTheme::Dark(t) => t.header(sortable),
        }
    }

    fn sort_icon(&self, current_column: &str, sort_column: Option<&str>) -> Style {
        match self {
            BuiltinTheme::Light(t) => t.sort_icon(current_column, sort_column),
            BuiltinTheme::Dark(t) => t.sort_icon(current_column, sort_column),
        }
    }

    fn cell(&self, ctx: &CellContext<'_>) -> Style {
        match self {
            BuiltinTheme::Light(t) => t.cell(ctx),
            BuiltinTheme::Dark(t) => t.cell(ctx),
        }
    }

    fn expander(&self, row_id: RowId) -> Style {
        match self {
            BuiltinTheme::Light(t) => t.expander(row_id),
            BuiltinTheme::Dark(t) => t.expander(row_id),
        }
    }
}
