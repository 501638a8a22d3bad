//! paints a widget tree into a grid of character cells.

use crate::{
    dashboard::Theme,
    widget::{Axis, Kind, Node, Widget, WidgetTree},
};

/// a rectangle of cells.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// one character cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cell {
    pub ch: char,
    /// `None` uses the terminal's default color.
    pub color: Option<Theme>,
}

/// a grid of cells, painted before being written out in one go.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Canvas {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

/// draws one widget.
pub struct Meter<'a> {
    pub widget: &'a Widget,
    pub area: Rect,
}

const BLANK: Cell = Cell {
    ch: ' ',
    color: None,
};

/// partial blocks, in eighths.
const BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const FULL: char = '█';

/// paints `tree` over the whole canvas.
pub fn paint(tree: &WidgetTree, canvas: &mut Canvas) {
    let area = canvas.area();
    canvas.fill(BLANK);
    paint_node(tree, tree.root(), area, canvas);
}

fn paint_node(tree: &WidgetTree, node: &Node, area: Rect, canvas: &mut Canvas) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    match node {
        Node::Split { axis, children } => {
            for (child, area) in children.iter().zip(area.split(*axis, children.len())) {
                paint_node(tree, child, area, canvas);
            }
        }
        Node::Panel { slot, child } => {
            let inner = match tree.widget(*slot) {
                Some(widget) => Meter { widget, area }.draw(canvas),
                None => area,
            };
            paint_node(tree, child, inner, canvas);
        }
        Node::Leaf(slot) => {
            if let Some(widget) = tree.widget(*slot) {
                Meter { widget, area }.draw(canvas);
            }
        }
    }
}

// === impl Rect ===

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// divides the rectangle into `n` nearly equal parts along `axis`.
    pub fn split(self, axis: Axis, n: usize) -> Vec<Rect> {
        let Self {
            x,
            y,
            width,
            height,
        } = self;

        let extent = match axis {
            Axis::Horizontal => width,
            Axis::Vertical => height,
        } as usize;
        let edge = |i: usize| (extent * i / n.max(1)) as u16;

        (0..n)
            .map(|i| {
                let (start, end) = (edge(i), edge(i + 1));
                match axis {
                    Axis::Horizontal => Rect::new(x + start, y, end - start, height),
                    Axis::Vertical => Rect::new(x, y + start, width, end - start),
                }
            })
            .collect()
    }

    /// the rectangle less a one cell border.
    fn inner(self) -> Rect {
        Rect {
            x: self.x + 1,
            y: self.y + 1,
            width: self.width.saturating_sub(2),
            height: self.height.saturating_sub(2),
        }
    }

    fn right(self) -> u16 {
        self.x + self.width - 1
    }

    fn bottom(self) -> u16 {
        self.y + self.height - 1
    }
}

// === impl Canvas ===

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![BLANK; width as usize * height as usize],
        }
    }

    pub fn area(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// the cells of row `y`, left to right.
    pub fn row(&self, y: u16) -> &[Cell] {
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// the characters of row `y`.
    pub fn line(&self, y: u16) -> String {
        self.row(y).iter().map(|cell| cell.ch).collect()
    }

    /// sets a cell, ignoring positions outside the canvas.
    pub fn put(&mut self, x: u16, y: u16, ch: char, color: Option<Theme>) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.cells[i] = Cell { ch, color };
    }

    /// writes `text` from `(x, y)`, cut off after `max` characters.
    pub fn text(&mut self, x: u16, y: u16, max: u16, text: &str, color: Option<Theme>) {
        for (i, ch) in text.chars().take(max as usize).enumerate() {
            self.put(x + i as u16, y, ch, color);
        }
    }

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }
}

// === impl Meter ===

impl Meter<'_> {
    /// draws the widget, returning the area left inside it.
    pub fn draw(&self, canvas: &mut Canvas) -> Rect {
        let Self { widget, area } = self;

        match widget.kind() {
            Kind::Gauge => self.gauge(canvas),
            Kind::Column => self.column(canvas),
            Kind::Chart => self.chart(canvas),
            Kind::Panel => return self.panel(canvas),
        }

        log::trace!("drew {:?} at {area:?}", widget.kind());
        Rect::default()
    }

    /// a horizontal bar below its title.
    fn gauge(&self, canvas: &mut Canvas) {
        let Self { widget, area } = self;
        let color = Some(widget.color());

        let bar = if area.height >= 2 {
            canvas.text(area.x, area.y, area.width, widget.title(), None);
            Rect::new(area.x, area.y + 1, area.width, area.height - 1)
        } else {
            *area
        };

        let filled = scale(widget.value(), bar.width);
        for y in bar.y..bar.y + bar.height {
            for x in bar.x..bar.x + filled {
                canvas.put(x, y, FULL, color);
            }
        }

        if area.height < 2 {
            canvas.text(area.x, area.y, area.width, widget.title(), None);
        }
    }

    /// a vertical bar above its title.
    fn column(&self, canvas: &mut Canvas) {
        let Self { widget, area } = self;
        let color = Some(widget.color());

        canvas.text(area.x, area.bottom(), area.width, widget.title(), None);
        let rows = area.height - 1;
        let width = area.width.saturating_sub(1).max(1);
        let eighths = scale(widget.value(), rows * 8);
        for (row, y) in (area.y..area.bottom()).rev().enumerate() {
            let ch = block(eighths, row as u16);
            for x in area.x..area.x + width {
                canvas.put(x, y, ch, color);
            }
        }
    }

    /// the most recent points, newest on the right, below the title.
    fn chart(&self, canvas: &mut Canvas) {
        let Self { widget, area } = self;
        let color = Some(widget.color());

        canvas.text(area.x, area.y, area.width, widget.title(), None);
        let rows = area.height - 1;

        let points = widget.points();
        let shown = points.len().min(area.width as usize);
        let start = area.x + area.width - shown as u16;
        for (i, point) in points.iter().skip(points.len() - shown).enumerate() {
            let eighths = scale(*point, rows * 8);
            let x = start + i as u16;
            for (row, y) in (area.y + 1..area.y + area.height).rev().enumerate() {
                canvas.put(x, y, block(eighths, row as u16), color);
            }
        }
    }

    /// a border with the title set into its top edge.
    fn panel(&self, canvas: &mut Canvas) -> Rect {
        let Self { widget, area } = self;
        let color = Some(widget.color());

        if area.width < 2 || area.height < 2 {
            return Rect::default();
        }

        for x in area.x + 1..area.right() {
            canvas.put(x, area.y, '─', color);
            canvas.put(x, area.bottom(), '─', color);
        }
        for y in area.y + 1..area.bottom() {
            canvas.put(area.x, y, '│', color);
            canvas.put(area.right(), y, '│', color);
        }
        canvas.put(area.x, area.y, '┌', color);
        canvas.put(area.right(), area.y, '┐', color);
        canvas.put(area.x, area.bottom(), '└', color);
        canvas.put(area.right(), area.bottom(), '┘', color);

        let title = widget.title();
        if !title.is_empty() && area.width > 4 {
            let title = format!(" {title} ");
            canvas.text(area.x + 1, area.y, area.width - 2, &title, color);
        }

        area.inner()
    }
}

/// `percent` of `extent`, rounded.
fn scale(percent: u8, extent: u16) -> u16 {
    let percent = percent.min(100) as u32;
    ((extent as u32 * percent + 50) / 100) as u16
}

/// the block for the `row`-th cell from the bottom of a bar `eighths` tall.
fn block(eighths: u16, row: u16) -> char {
    let below = row * 8;
    let fill = eighths.saturating_sub(below).min(8);
    BLOCKS[fill as usize]
}
