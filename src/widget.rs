//! a declarative description of the dashboard's widgets.
//!
//! a [`WidgetTree`] pairs a layout of [`Node`]s with the [`Widget`]s they refer to. the tree is
//! built in one pass by a [`Builder`] and is never restructured afterwards; a new layout means a
//! new tree.

use {
    crate::{dashboard::Theme, rolling::Metric, sample::Tier},
    std::{
        collections::{BTreeMap, VecDeque},
        io,
    },
};

/// draws a [`WidgetTree`].
pub trait Surface {
    /// erases everything previously drawn.
    fn clear(&mut self) -> io::Result<()>;
    /// draws the tree once.
    fn draw(&mut self, tree: &WidgetTree) -> io::Result<()>;
}

/// a layout of widgets, and the widgets themselves.
#[derive(Clone, Debug)]
pub struct WidgetTree {
    root: Node,
    widgets: BTreeMap<Slot, Widget>,
}

/// one node of a layout.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// children sharing the space along an axis.
    Split { axis: Axis, children: Vec<Node> },
    /// a bordered, titled region around a child.
    Panel { slot: Slot, child: Box<Node> },
    /// a single widget.
    Leaf(Slot),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axis {
    /// children are placed side by side.
    Horizontal,
    /// children are stacked.
    Vertical,
}

/// names a widget within a tree.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Slot {
    ProcessorPanel,
    MemoryPanel,
    PowerPanel,
    DiskPanel,
    NetworkPanel,
    /// the headline gauge for a tier.
    Tier(Tier),
    /// the n-th core of a tier, in the order the sampler reports them.
    Core(Tier, usize),
    Gpu,
    Ane,
    Ram,
    /// a chart of a rolling metric.
    Chart(Metric),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// a horizontal bar.
    Gauge,
    /// a vertical bar.
    Column,
    /// a scrolling history of points.
    Chart,
    Panel,
}

/// a single visual element.
#[derive(Clone, Debug, PartialEq)]
pub struct Widget {
    kind: Kind,
    title: String,
    /// a percentage, for gauges and columns.
    value: u8,
    /// percentages, oldest first, for charts.
    points: VecDeque<u8>,
    color: Theme,
}

/// assembles a [`WidgetTree`].
pub struct Builder {
    widgets: BTreeMap<Slot, Widget>,
    theme: Theme,
}

// === impl WidgetTree ===

impl WidgetTree {
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn widget(&self, slot: Slot) -> Option<&Widget> {
        self.widgets.get(&slot)
    }

    pub fn widget_mut(&mut self, slot: Slot) -> Option<&mut Widget> {
        self.widgets.get_mut(&slot)
    }

    /// returns every widget in the tree, in slot order.
    pub fn widgets(&self) -> impl Iterator<Item = (Slot, &Widget)> {
        self.widgets.iter().map(|(slot, widget)| (*slot, widget))
    }

    /// the number of widgets in the tree.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// changes the color of every widget, leaving the layout untouched.
    pub fn recolor(&mut self, theme: Theme) {
        for widget in self.widgets.values_mut() {
            widget.color = theme;
        }
    }
}

// === impl Widget ===

impl Widget {
    /// the most points a chart remembers.
    pub const HISTORY: usize = 512;

    fn new(kind: Kind, color: Theme) -> Self {
        Self {
            kind,
            title: String::new(),
            value: 0,
            points: VecDeque::new(),
            color,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// sets the gauge value, clamped to 100.
    pub fn set_value(&mut self, percent: u8) {
        self.value = percent.min(100);
    }

    /// appends a point to the chart, clamped to 100, forgetting the oldest beyond
    /// [`Widget::HISTORY`].
    pub fn append_point(&mut self, percent: u8) {
        let Self { points, .. } = self;
        if points.len() == Self::HISTORY {
            points.pop_front();
        }
        points.push_back(percent.min(100));
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn points(&self) -> &VecDeque<u8> {
        &self.points
    }

    pub fn color(&self) -> Theme {
        self.color
    }
}

// === impl Builder ===

impl Builder {
    pub fn new(theme: Theme) -> Self {
        Self {
            widgets: BTreeMap::new(),
            theme,
        }
    }

    pub fn gauge(&mut self, slot: Slot) -> Node {
        self.leaf(slot, Kind::Gauge)
    }

    pub fn column(&mut self, slot: Slot) -> Node {
        self.leaf(slot, Kind::Column)
    }

    pub fn chart(&mut self, slot: Slot) -> Node {
        self.leaf(slot, Kind::Chart)
    }

    pub fn panel(&mut self, slot: Slot, title: &str, child: Node) -> Node {
        let mut widget = Widget::new(Kind::Panel, self.theme);
        widget.set_title(title);
        self.insert(slot, widget);
        Node::Panel {
            slot,
            child: Box::new(child),
        }
    }

    pub fn split(axis: Axis, children: Vec<Node>) -> Node {
        Node::Split { axis, children }
    }

    pub fn finish(self, root: Node) -> WidgetTree {
        let Self { widgets, .. } = self;
        WidgetTree { root, widgets }
    }

    fn leaf(&mut self, slot: Slot, kind: Kind) -> Node {
        self.insert(slot, Widget::new(kind, self.theme));
        Node::Leaf(slot)
    }

    fn insert(&mut self, slot: Slot, widget: Widget) {
        if self.widgets.insert(slot, widget).is_some() {
            log::warn!("widget {slot:?} was placed twice");
        }
    }
}

/// a surface that records what it was asked to do.
#[derive(Debug, Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct MockSurface {
    pub clears: usize,
    /// the trees drawn, most recent last.
    pub frames: Vec<WidgetTree>,
}

impl Surface for MockSurface {
    fn clear(&mut self) -> io::Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn draw(&mut self, tree: &WidgetTree) -> io::Result<()> {
        self.frames.push(tree.clone());
        Ok(())
    }
}
