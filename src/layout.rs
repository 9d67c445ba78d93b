//! Weighted box layout.

use crate::geometry::{Position, Rect, Size};

/// Named layout area.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Slot {
    Face,
    Hour,
    Minute,
    Second,
}

/// Layout tree node.
///
/// Every node receives a share of its parent's main axis proportional to its
/// weight and the full cross axis.
#[derive(Clone, Debug)]
pub struct Node {
    weight: f32,
    kind: NodeKind,
}

#[derive(Clone, Debug)]
enum NodeKind {
    Column(Vec<Node>),
    Row(Vec<Node>),
    Slot(Slot),
    Spacer,
}

impl Node {
    /// Children stacked top to bottom.
    pub fn column(weight: f32, children: Vec<Node>) -> Self {
        Self { weight, kind: NodeKind::Column(children) }
    }

    /// Children placed left to right.
    pub fn row(weight: f32, children: Vec<Node>) -> Self {
        Self { weight, kind: NodeKind::Row(children) }
    }

    pub fn slot(weight: f32, slot: Slot) -> Self {
        Self { weight, kind: NodeKind::Slot(slot) }
    }

    pub fn spacer(weight: f32) -> Self {
        Self { weight, kind: NodeKind::Spacer }
    }

    /// Compute the rectangles of all slots within `bounds`.
    pub fn resolve(&self, bounds: Rect) -> Vec<(Slot, Rect)> {
        let mut slots = Vec::new();
        self.resolve_into(bounds, &mut slots);
        slots
    }

    fn resolve_into(&self, bounds: Rect, slots: &mut Vec<(Slot, Rect)>) {
        let (children, horizontal) = match &self.kind {
            NodeKind::Slot(slot) => {
                slots.push((*slot, bounds));
                return;
            },
            NodeKind::Spacer => return,
            NodeKind::Column(children) => (children, false),
            NodeKind::Row(children) => (children, true),
        };

        // Negative weights are treated as empty.
        let total: f32 = children.iter().map(|child| child.weight.max(0.)).sum();
        let extent = if horizontal { bounds.size.width } else { bounds.size.height };

        let mut offset = 0.;
        for child in children {
            let length = if total > 0. { extent * child.weight.max(0.) / total } else { 0. };

            let child_bounds = if horizontal {
                let origin = Position::new(bounds.origin.x + offset, bounds.origin.y);
                Rect { origin, size: Size::new(length, bounds.size.height) }
            } else {
                let origin = Position::new(bounds.origin.x, bounds.origin.y + offset);
                Rect { origin, size: Size::new(bounds.size.width, length) }
            };
            child.resolve_into(child_bounds, slots);

            offset += length;
        }
    }
}

/// Areas of the clock window.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct ClockLayout {
    /// Area for the wave and the hands.
    pub face: Rect,
    /// Hour, minute and second buttons.
    pub readout: [Rect; 3],
}

impl ClockLayout {
    pub fn new(size: Size<f32>) -> Self {
        let tree = Node::column(1., vec![
            Node::slot(5., Slot::Face),
            Node::row(1., vec![
                Node::spacer(1.),
                Node::slot(3., Slot::Hour),
                Node::spacer(1.),
                Node::slot(3., Slot::Minute),
                Node::spacer(1.),
                Node::slot(3., Slot::Second),
                Node::spacer(1.),
            ]),
            Node::spacer(1.),
        ]);

        let mut layout = Self::default();
        for (slot, rect) in tree.resolve(size.into()) {
            match slot {
                Slot::Face => layout.face = rect,
                Slot::Hour => layout.readout[0] = rect,
                Slot::Minute => layout.readout[1] = rect,
                Slot::Second => layout.readout[2] = rect,
            }
        }
        layout
    }

    /// Radius of the clock dial.
    pub fn dial_radius(&self) -> f32 {
        self.face.min_side() / 4.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_layout_weights() {
        let layout = ClockLayout::new(Size::new(1300., 700.));

        assert_eq!(layout.face, Rect::new(0., 0., 1300., 500.));
        assert_eq!(layout.readout[0], Rect::new(100., 500., 300., 100.));
        assert_eq!(layout.readout[1], Rect::new(500., 500., 300., 100.));
        assert_eq!(layout.readout[2], Rect::new(900., 500., 300., 100.));
        assert_eq!(layout.dial_radius(), 125.);
    }

    #[test]
    fn unmeasured_window() {
        let layout = ClockLayout::new(Size::default());
        assert_eq!(layout.face, Rect::default());
        assert_eq!(layout.dial_radius(), 0.);
        for rect in layout.readout {
            assert!(rect.origin.x.is_finite() && rect.size.width == 0.);
        }
    }

    #[test]
    fn zero_weights_collapse() {
        let tree = Node::row(1., vec![Node::slot(0., Slot::Hour), Node::spacer(0.)]);
        let slots = tree.resolve(Rect::new(0., 0., 100., 10.));
        assert_eq!(slots, vec![(Slot::Hour, Rect::new(0., 0., 0., 10.))]);
    }

    #[test]
    fn nested_offsets() {
        let tree = Node::column(1., vec![
            Node::spacer(1.),
            Node::row(1., vec![Node::spacer(1.), Node::slot(1., Slot::Face)]),
        ]);
        let slots = tree.resolve(Rect::new(10., 10., 100., 100.));
        assert_eq!(slots, vec![(Slot::Face, Rect::new(60., 60., 50., 50.))]);
    }
}
