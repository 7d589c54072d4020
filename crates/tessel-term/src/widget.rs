// SPDX-License-Identifier: MIT
//
// Widget trait.
//
// A widget draws itself into the `SubScreen` it is handed and may react
// to events. The app loop owns one root widget as a `Box<dyn Widget>`;
// containers own their children the same way and give each a nested
// sub-region, so a child can never draw outside the space it was given.

use crate::buffer::{SubScreen, Surface};
use crate::input::Event;

/// What a widget did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResult {
    /// Not for this widget; offer it to the next one.
    #[default]
    Ignored,
    /// Handled. Stop offering it.
    Consumed,
    /// Handled, and the application should exit.
    Quit,
}

impl EventResult {
    /// Anything other than [`Ignored`](Self::Ignored).
    #[must_use]
    pub const fn is_handled(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Preferred size of a widget. `None` takes whatever space is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeHint {
    pub width: Option<u16>,
    pub height: Option<u16>,
}

impl SizeHint {
    /// Flexible in both directions.
    pub const FILL: Self = Self {
        width: None,
        height: None,
    };

    /// Fixed number of rows, any width.
    #[must_use]
    pub const fn rows(height: u16) -> Self {
        Self {
            width: None,
            height: Some(height),
        }
    }
}

/// A drawable, interactive piece of UI.
pub trait Widget {
    /// Draw into `area`. The area is cleared before each frame, and its
    /// coordinates start at (0, 0).
    fn render(&mut self, area: &mut SubScreen<'_>);

    /// React to an input event.
    fn handle_event(&mut self, _event: &Event) -> EventResult {
        EventResult::Ignored
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::FILL
    }

    /// Where the hardware cursor should be shown, in screen coordinates,
    /// after the frame is drawn. `None` hides it.
    fn cursor(&self) -> Option<(u16, u16)> {
        None
    }
}

impl<W: Widget + ?Sized> Widget for Box<W> {
    fn render(&mut self, area: &mut SubScreen<'_>) {
        (**self).render(area);
    }

    fn handle_event(&mut self, event: &Event) -> EventResult {
        (**self).handle_event(event)
    }

    fn size_hint(&self) -> SizeHint {
        (**self).size_hint()
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        (**self).cursor()
    }
}

// ─── Column ─────────────────────────────────────────────────────────────────

/// Children stacked top to bottom.
///
/// Children with a fixed height get it first (top to bottom, while rows
/// remain); the rest share what is left, earlier children taking the
/// remainder of an uneven split. Events are offered to children in order
/// until one handles them.
#[derive(Default)]
pub struct Column {
    children: Vec<Box<dyn Widget>>,
}

impl Column {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child.
    #[must_use]
    pub fn push(mut self, child: impl Widget + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Height of each child for a column `total` rows tall.
    fn layout(&self, total: u16) -> Vec<u16> {
        let mut left = total;
        let mut heights: Vec<Option<u16>> = self
            .children
            .iter()
            .map(|c| {
                c.size_hint().height.map(|h| {
                    let h = h.min(left);
                    left -= h;
                    h
                })
            })
            .collect();

        let flexible = heights.iter().filter(|h| h.is_none()).count();
        if flexible > 0 {
            let flexible = u16::try_from(flexible).unwrap_or(u16::MAX);
            let share = left / flexible;
            let mut extra = left % flexible;
            for h in heights.iter_mut().filter(|h| h.is_none()) {
                let bonus = u16::from(extra > 0);
                extra = extra.saturating_sub(1);
                *h = Some(share + bonus);
            }
        }
        heights.into_iter().map(|h| h.unwrap_or(0)).collect()
    }
}

impl Widget for Column {
    fn render(&mut self, area: &mut SubScreen<'_>) {
        let width = area.width();
        let heights = self.layout(area.height());
        let mut y = 0u16;
        for (child, h) in self.children.iter_mut().zip(heights) {
            if h > 0 {
                let mut region = area.sub_region(0, y, width, h);
                child.render(&mut region);
            }
            y = y.saturating_add(h);
        }
    }

    fn handle_event(&mut self, event: &Event) -> EventResult {
        self.children
            .iter_mut()
            .map(|c| c.handle_event(event))
            .find(|r| r.is_handled())
            .unwrap_or(EventResult::Ignored)
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        self.children.iter().find_map(|c| c.cursor())
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Column({} children)", self.children.len())
    }
}
