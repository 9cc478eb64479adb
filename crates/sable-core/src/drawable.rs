//! The drawable capability.
//!
//! Anything that renders once per frame implements [`Drawable`]. Components
//! compose a [`DrawableState`] to get the visibility flag and draw order
//! instead of inheriting them, and a [`DrawableList`] draws a set of them in
//! order.
//!
//! ```
//! use sable_core::drawable::{Drawable, DrawableList, DrawableState};
//! use sable_core::time::GameTime;
//!
//! struct Background {
//!     state: DrawableState,
//!     frames: u32,
//! }
//!
//! impl Drawable for Background {
//!     fn draw(&mut self, _time: &GameTime) {
//!         self.frames += 1;
//!     }
//!
//!     fn visible(&self) -> bool {
//!         self.state.visible()
//!     }
//!
//!     fn draw_order(&self) -> i32 {
//!         self.state.draw_order()
//!     }
//! }
//!
//! let mut list = DrawableList::new();
//! list.push(Box::new(Background { state: DrawableState::default(), frames: 0 }));
//! assert_eq!(list.draw(&GameTime::new()), 1);
//! ```

use crate::time::GameTime;

/// A component that draws itself once per frame.
pub trait Drawable {
    /// Draw the component for the given frame time.
    fn draw(&mut self, time: &GameTime);

    /// Invisible drawables are skipped entirely.
    fn visible(&self) -> bool {
        true
    }

    /// Lower values draw first.
    fn draw_order(&self) -> i32 {
        0
    }
}

/// Visibility and draw order, meant to be embedded in components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawableState {
    visible: bool,
    draw_order: i32,
}

impl DrawableState {
    pub const fn new(draw_order: i32) -> Self {
        Self {
            visible: true,
            draw_order,
        }
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn draw_order(&self) -> i32 {
        self.draw_order
    }

    pub fn set_draw_order(&mut self, draw_order: i32) {
        self.draw_order = draw_order;
    }
}

impl Default for DrawableState {
    fn default() -> Self {
        Self::new(0)
    }
}

/// An owned set of drawables.
#[derive(Default)]
pub struct DrawableList {
    drawables: Vec<Box<dyn Drawable>>,
    // Scratch buffer of indices, reused every frame.
    order: Vec<usize>,
}

impl DrawableList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, drawable: Box<dyn Drawable>) {
        self.drawables.push(drawable);
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Drawable> {
        self.drawables.iter().map(|d| d.as_ref())
    }

    /// Draws every visible drawable in ascending draw order.
    ///
    /// Drawables with equal draw order keep their insertion order. Returns
    /// the number of drawables that were drawn.
    pub fn draw(&mut self, time: &GameTime) -> usize {
        self.order.clear();
        self.order.extend(
            self.drawables
                .iter()
                .enumerate()
                .filter(|(_, d)| d.visible())
                .map(|(i, _)| i),
        );

        let drawables = &self.drawables;
        self.order.sort_by_key(|&i| drawables[i].draw_order());

        for &index in &self.order {
            self.drawables[index].draw(time);
        }

        self.order.len()
    }
}
