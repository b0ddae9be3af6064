// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement of the contextual annotation toolbar next to a selection.
//!
//! All rectangles are in the same coordinate space (typically the viewport);
//! results are relative to the positioned container the toolbar lives in.
//!
//! ```
//! use kurbo::{Rect, Size};
//! use understory_annotation::{DeviceCapabilities, FloatingControlPositioner, Placement};
//!
//! let positioner = FloatingControlPositioner::new(DeviceCapabilities::empty());
//! let layout = positioner.layout(
//!     Rect::new(100.0, 200.0, 160.0, 220.0),
//!     Rect::new(0.0, 0.0, 400.0, 600.0),
//!     Size::new(80.0, 30.0),
//! );
//! assert_eq!(layout.placement, Placement::Above);
//! assert_eq!((layout.origin.x, layout.origin.y), (90.0, 166.0));
//! assert_eq!(layout.arrow_offset, 32.0);
//! ```

use kurbo::{Point, Rect, Size};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

bitflags::bitflags! {
    /// Input capabilities of the device showing the toolbar.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeviceCapabilities: u8 {
        /// The primary input is a touch screen.
        const TOUCH = 1;
    }
}

/// Which side of the selection the toolbar sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Above the selection, arrow pointing down.
    Above,
    /// Below the selection, arrow pointing up.
    Below,
}

impl Placement {
    /// Touch devices put the toolbar below so a thumb does not cover the selection.
    pub fn for_device(capabilities: DeviceCapabilities) -> Self {
        if capabilities.contains(DeviceCapabilities::TOUCH) {
            Self::Below
        } else {
            Self::Above
        }
    }
}

/// Fixed metrics of the toolbar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolbarStyle {
    /// Distance between the selection and the toolbar box.
    pub gap: f64,
    /// Width of the arrow pointing at the selection.
    pub arrow_width: f64,
}

impl Default for ToolbarStyle {
    fn default() -> Self {
        Self {
            gap: 4.0,
            arrow_width: 16.0,
        }
    }
}

/// Where to draw the toolbar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolbarLayout {
    /// Top-left corner of the toolbar box, relative to the container.
    pub origin: Point,
    /// Left offset of the arrow inside the toolbar box.
    pub arrow_offset: f64,
    /// Side of the selection.
    pub placement: Placement,
}

/// Computes toolbar positions. The placement is fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatingControlPositioner {
    placement: Placement,
    style: ToolbarStyle,
}

/// Round half up, matching how browsers round layout values.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

impl FloatingControlPositioner {
    /// Positioner for a device, with the default style.
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self::with_style(capabilities, ToolbarStyle::default())
    }

    /// Positioner for a device, with a custom style.
    pub fn with_style(capabilities: DeviceCapabilities, style: ToolbarStyle) -> Self {
        Self {
            placement: Placement::for_device(capabilities),
            style,
        }
    }

    /// Chosen side.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Style in use.
    pub fn style(&self) -> ToolbarStyle {
        self.style
    }

    /// Lay out a `toolbar`-sized box for `selection` inside `container`.
    ///
    /// The box is centered on the selection, then clamped so it stays within
    /// the container horizontally. The arrow keeps pointing at the selection
    /// center but never leaves the box.
    pub fn layout(&self, selection: Rect, container: Rect, toolbar: Size) -> ToolbarLayout {
        let (w, h) = (toolbar.width, toolbar.height);
        let aw = self.style.arrow_width;

        let range_top = match self.placement {
            Placement::Above => round_half_up(selection.y0 - container.y0),
            Placement::Below => round_half_up(selection.y1 - container.y0),
        };
        let range_left = round_half_up(selection.x0 - container.x0);
        let range_center = round_half_up(range_left + selection.width() / 2.0);

        let y = match self.placement {
            Placement::Above => round_half_up(range_top - h) - self.style.gap,
            Placement::Below => range_top + self.style.gap,
        };
        let x = (range_center - w / 2.0)
            .min(container.width() - w - 1.0)
            .max(0.0)
            .floor();
        let arrow_offset = (range_center - x - aw / 2.0)
            .min(w - aw - aw / 2.0)
            .max(aw / 2.0);

        ToolbarLayout {
            origin: Point::new(x, y),
            arrow_offset,
            placement: self.placement,
        }
    }
}
