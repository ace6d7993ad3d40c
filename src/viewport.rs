//! Viewport fitting geometry
//!
//! Pure arithmetic that maps an image of arbitrary dimensions into a
//! display region of arbitrary dimensions: letterbox/pillarbox margins
//! center the image, and a final bounding-box scale shrinks (never
//! stretches) the padded frame so it fits the viewport. No state, no I/O;
//! the same four inputs always produce the same geometry.

/// Vertical space reserved for viewer chrome when a tall image must be
/// scaled to fit: it widens the horizontal margins and shrinks the
/// drawable height by the same amount so the image never runs under the
/// control strip.
pub const CHROME_RESERVE: u32 = 50;

/// Final geometry of one fitted frame: the on-screen size of the drawn
/// image and the symmetric per-side margins around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportGeometry {
    /// Drawn image width, never exceeding the viewport width.
    pub width: u32,
    /// Drawn image height, never exceeding the viewport height.
    pub height: u32,
    /// Margin added on the left and on the right.
    pub margin_horizontal: u32,
    /// Margin added on the top and on the bottom.
    pub margin_vertical: u32,
}

/// Fits an `image_width` x `image_height` image into a `viewport_width` x
/// `viewport_height` region, preserving aspect ratio.
///
/// Inputs are expected to be positive; zeros are treated as 1 so the
/// function stays total.
///
/// The branchy margin selection reproduces letterbox/pillarbox centering:
/// a relatively tall image gets horizontal padding (plus the chrome
/// reserve when it must shrink to fit), a relatively wide image gets
/// vertical padding, and an image that already fits is centered at native
/// size. The final pass scales the padded frame down, never up.
pub fn fit(
    image_width: u32,
    image_height: u32,
    viewport_width: u32,
    viewport_height: u32,
) -> ViewportGeometry {
    let iw = f64::from(image_width.max(1));
    let ih = f64::from(image_height.max(1));
    let vw = f64::from(viewport_width.max(1));
    let vh = f64::from(viewport_height.max(1));

    let ratio = (vw / vh) / (iw / ih);

    let (margin_horizontal, margin_vertical, bound_width, bound_height) = if ratio > 1.0 {
        // Image relatively taller than the viewport: height binds.
        if ih > vh {
            let margin = ((ih * vw / vh - iw) / 2.0).floor() + f64::from(CHROME_RESERVE);
            (margin, 0.0, vw, (vh - f64::from(CHROME_RESERVE)).max(1.0))
        } else {
            (((vw - iw) / 2.0).floor(), ((vh - ih) / 2.0).floor(), vw, vh)
        }
    } else {
        // Image relatively wider than the viewport: width binds.
        if iw > vw {
            (0.0, ((iw * vh / vw - ih) / 2.0).floor(), vw, vh)
        } else {
            (((vw - iw) / 2.0).floor(), ((vh - ih) / 2.0).floor(), vw, vh)
        }
    };

    let padded_width = iw + 2.0 * margin_horizontal;
    let padded_height = ih + 2.0 * margin_vertical;
    let scale = (bound_width / padded_width)
        .min(bound_height / padded_height)
        .min(1.0);

    ViewportGeometry {
        width: ((iw * scale).round() as u32).max(1),
        height: ((ih * scale).round() as u32).max(1),
        margin_horizontal: (margin_horizontal * scale).floor() as u32,
        margin_vertical: (margin_vertical * scale).floor() as u32,
    }
}
