//! Screen capture: picks the display the window is on and grabs it.
//!
//! [`ScreenHost`] is the host-side seam: [`XcapHost`] talks to the OS through
//! `xcap`, tests substitute a fake. Source selection itself
//! ([`select_source`]) is pure.

use super::{CaptureError, ImagePayload};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A rectangle in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, (px, py): (i32, i32)) -> bool {
        px >= self.x
            && py >= self.y
            && i64::from(px) < i64::from(self.x) + i64::from(self.width)
            && i64::from(py) < i64::from(self.y) + i64::from(self.height)
    }

    /// Squared distance from `point` to the nearest edge (0 when inside).
    fn distance_sq(&self, (px, py): (i32, i32)) -> i64 {
        let right = i64::from(self.x) + i64::from(self.width);
        let bottom = i64::from(self.y) + i64::from(self.height);
        let (px, py) = (i64::from(px), i64::from(py));
        let dx = (i64::from(self.x) - px).max(0).max(px - right);
        let dy = (i64::from(self.y) - py).max(0).max(py - bottom);
        dx * dx + dy * dy
    }
}

/// A physical display and where it sits on the virtual desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub id: u32,
    pub bounds: Rect,
}

/// Something the host can capture. `display_id` is `None` when the host
/// cannot tie the source to a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySource {
    pub display_id: Option<u32>,
    pub name: String,
}

// ---------------------------------------------------------------------------
// ScreenHost
// ---------------------------------------------------------------------------

/// Host-side screen access.
pub trait ScreenHost: Send + Sync {
    /// Every capturable screen source.
    fn sources(&self) -> Result<Vec<DisplaySource>, CaptureError>;

    /// Every connected display with its bounds.
    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError>;

    /// Grab the contents of `source`.
    fn capture(&self, source: &DisplaySource) -> Result<ImagePayload, CaptureError>;
}

/// The display containing `point`, otherwise the one closest to it.
pub fn nearest_display(displays: &[DisplayInfo], point: (i32, i32)) -> Option<u32> {
    displays
        .iter()
        .find(|d| d.bounds.contains(point))
        .or_else(|| displays.iter().min_by_key(|d| d.bounds.distance_sq(point)))
        .map(|d| d.id)
}

/// Pick the source showing the display nearest to `surface`, falling back to
/// the first source.
///
/// # Errors
///
/// [`CaptureError::NoSourceAvailable`] when `sources` is empty.
pub fn select_source<'a>(
    sources: &'a [DisplaySource],
    displays: &[DisplayInfo],
    surface: Option<Rect>,
) -> Result<&'a DisplaySource, CaptureError> {
    let first = sources.first().ok_or(CaptureError::NoSourceAvailable)?;

    let target = surface.and_then(|r| nearest_display(displays, (r.x, r.y)));
    let matched = target.and_then(|id| sources.iter().find(|s| s.display_id == Some(id)));

    Ok(matched.unwrap_or(first))
}

/// Capture the screen the UI surface is currently on.
pub fn capture_screen(
    host: &dyn ScreenHost,
    surface: Option<Rect>,
) -> Result<ImagePayload, CaptureError> {
    let sources = host.sources()?;
    log::debug!("capture: {} screen source(s)", sources.len());

    // Without display geometry we can still fall back to the first source.
    let displays = host.displays().unwrap_or_else(|e| {
        log::warn!("capture: display list unavailable ({e})");
        Vec::new()
    });

    let source = select_source(&sources, &displays, surface)?;
    log::info!(
        "capture: selected source {:?} (display {:?})",
        source.name,
        source.display_id
    );
    host.capture(source)
}

// ---------------------------------------------------------------------------
// XcapHost
// ---------------------------------------------------------------------------

/// [`ScreenHost`] backed by `xcap` monitors.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapHost;

impl XcapHost {
    fn monitors() -> Result<Vec<xcap::Monitor>, CaptureError> {
        xcap::Monitor::all().map_err(|e| CaptureError::Host(e.to_string()))
    }
}

impl ScreenHost for XcapHost {
    fn sources(&self) -> Result<Vec<DisplaySource>, CaptureError> {
        Ok(Self::monitors()?
            .iter()
            .map(|m| DisplaySource {
                display_id: m.id().ok(),
                name: m.name().unwrap_or_default(),
            })
            .collect())
    }

    fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        Ok(Self::monitors()?
            .iter()
            .filter_map(|m| {
                Some(DisplayInfo {
                    id: m.id().ok()?,
                    bounds: Rect {
                        x: m.x().ok()?,
                        y: m.y().ok()?,
                        width: m.width().ok()?,
                        height: m.height().ok()?,
                    },
                })
            })
            .collect())
    }

    fn capture(&self, source: &DisplaySource) -> Result<ImagePayload, CaptureError> {
        let monitors = Self::monitors()?;
        let monitor = monitors
            .iter()
            .find(|m| source.display_id.is_some() && m.id().ok() == source.display_id)
            .or_else(|| monitors.first())
            .ok_or(CaptureError::NoSourceAvailable)?;

        let frame = monitor
            .capture_image()
            .map_err(|e| CaptureError::Host(e.to_string()))?;
        ImagePayload::from_rgba(&frame)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn display(id: u32, x: i32, width: u32) -> DisplayInfo {
        DisplayInfo {
            id,
            bounds: Rect {
                x,
                y: 0,
                width,
                height: 1080,
            },
        }
    }

    fn source(display_id: Option<u32>, name: &str) -> DisplaySource {
        DisplaySource {
            display_id,
            name: name.into(),
        }
    }

    fn surface_at(x: i32, y: i32) -> Option<Rect> {
        Some(Rect {
            x,
            y,
            width: 400,
            height: 300,
        })
    }

    struct FakeHost {
        sources: Vec<DisplaySource>,
        displays: Vec<DisplayInfo>,
        captured: Mutex<Vec<DisplaySource>>,
    }

    impl ScreenHost for FakeHost {
        fn sources(&self) -> Result<Vec<DisplaySource>, CaptureError> {
            Ok(self.sources.clone())
        }

        fn displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
            Ok(self.displays.clone())
        }

        fn capture(&self, source: &DisplaySource) -> Result<ImagePayload, CaptureError> {
            self.captured.lock().unwrap().push(source.clone());
            Ok(ImagePayload::new(source.name.clone().into_bytes(), "image/png"))
        }
    }

    #[test]
    fn nearest_display_prefers_containment() {
        let displays = vec![display(1, 0, 1920), display(2, 1920, 1920)];
        assert_eq!(nearest_display(&displays, (2000, 100)), Some(2));
        assert_eq!(nearest_display(&displays, (10, 10)), Some(1));
    }

    #[test]
    fn nearest_display_falls_back_to_closest() {
        let displays = vec![display(1, 0, 1920), display(2, 1920, 1920)];
        // Off the right edge of the second display.
        assert_eq!(nearest_display(&displays, (5000, 100)), Some(2));
        // Above the first display.
        assert_eq!(nearest_display(&displays, (100, -50)), Some(1));
        assert_eq!(nearest_display(&[], (0, 0)), None);
    }

    #[test]
    fn selects_source_matching_window_display() {
        let sources = vec![source(Some(1), "left"), source(Some(2), "right")];
        let displays = vec![display(1, 0, 1920), display(2, 1920, 1920)];

        let chosen = select_source(&sources, &displays, surface_at(2500, 200)).unwrap();
        assert_eq!(chosen.name, "right");
    }

    #[test]
    fn falls_back_to_first_source_without_match() {
        let sources = vec![source(None, "only")];
        let displays = vec![display(7, 0, 1920)];

        let chosen = select_source(&sources, &displays, surface_at(10, 10)).unwrap();
        assert_eq!(chosen.name, "only");
    }

    #[test]
    fn falls_back_to_first_source_without_bounds() {
        let sources = vec![source(Some(1), "a"), source(Some(2), "b")];
        let chosen = select_source(&sources, &[], None).unwrap();
        assert_eq!(chosen.name, "a");
    }

    #[test]
    fn zero_sources_is_no_source_available() {
        let err = select_source(&[], &[], surface_at(0, 0)).unwrap_err();
        assert!(matches!(err, CaptureError::NoSourceAvailable));
    }

    #[test]
    fn capture_screen_grabs_the_selected_source() {
        let host = FakeHost {
            sources: vec![source(Some(1), "left"), source(Some(2), "right")],
            displays: vec![display(1, 0, 1920), display(2, 1920, 1920)],
            captured: Mutex::new(Vec::new()),
        };

        let payload = capture_screen(&host, surface_at(1950, 40)).unwrap();
        assert_eq!(payload.bytes, b"right");
        assert_eq!(host.captured.lock().unwrap().len(), 1);
    }

    #[test]
    fn capture_screen_without_sources_fails() {
        let host = FakeHost {
            sources: Vec::new(),
            displays: vec![display(1, 0, 1920)],
            captured: Mutex::new(Vec::new()),
        };

        assert!(matches!(
            capture_screen(&host, None),
            Err(CaptureError::NoSourceAvailable)
        ));
        assert!(host.captured.lock().unwrap().is_empty());
    }
}
