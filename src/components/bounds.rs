use geo::Coord;

/// Two opposite corners of a geographic rectangle, in the crs they were
/// supplied in.
///
/// Corners are kept exactly as given by the caller. Whether they are
/// ordered is only decidable against a concrete pixel grid, so the
/// check lives in `GeoRaster::window_for_bounds`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoBounds {
    first: Coord,
    second: Coord,
    crs: String,
}

impl GeoBounds {
    /// Corner coordinates are x/y (easting/northing, or lon/lat for
    /// geographic crs).
    pub fn new(first: Coord, second: Coord, crs: impl Into<String>) -> Self {
        Self {
            first,
            second,
            crs: crs.into(),
        }
    }

    /// Corners as `(lat, lon)` pairs in EPSG:4326, the order
    /// acquisition scripts usually carry them in.
    pub fn wgs84(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> Self {
        Self::new(
            Coord { x: lon0, y: lat0 },
            Coord { x: lon1, y: lat1 },
            "EPSG:4326",
        )
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn corners(&self) -> (Coord, Coord) {
        (self.first, self.second)
    }
}

/// Integer pixel window into a raster grid.
///
/// `offset` is the top left pixel of the window, with origin at the top
/// left pixel of the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: isize,
    pub row_off: isize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn new(col_off: isize, row_off: isize, width: usize, height: usize) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Whether the window is non empty and lies fully inside a
    /// `width` x `height` grid.
    pub fn fits(&self, width: usize, height: usize) -> bool {
        self.width > 0
            && self.height > 0
            && self.col_off >= 0
            && self.row_off >= 0
            && self.col_off as usize + self.width <= width
            && self.row_off as usize + self.height <= height
    }

    /// `(col, row)` of the top left pixel.
    pub fn offset(&self) -> (isize, isize) {
        (self.col_off, self.row_off)
    }

    /// `(width, height)` in pixels.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn wgs84_corners_are_xy() {
        let bounds = GeoBounds::wgs84(9.089963, 38.653849, 8.822045, 38.898295);
        let (first, second) = bounds.corners();
        assert_eq!(first, Coord { x: 38.653849, y: 9.089963 });
        assert_eq!(second, Coord { x: 38.898295, y: 8.822045 });
        assert_eq!(bounds.crs(), "EPSG:4326");
    }

    #[rstest]
    #[case(Window::new(0, 0, 10, 10), true)]
    #[case(Window::new(5, 5, 5, 5), true)]
    #[case(Window::new(5, 5, 6, 5), false)]
    #[case(Window::new(-1, 0, 5, 5), false)]
    #[case(Window::new(0, 0, 0, 5), false)]
    fn window_fit(#[case] window: Window, #[case] fits: bool) {
        assert_eq!(window.fits(10, 10), fits);
    }
}
