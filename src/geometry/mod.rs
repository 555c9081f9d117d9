use crate::types::{NativePoint, TouchPoint};


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Self::Rotation0,
            1 => Self::Rotation90,
            2 => Self::Rotation180,
            _ => Self::Rotation270,
        }
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            Self::Rotation0 => 0,
            Self::Rotation90 => 1,
            Self::Rotation180 => 2,
            Self::Rotation270 => 3,
        }
    }
}

/// Half-open pixel rectangle (`left <= x < right`), in display coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl SensorRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) as f32 * 0.5
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) as f32 * 0.5
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && x >= self.left
            && x < self.right
            && y >= self.top
            && y < self.bottom
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SensorShape {
    #[default]
    Rect,
    /// Ellipse inscribed in the sensor bounds.
    Ellipse,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayParams {
    pub sensor_bounds: SensorRect,
    pub sensor_shape: SensorShape,
    pub logical_display_width: i32,
    pub logical_display_height: i32,
    /// Panel pixel density over native sensor pixel density.
    pub scale_factor: f32,
    pub rotation: Rotation,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            sensor_bounds: SensorRect::default(),
            sensor_shape: SensorShape::Rect,
            logical_display_width: 0,
            logical_display_height: 0,
            scale_factor: 1.0,
            rotation: Rotation::Rotation0,
        }
    }
}

/// Maps a display-space point into sensor-native coordinates.
///
/// 90 and 270 degree rotations are undone against the logical display size;
/// 0 and 180 pass through. The result is divided by `scale` and truncated.
/// A non-finite or non-positive `scale` is treated as 1, and non-positive
/// display dimensions skip the rotation step.
pub fn to_native(
    point: TouchPoint,
    rotation: Rotation,
    logical_w: i32,
    logical_h: i32,
    scale: f32,
) -> NativePoint {
    let x = point.x as i32;
    let y = point.y as i32;
    let (x, y) = if logical_w <= 0 || logical_h <= 0 {
        (x, y)
    } else {
        match rotation {
            Rotation::Rotation90 => (logical_h - y, x),
            Rotation::Rotation270 => (y, logical_w - x),
            Rotation::Rotation0 | Rotation::Rotation180 => (x, y),
        }
    };
    let scale = effective_scale(scale);
    NativePoint {
        x: (x as f32 / scale) as i32,
        y: (y as f32 / scale) as i32,
    }
}

/// Inverse of [`to_native`], up to the truncation done there.
pub fn to_display(
    native: NativePoint,
    rotation: Rotation,
    logical_w: i32,
    logical_h: i32,
    scale: f32,
) -> TouchPoint {
    let scale = effective_scale(scale);
    let x = native.x as f32 * scale;
    let y = native.y as f32 * scale;
    if logical_w <= 0 || logical_h <= 0 {
        return TouchPoint::new(x, y);
    }
    match rotation {
        Rotation::Rotation90 => TouchPoint::new(y, logical_h as f32 - x),
        Rotation::Rotation270 => TouchPoint::new(logical_w as f32 - y, x),
        Rotation::Rotation0 | Rotation::Rotation180 => TouchPoint::new(x, y),
    }
}

fn effective_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorGeometry {
    params: OverlayParams,
}

impl SensorGeometry {
    pub fn new(params: OverlayParams) -> Self {
        if !(params.scale_factor.is_finite() && params.scale_factor > 0.0) {
            log::warn!(
                "udfps: geometry_degenerate scale_factor={} fallback=identity",
                params.scale_factor
            );
        }
        Self { params }
    }

    pub fn params(&self) -> &OverlayParams {
        &self.params
    }

    pub fn scale(&self) -> f32 {
        effective_scale(self.params.scale_factor)
    }

    pub fn to_native(&self, point: TouchPoint) -> NativePoint {
        to_native(
            point,
            self.params.rotation,
            self.params.logical_display_width,
            self.params.logical_display_height,
            self.params.scale_factor,
        )
    }

    pub fn to_display(&self, native: NativePoint) -> TouchPoint {
        to_display(
            native,
            self.params.rotation,
            self.params.logical_display_width,
            self.params.logical_display_height,
            self.params.scale_factor,
        )
    }

    /// Touch size (minor/major axis) in native pixels.
    pub fn to_native_size(&self, size: f32) -> f32 {
        size / self.scale()
    }

    pub fn native_sensor_center(&self) -> (f32, f32) {
        let bounds = &self.params.sensor_bounds;
        let scale = self.scale();
        (bounds.center_x() / scale, bounds.center_y() / scale)
    }

    pub fn contains(&self, point: TouchPoint) -> bool {
        let bounds = &self.params.sensor_bounds;
        match self.params.sensor_shape {
            SensorShape::Rect => bounds.contains(point.x as i32, point.y as i32),
            SensorShape::Ellipse => {
                let rx = bounds.width() as f32 * 0.5;
                let ry = bounds.height() as f32 * 0.5;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (point.x - bounds.center_x()) / rx;
                let dy = (point.y - bounds.center_y()) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}
