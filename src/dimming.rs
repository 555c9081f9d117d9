use crate::error::ConfigError;

const MAX_ALPHA: i32 = 255;

/// Brightness to overlay-alpha curve used when the framework dims the panel
/// around the sensor instead of the HAL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DimmingTable {
    points: Vec<(i32, i32)>,
}

impl DimmingTable {
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, ConfigError> {
        let mut points = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref();
            let mut parts = entry.split(',');
            let (Some(brightness), Some(alpha), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(ConfigError::DimmingEntry(entry.to_string()));
            };
            let brightness = brightness
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::DimmingEntry(entry.to_string()))?;
            let alpha = alpha
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::DimmingEntry(entry.to_string()))?;
            if brightness < 0 || !(0..=MAX_ALPHA).contains(&alpha) {
                return Err(ConfigError::DimmingEntry(entry.to_string()));
            }
            // dim_amount picks the first entry at or above the brightness.
            if points.last().is_some_and(|&(prev, _)| brightness <= prev) {
                return Err(ConfigError::DimmingOrder(entry.to_string()));
            }
            points.push((brightness, alpha));
        }
        Ok(Self { points })
    }

    /// Dim amount in `0.0..=1.0` for the current screen brightness.
    pub fn dim_amount(&self, brightness: i32) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let idx = self
            .points
            .iter()
            .position(|&(level, _)| level >= brightness)
            .unwrap_or(self.points.len());

        let alpha = match idx {
            0 => self.points[0].1,
            i if i == self.points.len() => self.points[i - 1].1,
            i => {
                let (xa, ya) = self.points[i];
                let (xb, yb) = self.points[i - 1];
                interpolate(brightness, xa, xb, ya, yb)
            }
        };
        alpha as f32 / MAX_ALPHA as f32
    }
}

fn interpolate(x: i32, xa: i32, xb: i32, ya: i32, yb: i32) -> i32 {
    if xa == xb {
        return ya;
    }
    let (x, xa, xb, ya, yb) = (x as i64, xa as i64, xb as i64, ya as i64, yb as i64);
    let alpha = ya - (ya - yb) * (x - xa) / (xb - xa);
    alpha.clamp(0, MAX_ALPHA as i64) as i32
}
