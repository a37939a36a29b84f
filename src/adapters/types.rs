//! Shared adapter types

use serde::{Deserialize, Serialize};

/// RGB color with components in `0.0..=1.0`, as the Sheets API expects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl CellColor {
    pub const RED: CellColor = CellColor {
        red: 1.0,
        green: 0.0,
        blue: 0.0,
    };

    /// Clamp every component into the valid range
    pub fn clamped(self) -> Self {
        Self {
            red: self.red.clamp(0.0, 1.0),
            green: self.green.clamp(0.0, 1.0),
            blue: self.blue.clamp(0.0, 1.0),
        }
    }
}

impl Default for CellColor {
    fn default() -> Self {
        Self::RED
    }
}
