// 📐 Quantity from dimensions
// Nr × Length × Width × Depth × Factor, no validation.

/// Product of the five factors. Zero and negative inputs pass straight through.
pub fn compute_quantity(count: f64, length: f64, width: f64, depth: f64, factor: f64) -> f64 {
    count * length * width * depth * factor
}

/// Inputs of the dimensions panel. Every factor starts at 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub count: f64,
    pub length: f64,
    pub width: f64,
    pub depth: f64,
    pub factor: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions {
            count: 1.0,
            length: 1.0,
            width: 1.0,
            depth: 1.0,
            factor: 1.0,
        }
    }
}

impl Dimensions {
    pub fn quantity(&self) -> f64 {
        compute_quantity(self.count, self.length, self.width, self.depth, self.factor)
    }
}
