/// A dense feature vector with its weight. The class value lives in the
/// header's class slot; `NaN` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    values: Vec<f64>,
    weight: f64,
}

impl Instance {
    pub fn new(values: Vec<f64>, weight: f64) -> Self {
        Self { values, weight }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value_at_index(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn is_missing_at_index(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(|v| v.is_nan())
    }

    pub fn number_of_attributes(&self) -> usize {
        self.values.len()
    }

    /// Class value stored at `class_index`, `None` when absent or missing.
    pub fn class_value(&self, class_index: usize) -> Option<f64> {
        self.value_at_index(class_index).filter(|v| !v.is_nan())
    }
}
