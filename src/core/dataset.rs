use crate::core::instance::Instance;

/// Ordered training instances. Positions are stable until `clear`, which is
/// what positional reweighting relies on.
#[derive(Debug, Default, Clone)]
pub struct TrainingDataset {
    instances: Vec<Instance>,
}

impl TrainingDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instances(instances: Vec<Instance>) -> Self {
        Self { instances }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn push(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn extend<I: IntoIterator<Item = Instance>>(&mut self, instances: I) {
        self.instances.extend(instances);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    /// Returns `false` when `index` is past the end.
    pub fn set_weight(&mut self, index: usize, weight: f64) -> bool {
        match self.instances.get_mut(index) {
            Some(inst) => {
                inst.set_weight(weight);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    pub fn total_weight(&self) -> f64 {
        self.instances.iter().map(Instance::weight).sum()
    }
}

impl<'a> IntoIterator for &'a TrainingDataset {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}
