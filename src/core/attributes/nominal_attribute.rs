use crate::core::attributes::Attribute;
use std::any::Any;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct NominalAttribute {
    pub name: String,
    pub values: Vec<String>,
    pub label_to_index: HashMap<String, usize>,
}

impl NominalAttribute {
    pub fn with_values(name: String, values: Vec<String>) -> NominalAttribute {
        let label_to_index = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i))
            .collect();
        NominalAttribute {
            name,
            values,
            label_to_index,
        }
    }

    pub fn index_of_value(&self, v: &str) -> Option<usize> {
        self.label_to_index.get(v).copied()
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

impl Attribute for NominalAttribute {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn arff_representation(&self) -> String {
        format!("@attribute {} {{ {} }}", self.name, self.values.join(", "))
    }

    fn domain_size(&self) -> Option<usize> {
        Some(self.values.len())
    }
}
