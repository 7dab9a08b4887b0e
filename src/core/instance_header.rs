use crate::core::attributes::{Attribute, AttributeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two numbers every protocol message is laid out against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub feature_count: usize,
    pub class_count: usize,
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} features, {} classes",
            self.feature_count, self.class_count
        )
    }
}

pub struct InstanceHeader {
    relation_name: String,
    pub attributes: Vec<AttributeRef>,
    class_index: usize,
}

impl InstanceHeader {
    pub fn new(
        relation_name: String,
        attributes: Vec<AttributeRef>,
        class_index: usize,
    ) -> InstanceHeader {
        InstanceHeader {
            relation_name,
            attributes,
            class_index,
        }
    }

    pub fn number_of_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    pub fn attribute_at_index(&self, index: usize) -> Option<&dyn Attribute> {
        self.attributes.get(index).map(|a| a.as_ref() as &dyn Attribute)
    }

    pub fn index_of_attribute(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name() == name)
    }

    pub fn class_index(&self) -> usize {
        self.class_index
    }

    /// Domain size of the class attribute, or 0 when the class is not nominal.
    pub fn number_of_classes(&self) -> usize {
        self.attribute_at_index(self.class_index)
            .and_then(|a| a.domain_size())
            .unwrap_or(0)
    }

    pub fn schema(&self) -> Schema {
        Schema {
            feature_count: self.number_of_attributes(),
            class_count: self.number_of_classes(),
        }
    }
}

impl fmt::Debug for InstanceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHeader")
            .field("relation_name", &self.relation_name)
            .field("class_index", &self.class_index)
            .field("n_attributes", &self.attributes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::{NominalAttribute, NumericAttribute};
    use std::sync::Arc;

    fn header() -> InstanceHeader {
        InstanceHeader::new(
            "weather".into(),
            vec![
                Arc::new(NumericAttribute::new("temperature".into())) as AttributeRef,
                Arc::new(NominalAttribute::with_values(
                    "play".into(),
                    vec!["yes".into(), "no".into()],
                )) as AttributeRef,
            ],
            1,
        )
    }

    #[test]
    fn schema_counts_class_slot_as_feature() {
        let h = header();
        assert_eq!(
            h.schema(),
            Schema {
                feature_count: 2,
                class_count: 2
            }
        );
    }

    #[test]
    fn numeric_class_has_no_classes() {
        let h = InstanceHeader::new(
            "r".into(),
            vec![Arc::new(NumericAttribute::new("y".into())) as AttributeRef],
            0,
        );
        assert_eq!(h.number_of_classes(), 0);
    }

    #[test]
    fn lookup_by_name() {
        let h = header();
        assert_eq!(h.index_of_attribute("play"), Some(1));
        assert_eq!(h.index_of_attribute("wind"), None);
        assert!(h.attribute_at_index(2).is_none());
    }
}
