use std::any::Any;
use std::sync::Arc;

pub type AttributeRef = Arc<dyn Attribute + Send + Sync>;

pub trait Attribute: Any + Send + Sync {
    fn name(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn arff_representation(&self) -> String;

    /// Size of the value domain for nominal attributes, `None` for numeric ones.
    fn domain_size(&self) -> Option<usize> {
        None
    }

    fn is_nominal(&self) -> bool {
        self.domain_size().is_some()
    }
}
