use crate::il::graph::TypeId;
use crate::il::QualifiedName;

/// Custom attribute attached to a module, type, field, or method
#[derive(Clone, Debug)]
pub struct Marker<'g> {
    pub marker_type: TypeId<'g>,

    /// Constructor arguments
    pub arguments: Vec<Constant>,
}

impl<'g> Marker<'g> {
    pub fn new(marker_type: TypeId<'g>) -> Marker<'g> {
        Marker {
            marker_type,
            arguments: vec![],
        }
    }

    pub fn with_argument(mut self, argument: Constant) -> Marker<'g> {
        self.arguments.push(argument);
        self
    }

    pub fn is(&self, name: &QualifiedName) -> bool {
        &self.marker_type.name == name
    }

    /// First string constructor argument
    pub fn string_argument(&self) -> Option<&str> {
        self.arguments.iter().find_map(|argument| match argument {
            Constant::String(value) => Some(value.as_str()),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constant {
    String(String),
    Int32(i32),
    Boolean(bool),
}
