use super::Marker;
use crate::il::code::MethodBody;
use crate::il::graph::MethodId;

/// Semantic representation of a method
pub struct Method<'g> {
    /// The current method
    pub id: MethodId<'g>,

    /// Method body (abstract and runtime-provided methods have none)
    pub body: Option<MethodBody<'g>>,

    pub markers: Vec<Marker<'g>>,
}

impl<'g> Method<'g> {
    /// Create a new method without a body
    pub fn new(id: MethodId<'g>) -> Method<'g> {
        Method {
            id,
            body: None,
            markers: vec![],
        }
    }

    pub fn with_body(id: MethodId<'g>, body: MethodBody<'g>) -> Method<'g> {
        Method {
            id,
            body: Some(body),
            markers: vec![],
        }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}
