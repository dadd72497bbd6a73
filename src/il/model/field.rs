use super::Marker;
use crate::il::graph::FieldId;

/// Semantic representation of a field
pub struct Field<'g> {
    /// The current field
    pub id: FieldId<'g>,

    pub markers: Vec<Marker<'g>>,
}

impl<'g> Field<'g> {
    pub fn new(id: FieldId<'g>) -> Field<'g> {
        Field {
            id,
            markers: vec![],
        }
    }

    pub fn with_marker(mut self, marker: Marker<'g>) -> Field<'g> {
        self.markers.push(marker);
        self
    }
}
