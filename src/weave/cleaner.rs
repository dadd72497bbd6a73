use super::{Diagnostics, Settings};
use crate::il::model::{Marker, Module};

/// Strip the opt-out markers and drop the reference to the assembly declaring them
///
/// The markers only mean something to the weaver, so the woven module carries no trace of them.
pub fn clean_references(module: &mut Module<'_>, settings: &Settings, diagnostics: &mut Diagnostics) {
    module
        .markers
        .retain(|marker| !marker.is(&settings.skip_namespace_marker));
    for type_def in &mut module.types {
        remove_skip_weaving(&mut type_def.markers, settings);
        for field in &mut type_def.fields {
            remove_skip_weaving(&mut field.markers, settings);
        }
    }

    let position = module
        .assembly_references
        .iter()
        .position(|reference| reference.name == settings.marker_assembly_name);
    match position {
        Some(idx) => {
            module.assembly_references.remove(idx);
            diagnostics.info(format!(
                "\tRemoving reference to '{}'.",
                settings.marker_assembly_name
            ));
        }
        None => diagnostics.info(format!(
            "\tNo reference to '{}' found. References not modified.",
            settings.marker_assembly_name
        )),
    }
}

fn remove_skip_weaving(markers: &mut Vec<Marker<'_>>, settings: &Settings) {
    markers.retain(|marker| !marker.is(&settings.skip_weaving_marker));
}

#[cfg(test)]
mod test {
    use super::clean_references;
    use crate::il::graph::{TypeData, TypeGraph, TypeGraphArenas};
    use crate::il::model::{AssemblyReference, Constant, Marker, Module, Type};
    use crate::il::{QualifiedName, TypeFlags};
    use crate::weave::{Diagnostics, Settings, Severity};

    #[test]
    fn markers_and_reference_are_removed() {
        let arenas = TypeGraphArenas::new();
        let graph = TypeGraph::new(&arenas);
        let platform = graph.insert_platform_types();
        let settings = Settings::new().unwrap();

        let skip = graph.add_type(TypeData::new(
            settings.skip_weaving_marker.clone(),
            platform.types.attribute,
            TypeFlags::PUBLIC,
        ));
        let skip_namespace = graph.add_type(TypeData::new(
            settings.skip_namespace_marker.clone(),
            platform.types.attribute,
            TypeFlags::PUBLIC,
        ));
        let class = graph.add_type(TypeData::new(
            QualifiedName::name("Sample"),
            platform.types.object,
            TypeFlags::PUBLIC,
        ));

        let mut module = Module::new("Sample.dll");
        module
            .assembly_references
            .push(AssemblyReference::new("Janitor", "1.0.0.0"));
        module.markers.push(
            Marker::new(skip_namespace).with_argument(Constant::String(String::from("Legacy"))),
        );
        module.add_type(
            Type::new(class)
                .with_marker(Marker::new(skip))
                .with_marker(Marker::new(platform.types.generated_code)),
        );

        let mut diagnostics = Diagnostics::new();
        clean_references(&mut module, &settings, &mut diagnostics);
        assert!(module.markers.is_empty());
        assert!(module.assembly_references.is_empty());
        assert_eq!(module.types[0].markers.len(), 1);
        assert_eq!(
            diagnostics.messages(Severity::Info),
            vec!["\tRemoving reference to 'Janitor'."]
        );

        let mut diagnostics = Diagnostics::new();
        clean_references(&mut module, &settings, &mut diagnostics);
        assert_eq!(
            diagnostics.messages(Severity::Info),
            vec!["\tNo reference to 'Janitor' found. References not modified."]
        );
    }
}
