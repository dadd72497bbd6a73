use super::{
    cleaner, queries, CoreReferences, Diagnostics, DisposalShape, Error, Settings, TypeProcessor,
    Violation,
};
use crate::il::graph::{MethodId, TypeGraph, TypeId};
use crate::il::model::{Module, Type};
use crate::il::Name;
use log::{debug, info};
use std::collections::HashSet;

/// Outcome of weaving a module, type by type
pub struct WeaveReport<'g> {
    /// Types that were rewritten, with the shape chosen for each
    pub woven: Vec<(TypeId<'g>, DisposalShape<'g>)>,

    /// Types carrying the weaver's members from an earlier run
    pub already_woven: Vec<TypeId<'g>>,

    /// Types with a disposal entry point that could not be woven (see the diagnostics)
    pub rejected: Vec<TypeId<'g>>,
}

impl<'g> WeaveReport<'g> {
    fn new() -> WeaveReport<'g> {
        WeaveReport {
            woven: vec![],
            already_woven: vec![],
            rejected: vec![],
        }
    }

    pub fn shape_of(&self, type_id: TypeId<'g>) -> Option<DisposalShape<'g>> {
        self.woven
            .iter()
            .find(|(woven, _)| *woven == type_id)
            .map(|(_, shape)| *shape)
    }
}

/// Weaves every eligible type of a module
pub struct ModuleWeaver<'g> {
    graph: &'g TypeGraph<'g>,
    settings: Settings,
}

impl<'g> ModuleWeaver<'g> {
    pub fn new(graph: &'g TypeGraph<'g>, settings: Settings) -> ModuleWeaver<'g> {
        ModuleWeaver { graph, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Weave the module in place
    ///
    /// Only failing to resolve the core references is returned as an error. Everything wrong
    /// with individual types ends up in `diagnostics`, and the caller should consider the session
    /// failed if any error was recorded there.
    pub fn execute(
        &self,
        module: &mut Module<'g>,
        diagnostics: &mut Diagnostics,
    ) -> Result<WeaveReport<'g>, Error> {
        let references = CoreReferences::resolve(self.graph)?;
        let skipped_namespaces = self.namespaces_to_skip(module);
        info!("Weaving {}", module.name);

        let mut report = WeaveReport::new();
        for idx in 0..module.types.len() {
            let type_def = &module.types[idx];
            if !self.is_eligible(module, type_def, &skipped_namespaces) {
                continue;
            }

            let entries = self.entry_methods(type_def);
            let entry = match entries.first() {
                Some(entry) => *entry,
                None => continue,
            };

            if self.is_already_woven(type_def.id) {
                diagnostics.info(format!(
                    "Type `{}` has already been woven. Skipping it.",
                    type_def.id.name
                ));
                report.already_woven.push(type_def.id);
                continue;
            }

            let violations = self.check_entry(type_def, &entries, &references);
            if !violations.is_empty() {
                for violation in violations {
                    diagnostics.violation(violation);
                }
                report.rejected.push(type_def.id);
                continue;
            }

            let type_def = &mut module.types[idx];
            let type_id = type_def.id;
            let mut processor = TypeProcessor::new(
                self.graph,
                &references,
                &self.settings,
                diagnostics,
                type_def,
                entry,
            );
            match processor.process()? {
                Some(shape) => report.woven.push((type_id, shape)),
                None => report.rejected.push(type_id),
            }
        }

        cleaner::clean_references(module, &self.settings, diagnostics);
        debug!(
            "Wove {} type(s), {} already woven, {} rejected",
            report.woven.len(),
            report.already_woven.len(),
            report.rejected.len()
        );
        Ok(report)
    }

    /// Namespaces named by assembly markers, plus the ones from the settings
    fn namespaces_to_skip(&self, module: &Module<'g>) -> HashSet<String> {
        module
            .markers
            .iter()
            .filter(|marker| marker.is(&self.settings.skip_namespace_marker))
            .filter_map(|marker| marker.string_argument())
            .map(String::from)
            .chain(self.settings.skipped_namespaces.iter().cloned())
            .collect()
    }

    fn is_eligible(
        &self,
        module: &Module<'g>,
        type_def: &Type<'g>,
        skipped_namespaces: &HashSet<String>,
    ) -> bool {
        let id = type_def.id;
        queries::is_class(id)
            && (self.settings.weave_abstract_types || !id.is_abstract())
            && !queries::is_generated_code(module, type_def)
            && !queries::contains_skip_weaving(&type_def.markers, &self.settings)
            && !skipped_namespaces.contains(id.name.namespace())
    }

    /// Instance methods named like the disposal entry point, in declaration order
    fn entry_methods(&self, type_def: &Type<'g>) -> Vec<MethodId<'g>> {
        type_def
            .methods
            .iter()
            .map(|method| method.id)
            .filter(|id| !id.is_static() && self.settings.entry_method_names.contains(&id.name))
            .collect()
    }

    /// The type declares every member the weaver would add
    fn is_already_woven(&self, type_id: TypeId<'g>) -> bool {
        queries::field_exists(type_id, self.settings.signaled_field_name.as_str())
            && queries::field_exists(type_id, self.settings.disposed_field_name.as_str())
            && queries::method_exists(type_id, self.settings.guard_method_name.as_str())
    }

    /// Problems with the entry point or base type that rule out weaving
    fn check_entry(
        &self,
        type_def: &Type<'g>,
        entries: &[MethodId<'g>],
        references: &CoreReferences<'g>,
    ) -> Vec<Violation> {
        let type_name = type_def.id.name.to_string();
        let mut violations = vec![];

        if entries.len() > 1 {
            violations.push(Violation::MultipleEntryMethods {
                type_name: type_name.clone(),
            });
        }
        let body = entries
            .first()
            .and_then(|entry| type_def.method(*entry))
            .and_then(|method| method.body.as_ref());
        if !queries::is_empty_or_not_implemented(body) {
            violations.push(Violation::EntryMethodHasCode {
                type_name: type_name.clone(),
            });
        }
        if type_def.id.base != Some(references.object) {
            violations.push(Violation::UnsupportedBaseType { type_name });
        }
        violations
    }
}
