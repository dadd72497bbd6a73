use janitor::il::graph::{MethodRef, TypeGraph, TypeGraphArenas};
use janitor::il::verifier;
use janitor::samples::Samples;
use janitor::weave::{Diagnostics, ModuleWeaver, Settings, Severity};
use janitor::*;

use clap::{Arg, ArgAction, Command};
use std::process;

fn main() -> Result<(), weave::Error> {
    env_logger::init();

    let matches = Command::new("Janitor")
        .version(clap::crate_version!())
        .about("Weave a thread-safe disposal state machine into types with an empty `Dispose`")
        .arg(
            Arg::new("historical-private-guards")
                .long("historical-private-guards")
                .action(ArgAction::SetTrue)
                .help("Leave private methods unguarded, as older releases did"),
        )
        .arg(
            Arg::new("weave-abstract")
                .long("weave-abstract")
                .action(ArgAction::SetTrue)
                .help("Also weave abstract classes"),
        )
        .arg(
            Arg::new("skip-namespace")
                .long("skip-namespace")
                .value_name("NAMESPACE")
                .action(ArgAction::Append)
                .help("Skip every type in this namespace (may be repeated)"),
        )
        .arg(
            Arg::new("invalid")
                .long("invalid")
                .action(ArgAction::SetTrue)
                .help("Weave the sample module whose types all break a weaving rule"),
        )
        .arg(
            Arg::new("no-listing")
                .long("no-listing")
                .action(ArgAction::SetTrue)
                .help("Only print diagnostics, not the woven method bodies"),
        )
        .get_matches();

    let mut settings = Settings::new()?;
    settings.guard_private_methods = !matches.get_flag("historical-private-guards");
    settings.weave_abstract_types = matches.get_flag("weave-abstract");
    if let Some(namespaces) = matches.get_many::<String>("skip-namespace") {
        for namespace in namespaces {
            settings.skip_namespace(namespace.as_str())?;
        }
    }

    let arenas = TypeGraphArenas::new();
    let graph = TypeGraph::new(&arenas);
    let mut samples = Samples::build(&graph)?;
    let module = if matches.get_flag("invalid") {
        &mut samples.invalid_module
    } else {
        &mut samples.module
    };

    let weaver = ModuleWeaver::new(&graph, settings);
    let mut diagnostics = Diagnostics::new();
    let report = weaver.execute(module, &mut diagnostics)?;
    verifier::verify_module(module)?;

    if !matches.get_flag("no-listing") {
        for (type_id, shape) in &report.woven {
            println!("{} ({})", type_id.name, shape);
            let type_def = match module.type_def(*type_id) {
                Some(type_def) => type_def,
                None => continue,
            };
            for method in &type_def.methods {
                if let Some(body) = &method.body {
                    println!("  {}", MethodRef::direct(method.id));
                    for line in body.to_string().lines() {
                        println!("    {}", line);
                    }
                }
            }
            println!();
        }
    }

    for diagnostic in diagnostics.iter() {
        let label = match diagnostic.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        println!("{}: {}", label, diagnostic.message);
    }
    println!(
        "{} woven, {} already woven, {} rejected",
        report.woven.len(),
        report.already_woven.len(),
        report.rejected.len()
    );

    if diagnostics.has_errors() {
        log::error!("Weaving {} failed", module.name);
        process::exit(1);
    }
    Ok(())
}
