//! Display what an effect declares and where its code comes from.

use std::path::PathBuf;

use clap::Args;
use jsfx_core::{SectionKind, Slider};
use jsfx_host::{LoadOptions, SourceGraph, SourceUnit};

use super::{inspect_config, load_settings};

/// Display effect information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the main effect file
    pub file: PathBuf,

    /// Do not follow the main file's imports
    #[arg(long)]
    pub ignore_imports: bool,

    /// Directory imports are resolved against
    #[arg(long, value_name = "DIR")]
    pub import_root: Option<PathBuf>,

    /// Directory data files and path sliders are resolved against
    #[arg(long, value_name = "DIR")]
    pub data_root: Option<PathBuf>,

    /// Settings file to read instead of the user default
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.settings.as_deref())?;
    let config = inspect_config(&settings, &args.file, args.import_root, args.data_root);
    let options = LoadOptions {
        ignore_imports: args.ignore_imports,
    };
    let graph = SourceGraph::load(&args.file, &config, options)?;
    let header = &graph.main.header;

    println!("File:        {}", args.file.display());
    println!("Name:        {}", header.desc);
    if !header.author.is_empty() {
        println!("Author:      {}", header.author);
    }
    if !header.tags.is_empty() {
        println!("Tags:        {}", header.tags.join(", "));
    }
    println!("Import root: {}", display_root(config.import_root()));
    println!("Data root:   {}", display_root(config.data_root()));
    println!("Inputs:      {}", pin_list(&header.in_pins));
    println!("Outputs:     {}", pin_list(&header.out_pins));

    println!();
    println!("Sections:");
    for kind in SectionKind::ALL {
        let providers = section_providers(&graph, kind);
        if providers.is_empty() {
            continue;
        }
        let mut line = format!("  {:12}{}", kind.tag(), providers.join(", "));
        if kind == SectionKind::Gfx
            && let Some(unit) = graph.find_section(kind)
            && (unit.toplevel.gfx_w, unit.toplevel.gfx_h) != (0, 0)
        {
            line.push_str(&format!(" ({}x{})", unit.toplevel.gfx_w, unit.toplevel.gfx_h));
        }
        println!("{line}");
    }

    let sliders: Vec<&Slider> = header.declared_sliders().collect();
    if !sliders.is_empty() {
        println!();
        println!("Sliders:");
        for slider in sliders {
            println!(
                "  {:10}{:12}{:32}{}",
                format!("slider{}", slider.id + 1),
                slider.var,
                slider_range(slider),
                slider.desc
            );
        }
    }

    if !graph.imports.is_empty() {
        println!();
        println!("Imports (resolved order):");
        for (i, unit) in graph.imports.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, unit.path.display());
        }
    }

    if !header.filenames.is_empty() {
        println!();
        println!("Filenames:");
        for (i, name) in header.filenames.iter().enumerate() {
            println!("  {i:>3}: {name}");
        }
    }

    Ok(())
}

fn display_root(root: Option<&std::path::Path>) -> String {
    root.map_or_else(|| "(none)".to_owned(), |r| r.display().to_string())
}

fn pin_list(pins: &[String]) -> String {
    if pins.is_empty() {
        "none".to_owned()
    } else {
        format!("{} ({})", pins.len(), pins.join(", "))
    }
}

fn unit_name(unit: &SourceUnit) -> String {
    unit.path
        .file_name()
        .map_or_else(|| unit.path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// `@init` runs from every unit; any other section from the first unit
/// defining it.
fn section_providers(graph: &SourceGraph, kind: SectionKind) -> Vec<String> {
    if kind == SectionKind::Init {
        graph
            .units()
            .filter(|unit| unit.toplevel.section(kind).is_some())
            .map(unit_name)
            .collect()
    } else {
        graph.find_section(kind).map(unit_name).into_iter().collect()
    }
}

fn slider_range(slider: &Slider) -> String {
    if slider.is_path() {
        format!("{} = {} [{}]", slider.path, slider.def, slider.enum_names.join(" | "))
    } else if slider.is_enum {
        format!("{} [{}]", slider.def, slider.enum_names.join(" | "))
    } else if slider.inc != 0.0 {
        format!("{} [{}, {}, step {}]", slider.def, slider.min, slider.max, slider.inc)
    } else {
        format!("{} [{}, {}]", slider.def, slider.min, slider.max)
    }
}
