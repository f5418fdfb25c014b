//! Loading a main file and its imports into a [`SourceGraph`].
//!
//! Imports are resolved depth-first with an explicit stack of frames. A
//! frame is finalized when all of its own imports have been visited, so
//! units land in [`SourceGraph::imports`] dependency-first. Files already
//! visited, compared by filesystem identity rather than by path, are
//! skipped.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use jsfx_config::Config;
use jsfx_core::{Header, LogLevel, MAX_IMPORT_DEPTH, MAX_SLIDERS, SectionKind, Toplevel, parse_header, parse_toplevel};

use crate::error::LoadError;
use crate::files::detect_file_type;

/// Options for [`SourceGraph::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Drop the main file's `import` lines.
    pub ignore_imports: bool,
}

/// Filesystem identity of an open file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileUid {
    /// Device and inode.
    Inode(u64, u64),
    /// Canonical path, where inodes are unavailable.
    Path(PathBuf),
}

impl FileUid {
    #[cfg(unix)]
    fn of(file: &File, _path: &Path) -> std::io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        let meta = file.metadata()?;
        Ok(FileUid::Inode(meta.dev(), meta.ino()))
    }

    #[cfg(not(unix))]
    fn of(_file: &File, path: &Path) -> std::io::Result<Self> {
        Ok(FileUid::Path(path.canonicalize()?))
    }
}

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Where the file was read from.
    pub path: PathBuf,
    /// Its sections.
    pub toplevel: Toplevel,
    /// Its header model.
    pub header: Header,
}

impl SourceUnit {
    fn open(path: &Path) -> Result<(Self, FileUid), LoadError> {
        let mut file = File::open(path).map_err(|e| LoadError::open(path, e))?;
        let uid = FileUid::of(&file, path).map_err(|e| LoadError::open(path, e))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| LoadError::open(path, e))?;

        let text = String::from_utf8_lossy(&bytes);
        let toplevel = parse_toplevel(&text).map_err(|source| LoadError::Parse {
            file: path.to_path_buf(),
            source,
        })?;
        let header = parse_header(&toplevel.header);
        let unit = SourceUnit {
            path: path.to_path_buf(),
            toplevel,
            header,
        };
        Ok((unit, uid))
    }
}

/// A loaded main file together with its resolved imports.
#[derive(Debug, Clone)]
pub struct SourceGraph {
    /// The main file.
    pub main: SourceUnit,
    /// Imports in dependency-first order, each file once.
    pub imports: Vec<SourceUnit>,
    /// Script names aliased to slider indices.
    pub slider_alias: HashMap<String, u32>,
}

struct Frame {
    unit: SourceUnit,
    next: usize,
    child_level: u32,
}

impl SourceGraph {
    /// Load `path` and everything it imports.
    ///
    /// Enumeration sliders are normalized here: path enumerations are
    /// filled from the data root and every enumeration ends up with the
    /// range `0..=count-1` step 1. Each correction is reported as a
    /// warning through `config`.
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`] met. Nothing is reported here; the
    /// caller decides how to surface it.
    pub fn load(path: &Path, config: &Config, options: LoadOptions) -> Result<Self, LoadError> {
        let (mut main, main_uid) = SourceUnit::open(path)?;
        if main.header.desc.is_empty() {
            return Err(LoadError::MissingDescription {
                file: path.to_path_buf(),
            });
        }
        if options.ignore_imports {
            main.header.imports.clear();
        }

        let slider_alias = main
            .header
            .declared_sliders()
            .filter(|s| !s.var.is_empty())
            .map(|s| (s.var.clone(), s.id))
            .collect();

        fill_file_enums(&mut main.header, config);
        fix_invalid_enums(&mut main.header, config);

        let mut seen = HashSet::from([main_uid]);
        let mut imports = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut main_next = 0;

        loop {
            let (unit, next, level) = match stack.last_mut() {
                Some(top) => (&top.unit, &mut top.next, top.child_level),
                None => (&main, &mut main_next, 0),
            };
            let Some(name) = unit.header.imports.get(*next).cloned() else {
                match stack.pop() {
                    Some(done) => {
                        imports.push(done.unit);
                        continue;
                    }
                    None => break,
                }
            };
            *next += 1;

            let origin = unit.path.clone();
            if level >= MAX_IMPORT_DEPTH {
                return Err(LoadError::TooManyImportLevels { origin });
            }

            let Some(resolved) = resolve_import(config, &name, &origin) else {
                return Err(LoadError::ImportNotFound { origin, name });
            };
            let (unit, uid) = SourceUnit::open(&resolved)?;
            if !seen.insert(uid) {
                tracing::debug!("import {name} already visited, skipping");
                continue;
            }
            tracing::debug!("import {name} resolved to {} at level {level}", resolved.display());
            stack.push(Frame {
                unit,
                next: 0,
                child_level: level + 1,
            });
        }

        Ok(SourceGraph {
            main,
            imports,
            slider_alias,
        })
    }

    /// All units: imports in resolved order, then the main file.
    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.imports.iter().chain(std::iter::once(&self.main))
    }

    /// First unit defining `kind`, searching the main file before imports.
    pub fn find_section(&self, kind: SectionKind) -> Option<&SourceUnit> {
        std::iter::once(&self.main)
            .chain(self.imports.iter())
            .find(|unit| unit.toplevel.section(kind).is_some())
    }
}

/// Resolve an import name against its origin's directory, then the import
/// root.
pub fn resolve_import(config: &Config, name: &str, origin: &Path) -> Option<PathBuf> {
    let local = origin.parent().map(|dir| dir.join(name));
    let rooted = config.import_root().map(|root| root.join(name));
    local.into_iter().chain(rooted).find(|candidate| candidate.exists())
}

fn fill_file_enums(header: &mut Header, config: &Config) {
    let Some(data_root) = config.data_root() else {
        return;
    };

    for slider in header.sliders.iter_mut().take(MAX_SLIDERS) {
        if slider.path.is_empty() {
            continue;
        }
        let dir = data_root.join(slider.path.trim_start_matches('/'));
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| detect_file_type(config, &entry.path()).is_some())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        if names.is_empty() {
            continue;
        }
        names.sort();
        slider.max = (names.len() - 1) as f64;
        slider.enum_names.extend(names);
    }
}

fn fix_invalid_enums(header: &mut Header, config: &Config) {
    for slider in header.sliders.iter_mut().filter(|s| s.is_enum) {
        let count = slider.enum_names.len();
        if count == 0 {
            let what = if slider.path.is_empty() { "items" } else { "files" };
            config.log(
                LogLevel::Warning,
                &format!("slider{}: the enumeration does not contain any {what}", slider.id + 1),
            );
            slider.enum_names.push(String::new());
            slider.min = 0.0;
            slider.max = 0.0;
            slider.inc = 1.0;
        } else if slider.min != 0.0 || slider.inc != 1.0 || slider.max != (count - 1) as f64 {
            config.log(
                LogLevel::Warning,
                &format!("slider{}: the enumeration has an invalid range", slider.id + 1),
            );
            slider.min = 0.0;
            slider.max = (count - 1) as f64;
            slider.inc = 1.0;
        }
    }
}
