//! Host services handed to the engine while a unit executes.

use std::path::{Path, PathBuf};

use jsfx_config::Config;
use jsfx_core::{FileSpec, GfxTarget, MidiBuffer, MidiEventRef, RiffInfo, ScriptHost, VarAccess, VarSlot};

use crate::files::{FileTable, OpenFile};
use crate::graph::SourceGraph;
use crate::vars::VarTable;

/// Sliders touched by script code during the current cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SliderMasks {
    pub(crate) changed: u64,
    pub(crate) automate: u64,
}

impl SliderMasks {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Borrowed view of an effect's state, built fresh for each execution.
pub(crate) struct ScriptContext<'a, 'g> {
    pub(crate) vars: &'a VarTable,
    pub(crate) midi_in: &'a mut MidiBuffer,
    pub(crate) midi_out: &'a mut MidiBuffer,
    pub(crate) sliders: &'a mut SliderMasks,
    pub(crate) files: &'a FileTable,
    pub(crate) config: &'a Config,
    pub(crate) source: Option<&'a SourceGraph>,
    pub(crate) gfx: Option<&'a mut (dyn GfxTarget + 'g)>,
}

impl ScriptContext<'_, '_> {
    fn with_file<R>(&self, handle: u32, f: impl FnOnce(&mut OpenFile) -> R) -> Option<R> {
        let file = self.files.get(handle)?;
        let mut guard = file.lock();
        Some(f(&mut guard))
    }

    fn resolve_path(&self, spec: FileSpec<'_>) -> Option<PathBuf> {
        let name = match spec {
            FileSpec::Index(index) => self.source?.main.header.filenames.get(index as usize)?.as_str(),
            FileSpec::Path(path) => path,
        };
        let path = Path::new(name);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }

        let relative = name.trim_start_matches('/');
        let from_data = self.config.data_root().map(|root| root.join(relative));
        let from_main = self
            .source
            .and_then(|graph| graph.main.path.parent())
            .map(|dir| dir.join(relative));
        from_data.into_iter().chain(from_main).find(|candidate| candidate.exists())
    }
}

impl ScriptHost for ScriptContext<'_, '_> {
    fn midi_send(&mut self, vars: &mut dyn VarAccess, offset: u32, data: &[u8]) -> bool {
        let bus = if vars.get(self.vars.ext_midi_bus) != 0.0 {
            vars.get(self.vars.midi_bus).max(0.0) as u32
        } else {
            0
        };
        self.midi_out.push(&MidiEventRef { bus, offset, data })
    }

    fn midi_recv(&mut self, vars: &mut dyn VarAccess) -> Option<MidiEventRef<'_>> {
        if vars.get(self.vars.ext_midi_bus) != 0.0 {
            let event = self.midi_in.get_next()?;
            vars.set(self.vars.midi_bus, f64::from(event.bus));
            Some(event)
        } else {
            self.midi_in.get_next_from_bus(0)
        }
    }

    fn slider_change(&mut self, mask: u64) {
        self.sliders.changed |= mask;
    }

    fn slider_automate(&mut self, mask: u64) {
        self.sliders.automate |= mask;
    }

    fn slider_of_var(&self, slot: VarSlot) -> Option<u32> {
        self.vars.slider_of_var(slot)
    }

    fn file_open(&mut self, spec: FileSpec<'_>) -> Option<u32> {
        let path = self.resolve_path(spec)?;
        self.files.open(self.config, &path)
    }

    fn file_close(&mut self, handle: u32) -> bool {
        self.files.close(handle)
    }

    fn file_rewind(&mut self, handle: u32) -> bool {
        self.with_file(handle, OpenFile::rewind).unwrap_or(false)
    }

    fn file_avail(&mut self, handle: u32) -> i64 {
        self.with_file(handle, |file| file.avail()).unwrap_or(0)
    }

    fn file_var(&mut self, handle: u32, value: &mut f64) -> bool {
        self.with_file(handle, |file| file.var(value)).unwrap_or(false)
    }

    fn file_mem(&mut self, handle: u32, buf: &mut [f64]) -> u32 {
        self.with_file(handle, |file| file.mem(buf)).unwrap_or(0)
    }

    fn file_string(&mut self, handle: u32, text: &mut String) -> bool {
        self.with_file(handle, |file| file.string(text)).unwrap_or(false)
    }

    fn file_riff(&mut self, handle: u32) -> Option<RiffInfo> {
        self.with_file(handle, |file| file.riff()).flatten()
    }

    fn file_text(&mut self, handle: u32) -> bool {
        self.with_file(handle, |file| file.is_text()).unwrap_or(false)
    }

    fn gfx(&mut self) -> Option<&mut dyn GfxTarget> {
        let target: &mut dyn GfxTarget = self.gfx.as_deref_mut()?;
        Some(target)
    }
}
