//! Engine runtime for a tool that never executes script code.
//!
//! Loading a source graph needs a [`Config`](jsfx_config::Config), and a
//! config needs a runtime. This one hands out engines that keep host
//! variables but refuse to compile.

use jsfx_core::{CodeHandle, EngineRuntime, ExprEngine, ScriptHost, VarAccess, VarResolver, VarSlot};

/// Runtime whose engines cannot compile.
#[derive(Debug, Default)]
pub struct InspectRuntime;

impl EngineRuntime for InspectRuntime {
    fn new_engine(&self) -> Box<dyn ExprEngine> {
        Box::new(InspectEngine::default())
    }
}

#[derive(Debug, Default)]
struct InspectEngine {
    names: Vec<String>,
    values: Vec<f64>,
}

impl VarAccess for InspectEngine {
    fn get(&self, slot: VarSlot) -> f64 {
        self.values.get(slot.0 as usize).copied().unwrap_or(0.0)
    }

    fn set(&mut self, slot: VarSlot, value: f64) {
        if let Some(v) = self.values.get_mut(slot.0 as usize) {
            *v = value;
        }
    }
}

impl ExprEngine for InspectEngine {
    fn register_var(&mut self, name: &str) -> VarSlot {
        if let Some(i) = self.names.iter().position(|n| n == name) {
            return VarSlot(i as u32);
        }
        self.names.push(name.to_owned());
        self.values.push(0.0);
        VarSlot((self.names.len() - 1) as u32)
    }

    fn compile(&mut self, _text: &str, _line_offset: u32, _resolver: &dyn VarResolver) -> Result<CodeHandle, String> {
        Err("no expression engine is available in the inspector".into())
    }

    fn execute(&mut self, _code: CodeHandle, _host: &mut dyn ScriptHost) {}

    fn release_code(&mut self) {}

    fn for_each_var(&self, visit: &mut dyn FnMut(&str, VarSlot) -> bool) {
        for (i, name) in self.names.iter().enumerate() {
            if !visit(name, VarSlot(i as u32)) {
                break;
            }
        }
    }

    fn read_memory(&self, _addr: u32, dest: &mut [f64]) {
        dest.fill(0.0);
    }
}
