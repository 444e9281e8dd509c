use std::fmt;
use std::path::Path;

use libloading::{Library, Symbol};

use common::{GateController, SimulationConfig, SimulationRecorder};

/// Exported control-cycle entry point of the compiled module.
type StepFn = unsafe extern "C" fn(bool, bool, bool) -> i32;

/// Optional exported reset hook.
type ResetFn = unsafe extern "C" fn();

const STEP_SYMBOL: &[u8] = b"process_controller";
const RESET_SYMBOL: &[u8] = b"reset_controller";

/// Failure to attach the compiled controller module. These are all
/// fatal before the loop starts; once a module is loaded, stepping it
/// cannot fail.
#[derive(Debug)]
pub enum ModuleError {
    /// No file at the configured path. Build the module first.
    NotFound(String),
    /// The dynamic loader rejected the file.
    Load(libloading::Error),
    /// The library loaded but does not export `process_controller`.
    MissingSymbol(libloading::Error),
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleError::NotFound(path) => {
                write!(f, "controller module '{}' does not exist", path)
            }
            ModuleError::Load(e) => write!(f, "failed to load controller module: {}", e),
            ModuleError::MissingSymbol(e) => {
                write!(f, "controller module does not export the step entry point: {}", e)
            }
        }
    }
}

impl std::error::Error for ModuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModuleError::NotFound(_) => None,
            ModuleError::Load(e) | ModuleError::MissingSymbol(e) => Some(e),
        }
    }
}

/// Adapter over a natively compiled controller reached through the
/// C ABI.
///
/// The module keeps the state machine on its side of the boundary;
/// this type is a stateless pass-through that marshals the three
/// inputs and the returned command.
pub struct CompiledController {
    step_fn: StepFn,
    reset_fn: Option<ResetFn>,
    // The function pointers stay valid only while the module is mapped
    _library: Library,
}

impl CompiledController {
    /// Loads the module and resolves its entry points. Both the load
    /// and the symbol lookup happen here, before any run starts.
    pub fn load(path: &str) -> Result<Self, ModuleError> {
        if !Path::new(path).exists() {
            return Err(ModuleError::NotFound(path.to_string()));
        }

        let library = unsafe { Library::new(path) }.map_err(ModuleError::Load)?;
        let step_fn = unsafe {
            let symbol: Symbol<StepFn> =
                library.get(STEP_SYMBOL).map_err(ModuleError::MissingSymbol)?;
            *symbol
        };
        let reset_fn = unsafe {
            library
                .get::<ResetFn>(RESET_SYMBOL)
                .ok()
                .map(|symbol| *symbol)
        };

        Ok(Self {
            step_fn,
            reset_fn,
            _library: library,
        })
    }

    /// Asks the module to return to its power-on state, when it
    /// exports that hook. Modules without it are simply reloaded
    /// between runs instead.
    pub fn reset(&mut self) -> bool {
        match self.reset_fn {
            Some(reset) => {
                unsafe { reset() };
                true
            }
            None => false,
        }
    }
}

impl GateController for CompiledController {
    fn step(&mut self, pulse: bool, limit_open: bool, limit_closed: bool) -> i32 {
        unsafe { (self.step_fn)(pulse, limit_open, limit_closed) }
    }
}

/// Runs the full simulation against the compiled controller module
/// configured under `[ffi]`.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationRecorder, ModuleError> {
    let mut controller = CompiledController::load(&config.ffi.library)?;
    Ok(common::run_simulation(config, &mut controller))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_module_is_a_pre_run_error() {
        let result = CompiledController::load("/nonexistent/libgate_controller.so");
        match result {
            Err(ModuleError::NotFound(path)) => {
                assert!(path.contains("libgate_controller"));
            }
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn non_library_file_is_rejected_by_the_loader() {
        let path = std::env::temp_dir().join("gate_validation_not_a_library.so");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not an object file").unwrap();
        drop(file);

        let result = CompiledController::load(path.to_str().unwrap());
        assert!(matches!(result, Err(ModuleError::Load(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn errors_render_the_offending_path() {
        let error = ModuleError::NotFound("./libgate_controller.so".to_string());
        let rendered = error.to_string();
        assert!(rendered.contains("./libgate_controller.so"));
        assert!(rendered.contains("does not exist"));
    }
}
