// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Module loading for `(use name)`.
//!
//! A module is the file `name.ell` in one of the directories on the module
//! path. Its forms are evaluated into the shared global namespace. Each
//! module is loaded at most once per process. A `use` from another thread
//! while the module is still loading waits for that load to finish.

use std::collections::HashMap;
use std::path::PathBuf;
use std::thread::{self, ThreadId};
use std::time::Duration;

use ell_parser::Symbol;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::interrupt::check_for_interrupt;
use crate::options::Options;
use crate::runtime::Runtime;

/// File extension of Ell source files.
pub const EXTENSION: &str = "ell";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadState {
    Loading(ThreadId),
    Loaded,
}

static STATES: Lazy<Mutex<HashMap<Symbol, LoadState>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static CHANGED: Lazy<Condvar> = Lazy::new(Condvar::new);

// Waiters wake this often to notice ^C.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Load module `name` unless it is already loaded.
pub fn load(name: &Symbol, options: &Options) -> Result<()> {
    let me = thread::current().id();
    {
        let mut states = STATES.lock();
        loop {
            match states.get(name) {
                None => break,
                Some(LoadState::Loaded) => return Ok(()),
                // A cycle back into a module this thread is loading.
                Some(LoadState::Loading(owner)) if *owner == me => return Ok(()),
                Some(LoadState::Loading(_)) => {
                    CHANGED.wait_for(&mut states, WAIT_SLICE);
                    check_for_interrupt()?;
                }
            }
        }
        states.insert(name.clone(), LoadState::Loading(me));
    }

    let result = find(name, &options.module_path)
        .ok_or_else(|| Error::io(format!("module not found: {}", name)))
        .and_then(|path| {
            tracing::debug!(module = %name, path = %path.display(), "loading module");
            Runtime::new(options.clone()).load_file(&path)
        });

    let mut states = STATES.lock();
    if result.is_ok() {
        states.insert(name.clone(), LoadState::Loaded);
    } else {
        states.remove(name);
    }
    CHANGED.notify_all();
    result.map(|_| ())
}

/// Locate `name.ell` on `path`.
pub fn find(name: &Symbol, path: &[PathBuf]) -> Option<PathBuf> {
    let file = format!("{}.{}", name.name(), EXTENSION);
    path.iter()
        .map(|dir| dir.join(&file))
        .find(|candidate| candidate.is_file())
}

/// Whether `name` has been loaded.
pub fn is_loaded(name: &Symbol) -> bool {
    STATES.lock().get(name) == Some(&LoadState::Loaded)
}
