use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::{FormId, GenerationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyState {
    pub busy: bool,
    pub label: String,
}

#[derive(Debug, Clone)]
struct ToggleLabels {
    resting: String,
    busy: String,
    engaged: bool,
}

/// Submission-control state for every form, keyed by form identity.
#[derive(Debug, Clone, Default)]
pub struct BusyStateBoard {
    toggles: Arc<Mutex<HashMap<FormId, ToggleLabels>>>,
}

impl BusyStateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        form: &FormId,
        resting_label: impl Into<String>,
        busy_label: impl Into<String>,
    ) {
        let mut toggles = self.toggles.lock().expect("busy state lock poisoned");
        toggles.insert(
            form.clone(),
            ToggleLabels {
                resting: resting_label.into(),
                busy: busy_label.into(),
                engaged: false,
            },
        );
    }

    pub fn state(&self, form: &FormId) -> Option<BusyState> {
        let toggles = self.toggles.lock().expect("busy state lock poisoned");
        toggles.get(form).map(|toggle| BusyState {
            busy: toggle.engaged,
            label: if toggle.engaged {
                toggle.busy.clone()
            } else {
                toggle.resting.clone()
            },
        })
    }

    pub fn is_busy(&self, form: &FormId) -> bool {
        let toggles = self.toggles.lock().expect("busy state lock poisoned");
        toggles.get(form).is_some_and(|toggle| toggle.engaged)
    }

    /// Disables the form's submission control until the returned guard is released.
    pub fn engage(&self, form: &FormId) -> Result<BusyGuard, GenerationError> {
        let mut toggles = self.toggles.lock().expect("busy state lock poisoned");
        let toggle = toggles.get_mut(form).ok_or_else(|| {
            GenerationError::internal(format!("form '{form}' has no registered submit control"))
        })?;
        if toggle.engaged {
            return Err(GenerationError::SubmissionBusy);
        }
        toggle.engaged = true;
        debug!(form = %form, label = %toggle.busy, "submit control disabled");

        Ok(BusyGuard {
            board: self.clone(),
            form: form.clone(),
            released: false,
        })
    }

    fn restore(&self, form: &FormId) {
        let mut toggles = self.toggles.lock().expect("busy state lock poisoned");
        if let Some(toggle) = toggles.get_mut(form) {
            toggle.engaged = false;
            debug!(form = %form, label = %toggle.resting, "submit control re-enabled");
        }
    }
}

/// Restores the resting label when released or dropped, on every exit path.
#[derive(Debug)]
pub struct BusyGuard {
    board: BusyStateBoard,
    form: FormId,
    released: bool,
}

impl BusyGuard {
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.board.restore(&self.form);
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
