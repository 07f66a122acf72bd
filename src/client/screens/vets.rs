use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::NoticeBoard;
use crate::client::collaborators::VetDirectory;
use crate::error::Result;
use crate::records::{search_clinics, VetClinic};

#[derive(Default)]
struct VetsState {
    district: Option<String>,
    clinics: Vec<VetClinic>,
    emergency_only: bool,
}

/// Clinic directory, loaded per district and searched locally.
pub struct VetsScreen {
    directory: Arc<dyn VetDirectory>,
    state: Mutex<VetsState>,
    notices: NoticeBoard,
}

impl VetsScreen {
    pub fn new(directory: Arc<dyn VetDirectory>) -> Self {
        Self {
            directory,
            state: Mutex::default(),
            notices: NoticeBoard::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, VetsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notice(&self) -> Option<String> {
        self.notices.last()
    }

    pub fn district(&self) -> Option<String> {
        self.state().district.clone()
    }

    pub fn clinics(&self) -> Vec<VetClinic> {
        self.state().clinics.clone()
    }

    /// `None` loads the whole directory.
    pub async fn load(&self, district: Option<&str>) -> Result<()> {
        let result = match district {
            Some(district) => self.directory.list_by_district(district).await,
            None => self.directory.list_all().await,
        };
        let clinics = self.notices.settle("load vet clinics", result)?;

        let mut state = self.state();
        state.district = district.map(str::to_string);
        state.clinics = clinics;
        Ok(())
    }

    pub fn set_emergency_only(&self, emergency_only: bool) {
        self.state().emergency_only = emergency_only;
    }

    pub fn search(&self, query: &str) -> Vec<VetClinic> {
        let state = self.state();
        search_clinics(&state.clinics, query, state.emergency_only)
            .into_iter()
            .cloned()
            .collect()
    }
}
