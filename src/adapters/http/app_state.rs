use std::sync::Arc;

use crate::{
    infra::config::AppConfig, use_cases::reconciliation::ReconciliationUseCases,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reconciliation: Arc<ReconciliationUseCases>,
}
