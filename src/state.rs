use std::sync::Arc;

use crate::service::{AttendanceService, EmployeeService};
use crate::store::{AttendanceStore, EmployeeStore, MemoryStore, MySqlStore};

/// Services shared by every worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub employees: EmployeeService,
    pub attendance: AttendanceService,
}

impl AppState {
    pub fn new(employees: Arc<dyn EmployeeStore>, attendance: Arc<dyn AttendanceStore>) -> Self {
        Self {
            employees: EmployeeService::new(employees.clone()),
            attendance: AttendanceService::new(attendance, employees),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store)
    }

    pub fn mysql(store: MySqlStore) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store)
    }
}
