// SmartMarks state managers
// Managers handle stateful operations: the record store, the change feed, the
// reconciled bookmark list and the sync session that ties them together.

pub mod bookmark_manager;
pub mod change_hub;
pub mod reconciliation;
pub mod session_manager;
