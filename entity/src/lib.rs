//! sea-orm entities for the taskboard schema.
//!
//! Membership on a task is modelled twice: the `managers`/`employees` rows carry
//! who was invited, while the `task_managers`/`task_employees` link rows say who
//! is active. Authorization only ever looks at the link rows.

pub mod boards;
pub mod employees;
pub mod invitations;
pub mod managers;
pub mod owners;
pub mod password_reset_codes;
pub mod planning_description_files;
pub mod planning_files;
pub mod project_files;
pub mod task_employees;
pub mod task_managers;
pub mod task_planning_description_files;
pub mod task_planning_files;
pub mod task_project_files;
pub mod tasks;
pub mod users;

pub use invitations::{InvitationRole, InvitationStatus};
pub use tasks::{PlanningStatus, Priority, ProjectStatus};
