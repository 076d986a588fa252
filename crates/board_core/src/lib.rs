//! board_core - Core types shared by the job board client crates
//!
//! - `config` - API endpoint, proxy and retry configuration
//! - `paths` - Location of the per-user data directory
//! - `identity` - User identity, roles and the two client surfaces
//! - `jobs` - Job listings and client-side filtering
//! - `masking` - Token masking for log output

pub mod config;
pub mod identity;
pub mod jobs;
pub mod masking;
pub mod paths;

// Re-export commonly used types
pub use config::{Config, ConfigError, DEFAULT_API_URL};
pub use identity::{
    ProfileUpdate, Role, RoleRequirement, StorageKeys, Surface, UserAccount, UserIdentity,
};
pub use jobs::{
    Application, ApplicationStatus, Category, DashboardStats, EmploymentType, ExperienceLevel, Job,
    JobDraft, JobFilters, NewApplication, Salary, StatusUpdate,
};
pub use masking::mask_token;
