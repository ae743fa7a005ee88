pub mod policy;
pub mod state;
pub mod supervisor;

pub use policy::RestartPolicy;
pub use state::{SessionPhase, SupervisorState};
pub use supervisor::{Credentials, RunReport, RunVerdict, SessionSupervisor};
