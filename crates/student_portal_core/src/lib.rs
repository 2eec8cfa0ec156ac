pub mod access;
pub mod domain;
pub mod ports;
pub mod validate;

pub use access::Capability;
pub use domain::{
    Analytics, AuthToken, Gender, NewStudent, Report, ReportFormat, Role, Session, SessionUser,
    Student, StudentAccount, StudentUpdate, User,
};
pub use ports::{BackendService, PortError, PortResult, SessionStorage};
