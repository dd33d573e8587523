//! Data models for platform entities

mod appointment;
mod consultation;
mod dashboard;
mod lawyer;
mod payment;
mod user;
mod validation;

pub use appointment::*;
pub use consultation::*;
pub use dashboard::*;
pub use lawyer::*;
pub use payment::*;
pub use user::*;
pub use validation::*;
